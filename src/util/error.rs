//! Error types

use core::fmt;

/// Result type
pub type Result<T> = core::result::Result<T, Error>;

/// `ValidationStatus` identifies the cause of a certification path rejection. The set of
/// causes is closed and each carries a stable numeric code available via [`ValidationStatus::code`]
/// so that integrations can assert on the cause of a failure rather than on failure alone.
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
pub enum ValidationStatus {
    /// KeyCertSignWithoutBasicConstraints occurs when a certificate asserts the keyCertSign
    /// key usage bit without a basicConstraints extension with the cA field set to true.
    KeyCertSignWithoutBasicConstraints,
    /// CaWithoutKeyCertSign occurs when a certificate features basicConstraints with cA set
    /// to true and a keyUsage extension that does not assert keyCertSign.
    CaWithoutKeyCertSign,
    /// CrlIssuerWithoutCrlSign occurs when a certificate that must be usable for CRL
    /// verification features a keyUsage extension that does not assert cRLSign.
    CrlIssuerWithoutCrlSign,
    /// UnprocessedCriticalExtension occurs when a certificate features a critical extension
    /// for which no parsed value is available.
    UnprocessedCriticalExtension,
    /// NotCaCertificate occurs when a certificate that must be a CA certificate lacks
    /// basicConstraints with the cA field set to true.
    NotCaCertificate,
    /// InvalidValidityPeriod occurs when a certificate in the path is not yet valid or has
    /// expired relative to the time of interest.
    InvalidValidityPeriod,
    /// PathTooShort occurs when a candidate path features fewer than two certificates, i.e.,
    /// lacks a trust anchor or an end entity certificate.
    PathTooShort,
    /// NameChainingFailure occurs when the issuer name of a certificate does not match the
    /// subject name of the certificate above it in the path.
    NameChainingFailure,
    /// RevocationDataNotFound occurs when revocation information was configured but no
    /// usable CRL or OCSP determination could be made for a certificate in the path.
    RevocationDataNotFound,
    /// CertificateRevoked occurs when a certificate in the path was determined to be revoked
    /// via a CRL entry or an OCSP response.
    CertificateRevoked,
    /// CrlIssuerNotValidCa occurs when the certificate used to verify a CRL is not a valid
    /// CA certificate or lacks the cRLSign key usage bit.
    CrlIssuerNotValidCa,
    /// IntermediateNotCa occurs when a certificate other than the end entity fails the CA
    /// suitability checks.
    IntermediateNotCa,
    /// RequiredNameFormAbsent occurs when a caller-required name form is not satisfied by a
    /// certificate's subject name.
    RequiredNameFormAbsent,
    /// PermittedSubtreeViolation occurs when a certificate carries a name of a constrained
    /// form that matches no operative permitted subtree for that form.
    PermittedSubtreeViolation,
    /// ExcludedSubtreeViolation occurs when a certificate carries a name that falls within
    /// an operative excluded subtree.
    ExcludedSubtreeViolation,
    /// NoPathsFound occurs when the path builder fails to find any candidate paths for the
    /// end entity certificate.
    NoPathsFound,
    /// NullPolicyIntersection occurs when the intersection of the authorities-constrained
    /// policy set and the caller's initial policy set is empty.
    NullPolicyIntersection,
    /// NoPathToTrustAnchor occurs when candidate paths were found but none contains a
    /// configured trust anchor.
    NoPathToTrustAnchor,
    /// PolicyMappingInhibited occurs when a policyMappings extension is encountered while
    /// policy mapping is inhibited.
    PolicyMappingInhibited,
    /// AnyPolicyInPolicyMapping occurs when anyPolicy appears as the issuer or subject
    /// domain policy in a policy mapping.
    AnyPolicyInPolicyMapping,
}

impl ValidationStatus {
    /// `code` returns the stable numeric rejection code associated with the status.
    pub fn code(&self) -> u32 {
        match self {
            ValidationStatus::KeyCertSignWithoutBasicConstraints => 3,
            ValidationStatus::CaWithoutKeyCertSign => 4,
            ValidationStatus::CrlIssuerWithoutCrlSign => 5,
            ValidationStatus::UnprocessedCriticalExtension => 6,
            ValidationStatus::NotCaCertificate => 7,
            ValidationStatus::InvalidValidityPeriod => 8,
            ValidationStatus::PathTooShort => 9,
            ValidationStatus::NameChainingFailure => 10,
            ValidationStatus::RevocationDataNotFound => 11,
            ValidationStatus::CertificateRevoked => 12,
            ValidationStatus::CrlIssuerNotValidCa => 13,
            ValidationStatus::IntermediateNotCa => 14,
            ValidationStatus::RequiredNameFormAbsent => 21,
            ValidationStatus::PermittedSubtreeViolation => 41,
            ValidationStatus::ExcludedSubtreeViolation => 42,
            ValidationStatus::NoPathsFound => 60,
            ValidationStatus::NullPolicyIntersection => 96,
            ValidationStatus::NoPathToTrustAnchor => 97,
            ValidationStatus::PolicyMappingInhibited => 98,
            ValidationStatus::AnyPolicyInPolicyMapping => 99,
        }
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationStatus::KeyCertSignWithoutBasicConstraints => {
                write!(f, "keyCertSign flag set without basicConstraints")
            }
            ValidationStatus::CaWithoutKeyCertSign => {
                write!(f, "keyCertSign flag not set on a CA certificate")
            }
            ValidationStatus::CrlIssuerWithoutCrlSign => {
                write!(f, "CRL issuer certificate must have cRLSign key usage flag")
            }
            ValidationStatus::UnprocessedCriticalExtension => {
                write!(f, "unable to parse critical certificate extension")
            }
            ValidationStatus::NotCaCertificate => write!(f, "not a CA certificate"),
            ValidationStatus::InvalidValidityPeriod => {
                write!(f, "certificate is either not yet valid or expired")
            }
            ValidationStatus::PathTooShort => write!(f, "too short certificate path"),
            ValidationStatus::NameChainingFailure => write!(f, "incorrect name chaining"),
            ValidationStatus::RevocationDataNotFound => {
                write!(f, "no revocation values found for one of certificates")
            }
            ValidationStatus::CertificateRevoked => {
                write!(f, "one of certificates has been revoked")
            }
            ValidationStatus::CrlIssuerNotValidCa => {
                write!(f, "CRL issuer certificate is not a CA certificate")
            }
            ValidationStatus::IntermediateNotCa => {
                write!(f, "one of intermediate certificates is not a CA certificate")
            }
            ValidationStatus::RequiredNameFormAbsent => {
                write!(f, "no necessary name form found")
            }
            ValidationStatus::PermittedSubtreeViolation => {
                write!(f, "failed to meet permitted subtrees name constraint")
            }
            ValidationStatus::ExcludedSubtreeViolation => {
                write!(f, "failed to meet excluded subtrees name constraint")
            }
            ValidationStatus::NoPathsFound => write!(f, "unable to find certificate path"),
            ValidationStatus::NullPolicyIntersection => write!(
                f,
                "no intersection between required and asserted certificate policies"
            ),
            ValidationStatus::NoPathToTrustAnchor => {
                write!(f, "no valid certificate paths found")
            }
            ValidationStatus::PolicyMappingInhibited => write!(f, "policy mapping prohibited"),
            ValidationStatus::AnyPolicyInPolicyMapping => {
                write!(f, "anyPolicy should not be a part of policy mapping scheme")
            }
        }
    }
}

/// Error type
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// PathValidation wraps the [`ValidationStatus`] describing why a path was rejected.
    PathValidation(ValidationStatus),
    /// MissingCertificate occurs when verification is attempted with an empty certificate pool.
    MissingCertificate,
    /// NotFound occurs when an action failed because a necessary artifact was not found.
    NotFound,
    /// Unrecognized occurs when an error condition does not match anything else here.
    Unrecognized,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::PathValidation(status) => {
                write!(f, "PathValidationError ({}): {}", status.code(), status)
            }
            Error::MissingCertificate => write!(f, "MissingCertificate"),
            Error::NotFound => write!(f, "NotFound"),
            Error::Unrecognized => write!(f, "Unrecognized"),
        }
    }
}

#[test]
fn error_test() {
    let statuses = [
        ValidationStatus::KeyCertSignWithoutBasicConstraints,
        ValidationStatus::CaWithoutKeyCertSign,
        ValidationStatus::CrlIssuerWithoutCrlSign,
        ValidationStatus::UnprocessedCriticalExtension,
        ValidationStatus::NotCaCertificate,
        ValidationStatus::InvalidValidityPeriod,
        ValidationStatus::PathTooShort,
        ValidationStatus::NameChainingFailure,
        ValidationStatus::RevocationDataNotFound,
        ValidationStatus::CertificateRevoked,
        ValidationStatus::CrlIssuerNotValidCa,
        ValidationStatus::IntermediateNotCa,
        ValidationStatus::RequiredNameFormAbsent,
        ValidationStatus::PermittedSubtreeViolation,
        ValidationStatus::ExcludedSubtreeViolation,
        ValidationStatus::NoPathsFound,
        ValidationStatus::NullPolicyIntersection,
        ValidationStatus::NoPathToTrustAnchor,
        ValidationStatus::PolicyMappingInhibited,
        ValidationStatus::AnyPolicyInPolicyMapping,
    ];
    let codes = [
        3u32, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 21, 41, 42, 60, 96, 97, 98, 99,
    ];
    for (status, code) in statuses.iter().zip(codes) {
        assert_eq!(status.code(), code);
        let _s = format!("{}", status);
    }
    let _s = format!("{}", Error::PathValidation(ValidationStatus::NoPathsFound));
    let _s = format!("{}", Error::MissingCertificate);
    let _s = format!("{}", Error::NotFound);
    let _s = format!("{}", Error::Unrecognized);
}
