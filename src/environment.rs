//! Traits through which callers supply cryptographic verification, issuer candidate
//! discovery and certificate origin determination to the validation engine.
//!
//! The engine performs no cryptography of its own. Signature verification is delegated to
//! a caller-provided [`SignatureVerifier`]; in tests this is typically an accept-all
//! implementation, in production a wrapper around the caller's cryptographic library.
//! Issuer discovery and origin determination have built-in defaults that may be replaced
//! via [`IssuerLookup`] and [`OriginLookup`].

use core::fmt;

use crate::certificate::Certificate;
use crate::revocation::crl::CertificateRevocationList;
use crate::util::Result;

/// `CertificateOrigin` identifies which collection a certificate was drawn from during
/// path building.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CertificateOrigin {
    /// Certificate was found among the configured trust anchors.
    TrustedCertificates,
    /// Certificate was found among the intermediate CA certificates.
    IntermediateCertificates,
    /// Certificate was found in neither collection.
    Unknown,
}

impl fmt::Display for CertificateOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CertificateOrigin::TrustedCertificates => write!(f, "Trusted Certificates"),
            CertificateOrigin::IntermediateCertificates => {
                write!(f, "Intermediate Certificates")
            }
            CertificateOrigin::Unknown => write!(f, "Unknown"),
        }
    }
}

/// `SignatureVerifier` performs signature verification over certificates and CRLs.
///
/// Implementations receive the artifact to verify and, for certificates, the issuer
/// certificate whose public key should verify the signature. `None` indicates the
/// certificate is to be checked as self-signed. A failed verification is reported via
/// `Err`; `Ok(())` means the signature is valid.
pub trait SignatureVerifier {
    /// `verify_certificate` verifies the signature on `certificate` using the public key
    /// from `issuer`, or the certificate's own public key when `issuer` is `None`.
    fn verify_certificate(
        &self,
        certificate: &Certificate,
        issuer: Option<&Certificate>,
    ) -> Result<()>;

    /// `verify_crl` verifies the signature on `crl` using the public key from `issuer`.
    fn verify_crl(&self, crl: &CertificateRevocationList, issuer: &Certificate) -> Result<()>;
}

/// `IssuerLookup` produces issuer candidates for a certificate during path building.
///
/// Implementations return every certificate from the engine's pools that may have issued
/// `certificate`, in pool order. An over-inclusive result is acceptable; signature
/// verification prunes wrong candidates afterwards.
pub trait IssuerLookup {
    /// `find_issuer` returns issuer candidates for `certificate` drawn from `trusted_certs`
    /// and `certs`.
    fn find_issuer(
        &self,
        certificate: &Certificate,
        trusted_certs: &[Certificate],
        certs: &[Certificate],
    ) -> Result<Vec<Certificate>>;
}

/// `OriginLookup` determines which collection a certificate belongs to.
pub trait OriginLookup {
    /// `find_origin` classifies `certificate` relative to `trusted_certs` and `certs`.
    fn find_origin(
        &self,
        certificate: &Certificate,
        trusted_certs: &[Certificate],
        certs: &[Certificate],
    ) -> CertificateOrigin;
}
