#![allow(dead_code)]

//! Shared fixtures: programmatic certificate and CRL builders plus stub verifier and
//! OCSP responder implementations.

use chainval::*;
use const_oid::db::rfc4519::CN;
use const_oid::db::rfc5912::{RSA_ENCRYPTION, SHA_256_WITH_RSA_ENCRYPTION};
use der::asn1::ObjectIdentifier;

/// Time of interest used across the tests.
pub const CHECK_DATE: u64 = 1_700_000_000;

/// A name with a single commonName attribute.
pub fn cn(value: &str) -> Name {
    Name::new(vec![AttributeTypeAndValue::new(CN, value)])
}

pub fn oid(value: &str) -> ObjectIdentifier {
    value.parse().unwrap()
}

/// Accepts every certificate and CRL signature.
pub struct AcceptAllVerifier;

impl SignatureVerifier for AcceptAllVerifier {
    fn verify_certificate(
        &self,
        _certificate: &Certificate,
        _issuer: Option<&Certificate>,
    ) -> Result<()> {
        Ok(())
    }

    fn verify_crl(
        &self,
        _crl: &CertificateRevocationList,
        _issuer: &Certificate,
    ) -> Result<()> {
        Ok(())
    }
}

/// Answers OCSP queries from a fixed serial number to status table.
#[derive(Default)]
pub struct StaticOcspResponder {
    answers: Vec<(SerialNumber, OcspStatus)>,
}

impl StaticOcspResponder {
    pub fn new() -> Self {
        StaticOcspResponder::default()
    }

    pub fn with_answer(mut self, serial: u64, status: OcspStatus) -> Self {
        self.answers.push((SerialNumber::from(serial), status));
        self
    }
}

impl OcspResponder for StaticOcspResponder {
    fn certificate_status(
        &self,
        certificate: &Certificate,
        _issuer: &Certificate,
    ) -> OcspCertStatus {
        for (serial, status) in &self.answers {
            if *serial == certificate.serial_number {
                return OcspCertStatus {
                    is_for_certificate: true,
                    status: *status,
                };
            }
        }
        OcspCertStatus {
            is_for_certificate: false,
            status: OcspStatus::Unknown,
        }
    }
}

pub struct CertBuilder {
    subject: Name,
    issuer: Name,
    serial: u64,
    not_before: u64,
    not_after: u64,
    extensions: Vec<Extension>,
}

impl CertBuilder {
    pub fn new(subject: &str, issuer: &str, serial: u64) -> Self {
        CertBuilder {
            subject: cn(subject),
            issuer: cn(issuer),
            serial,
            not_before: 0,
            not_after: u64::MAX,
            extensions: Vec::new(),
        }
    }

    pub fn subject_name(mut self, subject: Name) -> Self {
        self.subject = subject;
        self
    }

    pub fn validity(mut self, not_before: u64, not_after: u64) -> Self {
        self.not_before = not_before;
        self.not_after = not_after;
        self
    }

    pub fn extension(mut self, extension: Extension) -> Self {
        self.extensions.push(extension);
        self
    }

    /// basicConstraints cA plus keyCertSign and cRLSign key usage.
    pub fn ca(self) -> Self {
        self.extension(Extension::from_value(
            true,
            ExtensionValue::BasicConstraints { ca: true },
        ))
        .extension(Extension::from_value(
            true,
            ExtensionValue::KeyUsage(KeyUsages::KeyCertSign | KeyUsages::CRLSign),
        ))
    }

    /// basicConstraints cA plus keyCertSign only.
    pub fn ca_without_crl_sign(self) -> Self {
        self.extension(Extension::from_value(
            true,
            ExtensionValue::BasicConstraints { ca: true },
        ))
        .extension(Extension::from_value(
            true,
            ExtensionValue::KeyUsage(KeyUsages::KeyCertSign.into()),
        ))
    }

    pub fn policies(self, oids: &[&str]) -> Self {
        let policies = oids
            .iter()
            .map(|value| PolicyInformation::new(oid(value)))
            .collect();
        self.extension(Extension::from_value(
            false,
            ExtensionValue::CertificatePolicies(policies),
        ))
    }

    pub fn mappings(self, pairs: &[(&str, &str)]) -> Self {
        let mappings = pairs
            .iter()
            .map(|(issuer_domain, subject_domain)| PolicyMapping {
                issuer_domain_policy: oid(issuer_domain),
                subject_domain_policy: oid(subject_domain),
            })
            .collect();
        self.extension(Extension::from_value(
            false,
            ExtensionValue::PolicyMappings(mappings),
        ))
    }

    pub fn policy_constraints(
        self,
        require_explicit_policy: Option<u32>,
        inhibit_policy_mapping: Option<u32>,
    ) -> Self {
        self.extension(Extension::from_value(
            true,
            ExtensionValue::PolicyConstraints {
                require_explicit_policy,
                inhibit_policy_mapping,
            },
        ))
    }

    pub fn inhibit_any_policy(self, skip_certs: u32) -> Self {
        self.extension(Extension::from_value(
            true,
            ExtensionValue::InhibitAnyPolicy(skip_certs),
        ))
    }

    pub fn name_constraints(
        self,
        permitted: Vec<GeneralSubtree>,
        excluded: Vec<GeneralSubtree>,
    ) -> Self {
        self.extension(Extension::from_value(
            true,
            ExtensionValue::NameConstraints {
                permitted_subtrees: permitted,
                excluded_subtrees: excluded,
            },
        ))
    }

    pub fn san(self, names: Vec<GeneralName>) -> Self {
        self.extension(Extension::from_value(
            false,
            ExtensionValue::SubjectAltName(names),
        ))
    }

    pub fn build(self) -> Certificate {
        let key_seed: String = self
            .subject
            .rdn_sequence
            .iter()
            .map(|attr| attr.value.as_str())
            .collect();
        Certificate::new(
            self.subject.clone(),
            self.issuer,
            SerialNumber::from(self.serial),
            self.not_before,
            self.not_after,
            SubjectPublicKeyInfo {
                algorithm: RSA_ENCRYPTION,
                subject_public_key: format!("{}-{}", key_seed, self.serial).into_bytes(),
            },
            SHA_256_WITH_RSA_ENCRYPTION,
            Vec::new(),
            self.extensions,
        )
    }
}

/// A CRL from `issuer` listing `revoked` serial numbers, current at [`CHECK_DATE`].
pub fn crl(issuer: &str, revoked: &[u64]) -> CertificateRevocationList {
    CertificateRevocationList {
        issuer: cn(issuer),
        this_update: CHECK_DATE - 10_000,
        next_update: CHECK_DATE + 10_000,
        revoked_certificates: revoked
            .iter()
            .map(|serial| RevokedEntry {
                serial_number: SerialNumber::from(*serial),
                revocation_date: CHECK_DATE - 5_000,
            })
            .collect(),
        signature_algorithm: SHA_256_WITH_RSA_ENCRYPTION,
        signature: Vec::new(),
    }
}

/// Root, intermediate and end entity with default validity.
pub fn simple_chain() -> (Certificate, Certificate, Certificate) {
    let root = CertBuilder::new("Root CA", "Root CA", 1).ca().build();
    let intermediate = CertBuilder::new("Intermediate CA", "Root CA", 2).ca().build();
    let end_entity = CertBuilder::new("End Entity", "Intermediate CA", 3).build();
    (root, intermediate, end_entity)
}

/// Asserts that a verification was rejected with the given numeric code.
pub fn expect_code<T: std::fmt::Debug>(result: Result<T>, code: u32) {
    match result {
        Err(Error::PathValidation(status)) => assert_eq!(
            status.code(),
            code,
            "expected code {}, got {} ({})",
            code,
            status.code(),
            status
        ),
        other => panic!("expected rejection with code {}, got {:?}", code, other),
    }
}
