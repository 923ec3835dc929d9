//! CRL representation and discovery of CRLs applicable to a certificate

use der::asn1::ObjectIdentifier;
use log::debug;

use crate::certificate::{Certificate, Name, SerialNumber};
use crate::environment::SignatureVerifier;
use crate::validator::name_match::compare_names;

/// `RevokedEntry` is one entry in a CRL's revoked certificates list.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RevokedEntry {
    /// Serial number of the revoked certificate.
    pub serial_number: SerialNumber,
    /// Revocation instant as seconds since the Unix epoch.
    pub revocation_date: u64,
}

/// `CertificateRevocationList` is a parsed CRL with the fields consumed during revocation
/// checking.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CertificateRevocationList {
    /// Issuer name of the CRL.
    pub issuer: Name,
    /// thisUpdate instant as seconds since the Unix epoch.
    pub this_update: u64,
    /// nextUpdate instant as seconds since the Unix epoch.
    pub next_update: u64,
    /// Revoked certificate entries.
    pub revoked_certificates: Vec<RevokedEntry>,
    /// Signature algorithm.
    pub signature_algorithm: ObjectIdentifier,
    /// Signature value, opaque to this crate.
    pub signature: Vec<u8>,
}

impl CertificateRevocationList {
    /// `is_certificate_revoked` returns true if the CRL lists the certificate's serial
    /// number. Revocation reasons and entry extensions are not considered.
    pub fn is_certificate_revoked(&self, certificate: &Certificate) -> bool {
        self.revoked_certificates
            .iter()
            .any(|entry| entry.serial_number == certificate.serial_number)
    }
}

/// `CrlSearchOutcome` is the result of searching for CRLs applicable to a certificate.
#[derive(Clone, Debug)]
pub(crate) enum CrlSearchOutcome {
    /// At least one current, signature-verified CRL from the certificate's issuer was
    /// found; each entry pairs a CRL index with the certificate that verified it.
    Matches(Vec<(usize, Certificate)>),
    /// CRLs from the certificate's issuer were found but no certificate in the pool
    /// carries the issuer's subject name.
    NoIssuerCertificates,
    /// No current CRL from the certificate's issuer is available.
    NoCrlsForIssuer,
    /// CRLs and candidate issuer certificates were found but no CRL signature verified.
    NoValidCrls,
}

/// `find_crls_for_certificate` locates CRLs applicable to `certificate`, pairing each with
/// the first certificate from `pool` that verified its signature. CRLs whose nextUpdate
/// instant precedes `check_date` are stale and never pair.
pub(crate) fn find_crls_for_certificate(
    certificate: &Certificate,
    pool: &[Certificate],
    crls: &[CertificateRevocationList],
    check_date: u64,
    verifier: &dyn SignatureVerifier,
) -> CrlSearchOutcome {
    let issuer_certs: Vec<&Certificate> = pool
        .iter()
        .filter(|cert| compare_names(&certificate.issuer, &cert.subject))
        .collect();
    if issuer_certs.is_empty() {
        debug!("No certificates for CRL issuer");
        return CrlSearchOutcome::NoIssuerCertificates;
    }

    let candidate_indices: Vec<usize> = crls
        .iter()
        .enumerate()
        .filter(|(_, crl)| compare_names(&crl.issuer, &certificate.issuer))
        .map(|(i, _)| i)
        .collect();
    if candidate_indices.is_empty() {
        debug!("No CRLs for specific certificate issuer");
        return CrlSearchOutcome::NoCrlsForIssuer;
    }

    let mut matches = Vec::new();
    for i in candidate_indices {
        let crl = &crls[i];
        // a stale CRL proves nothing; an updated one should exist
        if crl.next_update < check_date {
            continue;
        }
        for issuer_cert in &issuer_certs {
            if verifier.verify_crl(crl, issuer_cert).is_ok() {
                matches.push((i, (*issuer_cert).clone()));
                break;
            }
        }
    }

    if matches.is_empty() {
        debug!("No valid CRLs found");
        return CrlSearchOutcome::NoValidCrls;
    }
    CrlSearchOutcome::Matches(matches)
}
