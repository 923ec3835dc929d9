//! OCSP status determination via caller-provided responders

use crate::certificate::Certificate;

/// `OcspStatus` is the revocation status asserted by an OCSP responder for a certificate.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OcspStatus {
    /// The responder asserts the certificate is not revoked.
    Good,
    /// The responder asserts the certificate is revoked.
    Revoked,
    /// The responder makes no assertion about the certificate.
    Unknown,
}

/// `OcspCertStatus` is a responder's answer for one certificate.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct OcspCertStatus {
    /// True if the responder's answer pertains to the queried certificate.
    pub is_for_certificate: bool,
    /// Asserted status, meaningful only when `is_for_certificate` is true.
    pub status: OcspStatus,
}

/// `OcspResponder` answers revocation status queries for certificates.
///
/// Implementations typically wrap a parsed OCSP response or a client that fetches one.
/// The issuer certificate is supplied so that implementations can compute the request's
/// issuer name and key hashes.
pub trait OcspResponder {
    /// `certificate_status` returns the responder's answer for `certificate`, issued by
    /// `issuer`.
    fn certificate_status(&self, certificate: &Certificate, issuer: &Certificate)
        -> OcspCertStatus;
}

/// `find_ocsp_status` queries each responder in turn and returns the first definitive
/// status claimed for the certificate. Responders that do not speak for the certificate,
/// or answer `Unknown`, do not terminate the scan.
pub(crate) fn find_ocsp_status(
    certificate: &Certificate,
    issuer: &Certificate,
    responders: &[&dyn OcspResponder],
) -> OcspStatus {
    for responder in responders {
        let answer = responder.certificate_status(certificate, issuer);
        if answer.is_for_certificate {
            match answer.status {
                OcspStatus::Good => return OcspStatus::Good,
                OcspStatus::Revoked => return OcspStatus::Revoked,
                OcspStatus::Unknown => {}
            }
        }
    }
    OcspStatus::Unknown
}
