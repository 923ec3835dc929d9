//! Certification path discovery and validation engine.
//!
//! [`CertificateChainValidationEngine`] composes the pieces defined elsewhere in this
//! crate: recursive path building over the trusted and intermediate certificate pools,
//! selection of the shortest path reaching a trust anchor, per-certificate basic checks
//! (validity window, name chaining, revocation status, CA suitability) and finally the
//! policy and name constraint processing of
//! [`process_policies_and_constraints`](crate::validator::policy_processor::process_policies_and_constraints).
//!
//! ```no_run
//! use chainval::{CertificateChainValidationEngine, SignatureVerifier, ValidationSettings};
//! # fn demo(trusted: Vec<chainval::Certificate>, certs: Vec<chainval::Certificate>, verifier: &dyn SignatureVerifier) -> chainval::Result<()> {
//! let engine = CertificateChainValidationEngine::new(trusted, certs, vec![], vec![], verifier);
//! let result = engine.verify(&ValidationSettings::default())?;
//! println!("policies: {:?}", result.user_constr_policies);
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeSet;

use const_oid::db::rfc5912::{
    ID_CE_CRL_DISTRIBUTION_POINTS, ID_CE_FRESHEST_CRL, ID_PE_AUTHORITY_INFO_ACCESS,
};
use log::{debug, error, info};

use crate::certificate::{Certificate, ExtensionValue, KeyUsages, Name, SerialNumber};
use crate::environment::{CertificateOrigin, IssuerLookup, OriginLookup, SignatureVerifier};
use crate::revocation::crl::{find_crls_for_certificate, CrlSearchOutcome};
use crate::revocation::ocsp::{find_ocsp_status, OcspResponder, OcspStatus};
use crate::revocation::CertificateRevocationList;
use crate::util::{unix_now, Error, Result, ValidationStatus};
use crate::validator::name_match::compare_names;
use crate::validator::path_results::PolicyVerificationResult;
use crate::validator::path_settings::ValidationSettings;
use crate::validator::policy_processor::process_policies_and_constraints;

/// `CertificateChainValidationEngine` determines whether a valid, policy-compliant,
/// non-revoked certification path exists from an end entity certificate to a trust
/// anchor, per [RFC 5280 Section 6](https://datatracker.ietf.org/doc/html/rfc5280#section-6).
///
/// The engine owns its certificate and CRL collections for the duration of a set of
/// verifications and borrows the caller's verifier, OCSP responders and optional lookup
/// overrides. One [`verify`](CertificateChainValidationEngine::verify) call works on local
/// copies of all intermediate state, so concurrent calls against a shared engine are safe.
pub struct CertificateChainValidationEngine<'a> {
    trusted_certs: Vec<Certificate>,
    certs: Vec<Certificate>,
    crls: Vec<CertificateRevocationList>,
    ocsps: Vec<&'a dyn OcspResponder>,
    check_date: u64,
    verifier: &'a dyn SignatureVerifier,
    issuer_lookup: Option<&'a dyn IssuerLookup>,
    origin_lookup: Option<&'a dyn OriginLookup>,
}

impl<'a> CertificateChainValidationEngine<'a> {
    /// Instantiates a new engine over the given pools. The check date defaults to the
    /// current time and the built-in issuer and origin lookups are used; see
    /// [`with_check_date`](Self::with_check_date),
    /// [`with_issuer_lookup`](Self::with_issuer_lookup) and
    /// [`with_origin_lookup`](Self::with_origin_lookup).
    ///
    /// The last certificate in `certs` is treated as the end entity to validate.
    pub fn new(
        trusted_certs: Vec<Certificate>,
        certs: Vec<Certificate>,
        crls: Vec<CertificateRevocationList>,
        ocsps: Vec<&'a dyn OcspResponder>,
        verifier: &'a dyn SignatureVerifier,
    ) -> Self {
        CertificateChainValidationEngine {
            trusted_certs,
            certs,
            crls,
            ocsps,
            check_date: unix_now(),
            verifier,
            issuer_lookup: None,
            origin_lookup: None,
        }
    }

    /// Sets the time of interest for validity window and CRL freshness checks.
    pub fn with_check_date(mut self, check_date: u64) -> Self {
        self.check_date = check_date;
        self
    }

    /// Replaces the built-in issuer candidate discovery.
    pub fn with_issuer_lookup(mut self, issuer_lookup: &'a dyn IssuerLookup) -> Self {
        self.issuer_lookup = Some(issuer_lookup);
        self
    }

    /// Replaces the built-in origin determination.
    pub fn with_origin_lookup(mut self, origin_lookup: &'a dyn OriginLookup) -> Self {
        self.origin_lookup = Some(origin_lookup);
        self
    }

    /// `find_origin` reports which pool `certificate` was drawn from. The result is
    /// informational; the validation algorithm itself does not consult it.
    pub fn find_origin(&self, certificate: &Certificate) -> CertificateOrigin {
        if let Some(origin_lookup) = self.origin_lookup {
            return origin_lookup.find_origin(certificate, &self.trusted_certs, &self.certs);
        }
        if self.certs.iter().any(|cert| cert == certificate) {
            return CertificateOrigin::IntermediateCertificates;
        }
        if self.trusted_certs.iter().any(|cert| cert == certificate) {
            return CertificateOrigin::TrustedCertificates;
        }
        CertificateOrigin::Unknown
    }

    /// `find_issuer` returns the certificates from the engine's pools that may have
    /// issued `certificate`, signature-verified against it.
    ///
    /// The built-in lookup short-circuits self-signed certificates whose self-signature
    /// verifies, returning the certificate itself. Otherwise candidates are selected by
    /// the authorityKeyIdentifier key identifier against candidate subjectKeyIdentifier
    /// values when both sides carry them, by the (authorityCertIssuer,
    /// authorityCertSerialNumber) pair, or by plain issuer name matching, and then pruned
    /// by signature verification.
    pub fn find_issuer(&self, certificate: &Certificate) -> Result<Vec<Certificate>> {
        if let Some(issuer_lookup) = self.issuer_lookup {
            return issuer_lookup.find_issuer(certificate, &self.trusted_certs, &self.certs);
        }

        if compare_names(&certificate.subject, &certificate.issuer)
            && self.verifier.verify_certificate(certificate, None).is_ok()
        {
            return Ok(vec![certificate.clone()]);
        }

        let mut key_identifier: Option<Vec<u8>> = None;
        let mut authority_cert_issuer: Option<Name> = None;
        let mut authority_cert_serial_number: Option<SerialNumber> = None;
        for ext in &certificate.extensions {
            if let Some(ExtensionValue::AuthorityKeyIdentifier {
                key_identifier: aki,
                authority_cert_issuer: aci,
                authority_cert_serial_number: acsn,
            }) = &ext.value
            {
                if aki.is_some() {
                    key_identifier = aki.clone();
                } else {
                    authority_cert_issuer = aci.clone();
                    authority_cert_serial_number = acsn.clone();
                }
                break;
            }
        }

        let mut result: Vec<Certificate> = Vec::new();
        for candidate in self.trusted_certs.iter().chain(self.certs.iter()) {
            if issuer_candidate_matches(
                certificate,
                candidate,
                key_identifier.as_deref(),
                authority_cert_issuer.as_ref(),
                authority_cert_serial_number.as_ref(),
            ) {
                result.push(candidate.clone());
            }
        }

        result.retain(|candidate| {
            self.verifier
                .verify_certificate(certificate, Some(candidate))
                .is_ok()
        });
        Ok(result)
    }

    /// `build_paths` discovers every acyclic issuer chain for `certificate`. Each
    /// returned chain runs from the certificate's immediate issuer up to a self-signed
    /// certificate and excludes `certificate` itself; an empty result means no issuer
    /// candidates exist anywhere in the pools.
    pub fn build_paths(&self, certificate: &Certificate) -> Result<Vec<Vec<Certificate>>> {
        let mut visited = BTreeSet::new();
        visited.insert(certificate.tbs_digest());
        self.build_paths_recursive(certificate, &mut visited)
    }

    fn build_paths_recursive(
        &self,
        certificate: &Certificate,
        visited: &mut BTreeSet<[u8; 32]>,
    ) -> Result<Vec<Vec<Certificate>>> {
        let mut result = Vec::new();

        for candidate in self.find_issuer(certificate)? {
            if candidate == *certificate {
                // self-signed, terminates the chain
                result.push(vec![candidate]);
                continue;
            }

            let digest = candidate.tbs_digest();
            if !visited.insert(digest) {
                continue;
            }
            let sub_chains = self.build_paths_recursive(&candidate, visited)?;
            visited.remove(&digest);

            for sub_chain in sub_chains {
                let mut chain = Vec::with_capacity(sub_chain.len() + 1);
                chain.push(candidate.clone());
                chain.extend(sub_chain);
                result.push(chain);
            }
        }

        Ok(result)
    }

    /// `check_for_ca` determines whether `certificate` is usable as a CA certificate,
    /// additionally requiring the cRLSign key usage bit when `need_to_check_crl` is set.
    /// Rejections carry [`ValidationStatus::UnprocessedCriticalExtension`],
    /// [`ValidationStatus::KeyCertSignWithoutBasicConstraints`],
    /// [`ValidationStatus::CaWithoutKeyCertSign`],
    /// [`ValidationStatus::CrlIssuerWithoutCrlSign`] or
    /// [`ValidationStatus::NotCaCertificate`].
    pub fn check_for_ca(&self, certificate: &Certificate, need_to_check_crl: bool) -> Result<()> {
        let mut is_ca = false;
        let mut must_be_ca = false;
        let mut key_usage_present = false;
        let mut crl_sign = false;

        for ext in &certificate.extensions {
            if ext.critical && ext.value.is_none() {
                return Err(Error::PathValidation(
                    ValidationStatus::UnprocessedCriticalExtension,
                ));
            }
            match &ext.value {
                Some(ExtensionValue::KeyUsage(flags)) => {
                    key_usage_present = true;
                    if flags.contains(KeyUsages::KeyCertSign) {
                        must_be_ca = true;
                    }
                    if flags.contains(KeyUsages::CRLSign) {
                        crl_sign = true;
                    }
                }
                Some(ExtensionValue::BasicConstraints { ca }) => {
                    if *ca {
                        is_ca = true;
                    }
                }
                _ => {}
            }
        }

        if must_be_ca && !is_ca {
            return Err(Error::PathValidation(
                ValidationStatus::KeyCertSignWithoutBasicConstraints,
            ));
        }
        if key_usage_present && is_ca && !must_be_ca {
            return Err(Error::PathValidation(ValidationStatus::CaWithoutKeyCertSign));
        }
        if is_ca && key_usage_present && need_to_check_crl && !crl_sign {
            return Err(Error::PathValidation(
                ValidationStatus::CrlIssuerWithoutCrlSign,
            ));
        }
        if !is_ca {
            return Err(Error::PathValidation(ValidationStatus::NotCaCertificate));
        }
        Ok(())
    }

    /// `basic_path_check` runs the per-certificate checks over `path`, ordered trust
    /// anchor first: validity windows, minimum length, name chaining, revocation status
    /// and CA suitability.
    pub fn basic_path_check(
        &self,
        path: &[Certificate],
        passed_when_not_rev_values: bool,
    ) -> Result<()> {
        let pool = self.deduplicated_pool();
        self.check_path(path, &pool, passed_when_not_rev_values)
    }

    /// `verify` builds candidate paths for the end entity certificate, selects the
    /// shortest one reaching a trust anchor, runs the basic path checks and then the
    /// policy and name constraint processing. The returned path is ordered trust anchor
    /// first.
    pub fn verify(&self, settings: &ValidationSettings) -> Result<PolicyVerificationResult> {
        if self.certs.is_empty() {
            error!("Unable to verify: empty certificate pool");
            return Err(Error::MissingCertificate);
        }

        let pool = self.deduplicated_pool();
        let end_entity = match pool.last() {
            Some(end_entity) => end_entity.clone(),
            None => return Err(Error::MissingCertificate),
        };

        let path = self.discover_path(&end_entity)?;
        info!(
            "Selected certification path with {} certificates",
            path.len()
        );

        self.check_path(&path, &pool, settings.passed_when_not_rev_values)?;
        process_policies_and_constraints(&path, settings)
    }

    /// Trusted certificates followed by intermediates, first occurrence kept on
    /// duplicated content.
    fn deduplicated_pool(&self) -> Vec<Certificate> {
        let mut seen = BTreeSet::new();
        let mut pool = Vec::new();
        for cert in self.trusted_certs.iter().chain(self.certs.iter()) {
            if seen.insert(cert.tbs_digest()) {
                pool.push(cert.clone());
            }
        }
        pool
    }

    fn is_trusted(&self, certificate: &Certificate) -> bool {
        self.trusted_certs.iter().any(|cert| cert == certificate)
    }

    /// Builds all chains for `end_entity`, keeps those reaching a trust anchor, selects
    /// the shortest (first found on ties) and returns it anchor-first, truncated at the
    /// anchor.
    fn discover_path(&self, end_entity: &Certificate) -> Result<Vec<Certificate>> {
        let chains = self.build_paths(end_entity)?;
        if chains.is_empty() {
            error!("Unable to find any certification path");
            return Err(Error::PathValidation(ValidationStatus::NoPathsFound));
        }
        debug!("Found {} candidate chains", chains.len());

        let surviving: Vec<Vec<Certificate>> = chains
            .into_iter()
            .filter(|chain| chain.iter().any(|cert| self.is_trusted(cert)))
            .collect();
        if surviving.is_empty() {
            error!("No candidate chain reaches a trust anchor");
            return Err(Error::PathValidation(ValidationStatus::NoPathToTrustAnchor));
        }

        let mut shortest_index = 0;
        for (i, chain) in surviving.iter().enumerate() {
            if chain.len() < surviving[shortest_index].len() {
                shortest_index = i;
            }
        }
        let chain = &surviving[shortest_index];

        let anchor_position = chain
            .iter()
            .position(|cert| self.is_trusted(cert))
            .ok_or(Error::Unrecognized)?;

        let mut path = Vec::with_capacity(anchor_position + 2);
        path.push(end_entity.clone());
        path.extend(chain[..=anchor_position].iter().cloned());
        path.reverse();
        Ok(path)
    }

    fn check_path(
        &self,
        path: &[Certificate],
        pool: &[Certificate],
        passed_when_not_rev_values: bool,
    ) -> Result<()> {
        for cert in path {
            if cert.not_before > self.check_date || cert.not_after < self.check_date {
                return Err(Error::PathValidation(ValidationStatus::InvalidValidityPeriod));
            }
        }

        // at least a trust anchor and an end entity
        if path.len() < 2 {
            return Err(Error::PathValidation(ValidationStatus::PathTooShort));
        }

        for i in 1..path.len() {
            let cert = &path[i];
            if !compare_names(&cert.issuer, &cert.subject)
                && !compare_names(&cert.issuer, &path[i - 1].subject)
            {
                return Err(Error::PathValidation(ValidationStatus::NameChainingFailure));
            }
        }

        // with no revocation material configured, all certificates are taken as valid
        if !self.crls.is_empty() || !self.ocsps.is_empty() {
            for i in (1..path.len()).rev() {
                self.check_revocation_status(&path[i], &path[i - 1], pool, passed_when_not_rev_values)?;
            }
        }

        for i in (0..path.len() - 1).rev() {
            if let Err(e) = self.check_for_ca(&path[i], false) {
                debug!("Certificate at path position {} failed the CA checks: {}", i, e);
                return Err(Error::PathValidation(ValidationStatus::IntermediateNotCa));
            }
        }

        Ok(())
    }

    /// Proves one certificate non-revoked: OCSP when configured, CRLs as fallback, with
    /// the `passed_when_not_rev_values` tolerance applied only when the issuer publishes
    /// no revocation pointers.
    fn check_revocation_status(
        &self,
        certificate: &Certificate,
        issuer: &Certificate,
        pool: &[Certificate],
        passed_when_not_rev_values: bool,
    ) -> Result<()> {
        let mut ocsp_status = OcspStatus::Unknown;
        if !self.ocsps.is_empty() {
            ocsp_status = find_ocsp_status(certificate, issuer, &self.ocsps);
            match ocsp_status {
                OcspStatus::Good => return Ok(()),
                OcspStatus::Revoked => {
                    return Err(Error::PathValidation(ValidationStatus::CertificateRevoked))
                }
                OcspStatus::Unknown => {}
            }
        }

        let mut crl_outcome = None;
        if !self.crls.is_empty() {
            let outcome = find_crls_for_certificate(
                certificate,
                pool,
                &self.crls,
                self.check_date,
                self.verifier,
            );
            match &outcome {
                CrlSearchOutcome::Matches(matches) => {
                    for (crl_index, crl_issuer) in matches {
                        if self.crls[*crl_index].is_certificate_revoked(certificate) {
                            return Err(Error::PathValidation(
                                ValidationStatus::CertificateRevoked,
                            ));
                        }
                        if self.check_for_ca(crl_issuer, true).is_err() {
                            return Err(Error::PathValidation(
                                ValidationStatus::CrlIssuerNotValidCa,
                            ));
                        }
                    }
                }
                _ => {
                    if !passed_when_not_rev_values {
                        return Err(Error::PathValidation(
                            ValidationStatus::RevocationDataNotFound,
                        ));
                    }
                }
            }
            crl_outcome = Some(outcome);
        } else if ocsp_status == OcspStatus::Unknown {
            return Err(Error::PathValidation(
                ValidationStatus::RevocationDataNotFound,
            ));
        }

        // The tolerance only stands when the issuer never published revocation data: a
        // CRL distribution point, freshest CRL or authority info access extension on the
        // issuer makes missing values fatal after all.
        if ocsp_status == OcspStatus::Unknown
            && matches!(crl_outcome, Some(CrlSearchOutcome::NoCrlsForIssuer))
            && passed_when_not_rev_values
        {
            let publishes_revocation_data = issuer.extensions.iter().any(|ext| {
                ext.oid == ID_CE_CRL_DISTRIBUTION_POINTS
                    || ext.oid == ID_CE_FRESHEST_CRL
                    || ext.oid == ID_PE_AUTHORITY_INFO_ACCESS
            });
            if publishes_revocation_data {
                return Err(Error::PathValidation(
                    ValidationStatus::RevocationDataNotFound,
                ));
            }
        }

        Ok(())
    }
}

/// Issuer candidate selection: a key identifier decides when the candidate carries a
/// subjectKeyIdentifier; else the (authorityCertIssuer, authorityCertSerialNumber) pair
/// when present; else plain issuer name matching.
fn issuer_candidate_matches(
    certificate: &Certificate,
    candidate: &Certificate,
    key_identifier: Option<&[u8]>,
    authority_cert_issuer: Option<&Name>,
    authority_cert_serial_number: Option<&SerialNumber>,
) -> bool {
    if let Some(key_identifier) = key_identifier {
        for ext in &candidate.extensions {
            if let Some(ExtensionValue::SubjectKeyIdentifier(ski)) = &ext.value {
                return ski.as_slice() == key_identifier;
            }
        }
    }

    let serial_matches = authority_cert_serial_number
        .map_or(false, |serial| *serial == candidate.serial_number);

    match authority_cert_issuer {
        Some(authority_cert_issuer) => {
            compare_names(&candidate.subject, authority_cert_issuer) && serial_matches
        }
        None => compare_names(&certificate.issuer, &candidate.subject),
    }
}
