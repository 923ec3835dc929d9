//! Caller-supplied settings governing one verification

use const_oid::db::rfc5280::ANY_POLICY;
use der::asn1::ObjectIdentifier;
use serde::{Deserialize, Serialize};

use crate::certificate::{oid_vec_serde, GeneralSubtree};

/// `ValidationSettings` carries the caller-supplied inputs of the policy and name
/// constraint processing defined in [RFC 5280 Section 6.1.1](https://datatracker.ietf.org/doc/html/rfc5280#section-6.1.1),
/// plus the revocation tolerance opt-in. The default value requests no particular policy
/// (`anyPolicy`), activates no indicators and imposes no name constraints.
///
/// Settings serialize to and from JSON so that verification profiles can be stored
/// alongside trust anchor collections.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationSettings {
    /// Certificate policies acceptable to the caller; `anyPolicy` accepts all.
    #[serde(with = "oid_vec_serde")]
    pub initial_policy_set: Vec<ObjectIdentifier>,
    /// Activates the explicit-policy indicator from the start of processing.
    pub initial_explicit_policy: bool,
    /// Activates the policy-mapping-inhibit indicator from the start of processing.
    pub initial_policy_mapping_inhibit: bool,
    /// Activates the inhibit-anyPolicy indicator from the start of processing.
    pub initial_inhibit_any_policy: bool,
    /// Permitted subtrees in effect before any certificate contributes its own.
    pub initial_permitted_subtrees: Vec<GeneralSubtree>,
    /// Excluded subtrees in effect before any certificate contributes its own.
    pub initial_excluded_subtrees: Vec<GeneralSubtree>,
    /// Name forms every certificate subject must match; only directoryName entries are
    /// considered.
    pub initial_required_name_forms: Vec<GeneralSubtree>,
    /// Tolerates missing revocation data for issuers that publish no revocation pointers.
    pub passed_when_not_rev_values: bool,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        ValidationSettings {
            initial_policy_set: vec![ANY_POLICY],
            initial_explicit_policy: false,
            initial_policy_mapping_inhibit: false,
            initial_inhibit_any_policy: false,
            initial_permitted_subtrees: Vec::new(),
            initial_excluded_subtrees: Vec::new(),
            initial_required_name_forms: Vec::new(),
            passed_when_not_rev_values: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certificate::GeneralName;

    #[test]
    fn default_settings() {
        let settings = ValidationSettings::default();
        assert_eq!(settings.initial_policy_set, vec![ANY_POLICY]);
        assert!(!settings.initial_explicit_policy);
        assert!(!settings.passed_when_not_rev_values);
        assert!(settings.initial_permitted_subtrees.is_empty());
    }

    #[test]
    fn settings_json_round_trip() {
        let mut settings = ValidationSettings::default();
        settings.initial_policy_set = vec![ObjectIdentifier::new_unwrap("1.2.3.4")];
        settings.initial_explicit_policy = true;
        settings.initial_excluded_subtrees = vec![GeneralSubtree::new(GeneralName::DnsName(
            "example.com".to_string(),
        ))];
        settings.passed_when_not_rev_values = true;

        let json = serde_json::to_string(&settings).unwrap();
        let recovered: ValidationSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(settings, recovered);
    }

    #[test]
    fn settings_from_partial_json() {
        let recovered: ValidationSettings =
            serde_json::from_str("{\"initial_explicit_policy\":true}").unwrap();
        assert!(recovered.initial_explicit_policy);
        assert_eq!(recovered.initial_policy_set, vec![ANY_POLICY]);
    }
}
