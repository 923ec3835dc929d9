//! Results produced by a successful verification

use der::asn1::ObjectIdentifier;

use crate::certificate::{Certificate, PolicyMapping};

/// `PolicyVerificationResult` is returned by a successful verification. The certificate
/// path is ordered trust anchor first; `policy_mappings` is indexed in parallel with it,
/// with `None` at positions whose certificate carries no policyMappings extension (the
/// anchor position is always `None`).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PolicyVerificationResult {
    /// Policies valid across the whole path as constrained by the authorities.
    pub auth_constr_policies: Vec<ObjectIdentifier>,
    /// Intersection of the authorities-constrained policies with the caller's initial
    /// policy set.
    pub user_constr_policies: Vec<ObjectIdentifier>,
    /// True if an explicit policy was required at some point along the path.
    pub explicit_policy_indicator: bool,
    /// Policy mappings asserted by each certificate in the path.
    pub policy_mappings: Vec<Option<Vec<PolicyMapping>>>,
    /// The validated certification path, trust anchor first.
    pub certificate_path: Vec<Certificate>,
}
