//! Certificate policy and name constraint processing over a validated path.
//!
//! Processing follows the model of [RFC 5280 Section 6.1](https://datatracker.ietf.org/doc/html/rfc5280#section-6.1):
//! a walk from the trust anchor's child toward the end entity maintains a policy table
//! (policy OID by path position), the explicit-policy, policy-mapping-inhibit and
//! inhibit-anyPolicy indicators with their pending skip-certificate counters, and the
//! accumulated permitted and excluded subtree sets. The `anyPolicy` OID occupies the first
//! table row, seeded as asserted everywhere and selectively cleared as certificates state
//! explicit policy lists or inhibit-anyPolicy takes effect.

use const_oid::db::rfc5280::ANY_POLICY;
use der::asn1::ObjectIdentifier;
use log::debug;

use crate::certificate::{
    Certificate, ExtensionValue, GeneralName, GeneralSubtree, Name, PolicyInformation,
    PolicyMapping, PKCS9_EMAIL_ADDRESS, RFC1274_MAILBOX,
};
use crate::util::{Error, Result, ValidationStatus};
use crate::validator::name_match::{
    compare_directory_name, compare_dns_name, compare_ip_address, compare_rfc822_name,
    compare_uri,
};
use crate::validator::path_results::PolicyVerificationResult;
use crate::validator::path_settings::ValidationSettings;

struct PendingCounter {
    active: bool,
    value: u32,
}

impl PendingCounter {
    fn new() -> Self {
        PendingCounter {
            active: false,
            value: 0,
        }
    }

    /// Arms the counter, taking the minimum when several certificates set one.
    fn set(&mut self, value: u32) {
        if !self.active {
            self.active = true;
            self.value = value;
        } else {
            self.value = self.value.min(value);
        }
    }

    /// Counts down one certificate; returns true when the counter fires.
    fn decrement(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.value -= 1;
        if self.value == 0 {
            self.active = false;
            return true;
        }
        false
    }
}

/// `process_policies_and_constraints` evaluates certificate policies and name constraints
/// over `path`, ordered trust anchor first. On success the resolved policy sets and the
/// path are returned; rejections surface as [`Error::PathValidation`] values carrying
/// [`ValidationStatus::NullPolicyIntersection`], [`ValidationStatus::PolicyMappingInhibited`],
/// [`ValidationStatus::AnyPolicyInPolicyMapping`], [`ValidationStatus::RequiredNameFormAbsent`],
/// [`ValidationStatus::PermittedSubtreeViolation`] or [`ValidationStatus::ExcludedSubtreeViolation`].
pub fn process_policies_and_constraints(
    path: &[Certificate],
    settings: &ValidationSettings,
) -> Result<PolicyVerificationResult> {
    if path.len() < 2 {
        return Err(Error::PathValidation(ValidationStatus::PathTooShort));
    }

    // Position 0 below is the end entity and the last position is the trust anchor, the
    // direction the per-position table columns are laid out in.
    let certs: Vec<&Certificate> = path.iter().rev().collect();
    let n = certs.len();

    let mut explicit_policy_indicator = settings.initial_explicit_policy;
    let mut policy_mapping_inhibit_indicator = settings.initial_policy_mapping_inhibit;
    let mut inhibit_any_policy_indicator = settings.initial_inhibit_any_policy;

    let mut explicit_policy_pending = PendingCounter::new();
    let mut policy_mapping_inhibit_pending = PendingCounter::new();
    let mut inhibit_any_policy_pending = PendingCounter::new();

    // Row 0 is anyPolicy, asserted everywhere until cleared. Columns cover every position
    // except the trust anchor.
    let mut all_policies: Vec<ObjectIdentifier> = vec![ANY_POLICY];
    let mut policy_table: Vec<Vec<bool>> = vec![vec![true; n - 1]];

    let mut policy_mappings: Vec<Option<Vec<PolicyMapping>>> = vec![None; n - 1];
    let mut cert_policies: Vec<Option<Vec<PolicyInformation>>> = vec![None; n - 1];

    let mut explicit_policy_start: Option<usize> = if explicit_policy_indicator {
        Some(n - 1)
    } else {
        None
    };

    // Gather policy information walking from the trust anchor's child toward the end entity.
    for i in (0..n - 1).rev() {
        for ext in &certs[i].extensions {
            match &ext.value {
                Some(ExtensionValue::CertificatePolicies(policies)) => {
                    cert_policies[i] = Some(policies.clone());

                    // an explicit policy list supersedes the anyPolicy assertion here
                    policy_table[0][i] = false;

                    for policy in policies {
                        match all_policies
                            .iter()
                            .position(|known| *known == policy.policy_identifier)
                        {
                            Some(row) => policy_table[row][i] = true,
                            None => {
                                all_policies.push(policy.policy_identifier);
                                let mut row = vec![false; n - 1];
                                row[i] = true;
                                policy_table.push(row);
                            }
                        }
                    }
                }
                Some(ExtensionValue::PolicyMappings(mappings)) => {
                    if policy_mapping_inhibit_indicator {
                        return Err(Error::PathValidation(
                            ValidationStatus::PolicyMappingInhibited,
                        ));
                    }
                    policy_mappings[i] = Some(mappings.clone());
                }
                Some(ExtensionValue::PolicyConstraints {
                    require_explicit_policy,
                    inhibit_policy_mapping,
                }) => {
                    if !explicit_policy_indicator {
                        if let Some(skip_certs) = require_explicit_policy {
                            if *skip_certs == 0 {
                                explicit_policy_indicator = true;
                                explicit_policy_start = Some(i);
                            } else {
                                explicit_policy_pending.set(*skip_certs);
                            }
                        }
                        if let Some(skip_certs) = inhibit_policy_mapping {
                            if *skip_certs == 0 {
                                policy_mapping_inhibit_indicator = true;
                            } else {
                                // the issuing certificate itself is exempt from its own
                                // mapping inhibition
                                policy_mapping_inhibit_pending.set(*skip_certs + 1);
                            }
                        }
                    }
                }
                Some(ExtensionValue::InhibitAnyPolicy(skip_certs)) => {
                    if !inhibit_any_policy_indicator {
                        if *skip_certs == 0 {
                            inhibit_any_policy_indicator = true;
                        } else {
                            inhibit_any_policy_pending.set(*skip_certs);
                        }
                    }
                }
                _ => {}
            }
        }

        if inhibit_any_policy_indicator {
            policy_table[0][i] = false;
        }

        if !explicit_policy_indicator && explicit_policy_pending.decrement() {
            explicit_policy_indicator = true;
            explicit_policy_start = Some(i);
        }
        if !policy_mapping_inhibit_indicator && policy_mapping_inhibit_pending.decrement() {
            policy_mapping_inhibit_indicator = true;
        }
        if !inhibit_any_policy_indicator && inhibit_any_policy_pending.decrement() {
            inhibit_any_policy_indicator = true;
        }
    }

    // Apply policy mappings: a mapping carried by the certificate above position i
    // rewrites assertions of the subject-domain policy at position i and below into the
    // issuer-domain policy.
    for i in 0..n - 1 {
        if i + 2 >= n {
            continue;
        }
        let mappings = match &policy_mappings[i + 1] {
            Some(mappings) => mappings.clone(),
            None => continue,
        };
        for mapping in &mappings {
            if mapping.issuer_domain_policy == ANY_POLICY
                || mapping.subject_domain_policy == ANY_POLICY
            {
                return Err(Error::PathValidation(
                    ValidationStatus::AnyPolicyInPolicyMapping,
                ));
            }

            let issuer_row = all_policies
                .iter()
                .position(|known| *known == mapping.issuer_domain_policy);
            let subject_row = all_policies
                .iter()
                .position(|known| *known == mapping.subject_domain_policy);

            // the issuer-domain policy is expressed through the mapping at this level
            if let Some(row) = issuer_row {
                policy_table[row][i] = false;
            }

            let asserts_subject_policy = cert_policies[i]
                .as_deref()
                .unwrap_or(&[])
                .iter()
                .any(|policy| policy.policy_identifier == mapping.subject_domain_policy);
            if asserts_subject_policy {
                if let (Some(issuer_row), Some(subject_row)) = (issuer_row, subject_row) {
                    for position in 0..=i {
                        if policy_table[subject_row][position] {
                            policy_table[issuer_row][position] = true;
                            policy_table[subject_row][position] = false;
                        }
                    }
                }
            }
        }
    }

    // Below the explicit-policy start, anyPolicy no longer stands in for a real policy.
    if let Some(start) = explicit_policy_start {
        for position in 0..start {
            policy_table[0][position] = false;
        }
    }

    let mut auth_constr_policies: Vec<ObjectIdentifier> = Vec::new();
    for row in 0..policy_table.len() {
        let mut found = true;
        for position in 0..n - 1 {
            let before_start = explicit_policy_start.map_or(false, |start| position < start);
            let at_or_after_start = explicit_policy_start.map_or(true, |start| position >= start);

            if before_start && all_policies[row] == ANY_POLICY && all_policies.len() > 1 {
                found = false;
                break;
            }

            if !policy_table[row][position] {
                let any_policy_covers = at_or_after_start && policy_table[0][position];
                if !any_policy_covers {
                    found = false;
                    break;
                }
            }
        }
        if found {
            auth_constr_policies.push(all_policies[row]);
        }
    }

    let user_constr_policies: Vec<ObjectIdentifier> = if settings.initial_policy_set.len() == 1
        && settings.initial_policy_set[0] == ANY_POLICY
        && !explicit_policy_indicator
    {
        settings.initial_policy_set.clone()
    } else if auth_constr_policies.len() == 1 && auth_constr_policies[0] == ANY_POLICY {
        settings.initial_policy_set.clone()
    } else {
        auth_constr_policies
            .iter()
            .filter(|policy| {
                settings
                    .initial_policy_set
                    .iter()
                    .any(|initial| initial == *policy || *initial == ANY_POLICY)
            })
            .copied()
            .collect()
    };

    if user_constr_policies.is_empty() {
        debug!("No intersection between initial and authorities-constrained policy sets");
        return Err(Error::PathValidation(
            ValidationStatus::NullPolicyIntersection,
        ));
    }

    // Name constraints: each certificate is checked against the subtrees accumulated from
    // the certificates above it, then contributes its own.
    let mut permitted_subtrees = settings.initial_permitted_subtrees.clone();
    let mut excluded_subtrees = settings.initial_excluded_subtrees.clone();

    for i in (0..n - 1).rev() {
        let cert = certs[i];
        let subject_alt_names = cert.subject_alt_names();

        let mut cert_permitted: Vec<GeneralSubtree> = Vec::new();
        let mut cert_excluded: Vec<GeneralSubtree> = Vec::new();
        for ext in &cert.extensions {
            if let Some(ExtensionValue::NameConstraints {
                permitted_subtrees: permitted,
                excluded_subtrees: excluded,
            }) = &ext.value
            {
                cert_permitted.extend_from_slice(permitted);
                cert_excluded.extend_from_slice(excluded);
            }
        }

        check_required_name_forms(cert, &settings.initial_required_name_forms)?;
        check_permitted_subtrees(cert, &subject_alt_names, &permitted_subtrees)?;
        check_excluded_subtrees(cert, &subject_alt_names, &excluded_subtrees)?;

        permitted_subtrees.append(&mut cert_permitted);
        excluded_subtrees.append(&mut cert_excluded);
    }

    // Reorder mappings to parallel the anchor-first path, adding the anchor's empty slot.
    policy_mappings.push(None);
    policy_mappings.reverse();

    Ok(PolicyVerificationResult {
        auth_constr_policies,
        user_constr_policies,
        explicit_policy_indicator,
        policy_mappings,
        certificate_path: path.to_vec(),
    })
}

/// A certificate subject must structurally match one of the required directoryName forms
/// in attribute-type sequence. Non-directoryName entries are ignored.
fn check_required_name_forms(
    certificate: &Certificate,
    required_name_forms: &[GeneralSubtree],
) -> Result<()> {
    if required_name_forms.is_empty() {
        return Ok(());
    }
    for form in required_name_forms {
        if let GeneralName::DirectoryName(constraint) = &form.base {
            if constraint.rdn_sequence.len() != certificate.subject.rdn_sequence.len() {
                continue;
            }
            let matches = certificate
                .subject
                .rdn_sequence
                .iter()
                .zip(&constraint.rdn_sequence)
                .all(|(subject_attr, constraint_attr)| {
                    subject_attr.attr_type == constraint_attr.attr_type
                });
            if matches {
                return Ok(());
            }
        }
    }
    Err(Error::PathValidation(
        ValidationStatus::RequiredNameFormAbsent,
    ))
}

fn subject_email_attributes(subject: &Name) -> Vec<&str> {
    subject
        .rdn_sequence
        .iter()
        .filter(|attr| {
            attr.attr_type == PKCS9_EMAIL_ADDRESS || attr.attr_type == RFC1274_MAILBOX
        })
        .map(|attr| attr.value.as_str())
        .collect()
}

/// For each of the five name forms: if any permitted subtree constrains that form and the
/// certificate carries a name of that form, at least one subtree must match it.
fn check_permitted_subtrees(
    certificate: &Certificate,
    subject_alt_names: &[&GeneralName],
    permitted_subtrees: &[GeneralSubtree],
) -> Result<()> {
    let groups: [fn(&GeneralName) -> bool; 5] = [
        |base| matches!(base, GeneralName::Rfc822Name(_)),
        |base| matches!(base, GeneralName::DnsName(_)),
        |base| matches!(base, GeneralName::DirectoryName(_)),
        |base| matches!(base, GeneralName::UniformResourceIdentifier(_)),
        |base| matches!(base, GeneralName::IpAddress(_)),
    ];

    for group_filter in groups {
        let group: Vec<&GeneralSubtree> = permitted_subtrees
            .iter()
            .filter(|subtree| group_filter(&subtree.base))
            .collect();

        let mut group_permitted = false;
        let mut value_exists = false;

        for subtree in &group {
            match &subtree.base {
                GeneralName::Rfc822Name(constraint) => {
                    if !subject_alt_names.is_empty() {
                        for name in subject_alt_names {
                            if let GeneralName::Rfc822Name(value) = name {
                                value_exists = true;
                                group_permitted =
                                    group_permitted || compare_rfc822_name(value, constraint);
                            }
                        }
                    } else {
                        for value in subject_email_attributes(&certificate.subject) {
                            value_exists = true;
                            group_permitted =
                                group_permitted || compare_rfc822_name(value, constraint);
                        }
                    }
                }
                GeneralName::DnsName(constraint) => {
                    for name in subject_alt_names {
                        if let GeneralName::DnsName(value) = name {
                            value_exists = true;
                            group_permitted = group_permitted || compare_dns_name(value, constraint);
                        }
                    }
                }
                GeneralName::DirectoryName(constraint) => {
                    value_exists = true;
                    group_permitted =
                        group_permitted || compare_directory_name(&certificate.subject, constraint);
                }
                GeneralName::UniformResourceIdentifier(constraint) => {
                    for name in subject_alt_names {
                        if let GeneralName::UniformResourceIdentifier(value) = name {
                            value_exists = true;
                            group_permitted = group_permitted || compare_uri(value, constraint);
                        }
                    }
                }
                GeneralName::IpAddress(constraint) => {
                    for name in subject_alt_names {
                        if let GeneralName::IpAddress(value) = name {
                            value_exists = true;
                            group_permitted =
                                group_permitted || compare_ip_address(value, constraint);
                        }
                    }
                }
            }

            if group_permitted {
                break;
            }
        }

        if !group_permitted && !group.is_empty() && value_exists {
            return Err(Error::PathValidation(
                ValidationStatus::PermittedSubtreeViolation,
            ));
        }
    }

    Ok(())
}

/// A certificate name falling inside any excluded subtree is fatal.
fn check_excluded_subtrees(
    certificate: &Certificate,
    subject_alt_names: &[&GeneralName],
    excluded_subtrees: &[GeneralSubtree],
) -> Result<()> {
    for subtree in excluded_subtrees {
        let excluded = match &subtree.base {
            GeneralName::Rfc822Name(constraint) => {
                if !subject_alt_names.is_empty() {
                    subject_alt_names.iter().any(|name| match name {
                        GeneralName::Rfc822Name(value) => compare_rfc822_name(value, constraint),
                        _ => false,
                    })
                } else {
                    subject_email_attributes(&certificate.subject)
                        .iter()
                        .any(|value| compare_rfc822_name(value, constraint))
                }
            }
            GeneralName::DnsName(constraint) => subject_alt_names.iter().any(|name| match name {
                GeneralName::DnsName(value) => compare_dns_name(value, constraint),
                _ => false,
            }),
            GeneralName::DirectoryName(constraint) => {
                compare_directory_name(&certificate.subject, constraint)
            }
            GeneralName::UniformResourceIdentifier(constraint) => {
                subject_alt_names.iter().any(|name| match name {
                    GeneralName::UniformResourceIdentifier(value) => {
                        compare_uri(value, constraint)
                    }
                    _ => false,
                })
            }
            GeneralName::IpAddress(constraint) => subject_alt_names.iter().any(|name| match name {
                GeneralName::IpAddress(value) => compare_ip_address(value, constraint),
                _ => false,
            }),
        };

        if excluded {
            return Err(Error::PathValidation(
                ValidationStatus::ExcludedSubtreeViolation,
            ));
        }
    }

    Ok(())
}
