//! Name comparison routines supporting name chaining and name constraint enforcement.
//!
//! Five name forms are supported: directory names, DNS names, rfc822 (email) names,
//! uniform resource identifiers and IP addresses. String-valued forms are normalized via
//! [`string_prep`] before comparison, so differences in case and insignificant whitespace
//! do not affect results.

use crate::certificate::Name;

/// `string_prep` normalizes a string for comparison: leading and trailing whitespace is
/// removed, internal whitespace runs collapse to a single space, and the result is
/// lowercased.
pub fn string_prep(value: &str) -> String {
    let mut prepared = String::with_capacity(value.len());
    let mut pending_space = false;
    for ch in value.trim().chars() {
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            prepared.push(' ');
            pending_space = false;
        }
        for lower in ch.to_lowercase() {
            prepared.push(lower);
        }
    }
    prepared
}

/// `compare_names` returns true if two names are equal after normalization: same attribute
/// count, and at each position the same attribute type with [`string_prep`]-equal values.
pub fn compare_names(left: &Name, right: &Name) -> bool {
    left.rdn_sequence.len() == right.rdn_sequence.len()
        && left
            .rdn_sequence
            .iter()
            .zip(&right.rdn_sequence)
            .all(|(l, r)| {
                l.attr_type == r.attr_type && string_prep(&l.value) == string_prep(&r.value)
            })
}

/// `compare_dns_name` returns true if `name` falls within the DNS subtree rooted at
/// `constraint`. Matching is suffix-based on dot-separated labels; a constraint whose
/// leading label is empty (e.g., `.example.com`) matches any prefix, otherwise the name
/// must carry at least as many labels as the constraint and agree on the trailing ones.
pub fn compare_dns_name(name: &str, constraint: &str) -> bool {
    let name_prepared = string_prep(name);
    let constraint_prepared = string_prep(constraint);

    let name_labels: Vec<&str> = name_prepared.split('.').collect();
    let constraint_labels: Vec<&str> = constraint_prepared.split('.').collect();

    if name_labels.len() < constraint_labels.len() {
        return false;
    }
    if name_labels.iter().any(|label| label.is_empty()) {
        return false;
    }
    for (i, label) in constraint_labels.iter().enumerate() {
        if label.is_empty() {
            // an empty leading label acts as a wildcard; empty labels elsewhere are malformed
            if i == 0 && constraint_labels.len() > 1 {
                continue;
            }
            return false;
        }
    }

    for i in 0..constraint_labels.len() {
        let constraint_label = constraint_labels[constraint_labels.len() - 1 - i];
        if constraint_label.is_empty() {
            continue;
        }
        if name_labels[name_labels.len() - 1 - i] != constraint_label {
            return false;
        }
    }
    true
}

/// `compare_rfc822_name` returns true if the email address `name` satisfies `constraint`.
/// A constraint without a local part (no `@`) constrains the domain: the name's domain
/// must match it via DNS rules, exactly label-for-label unless the constraint's leading
/// label is empty. A constraint with a local part requires full normalized equality.
pub fn compare_rfc822_name(name: &str, constraint: &str) -> bool {
    let name_prepared = string_prep(name);
    let constraint_prepared = string_prep(constraint);

    let name_parts: Vec<&str> = name_prepared.split('@').collect();
    let constraint_parts: Vec<&str> = constraint_prepared.split('@').collect();

    if name_parts.len() < constraint_parts.len() {
        return false;
    }

    if constraint_parts.len() == 1 {
        if name_parts.len() < 2 {
            return false;
        }
        if !compare_dns_name(name_parts[1], constraint_parts[0]) {
            return false;
        }
        let constraint_labels: Vec<&str> = constraint_parts[0].split('.').collect();
        if constraint_labels[0].is_empty() {
            return true;
        }
        return name_parts[1].split('.').count() == constraint_labels.len();
    }

    name_prepared == constraint_prepared
}

/// `compare_uri` returns true if the URI `name` satisfies `constraint`. The host portion
/// is extracted from the URI (scheme and path stripped, trailing port removed) and checked
/// against the constraint via DNS rules, exactly label-for-label unless the constraint's
/// leading label is empty. Constraints containing a `/` are malformed and match nothing.
pub fn compare_uri(name: &str, constraint: &str) -> bool {
    let mut name_prepared = string_prep(name);
    let constraint_prepared = string_prep(constraint);

    if constraint_prepared.contains('/') {
        return false;
    }

    if name_prepared.contains('/') {
        let segments: Vec<&str> = name_prepared.split('/').collect();
        if let Some(host) = segments
            .iter()
            .find(|segment| !segment.is_empty() && !segment.ends_with(':'))
        {
            name_prepared = match host.split(':').next() {
                Some(without_port) => without_port.to_string(),
                None => host.to_string(),
            };
        }
    }

    if !compare_dns_name(&name_prepared, &constraint_prepared) {
        return false;
    }
    let constraint_labels: Vec<&str> = constraint_prepared.split('.').collect();
    if constraint_labels[0].is_empty() {
        return true;
    }
    name_prepared.split('.').count() == constraint_labels.len()
}

/// `compare_ip_address` returns true if the address `name` falls within the network
/// described by `constraint`. Names are 4 (IPv4) or 16 (IPv6) bytes; constraints carry an
/// address followed by a mask of equal width. Mismatched widths match nothing.
pub fn compare_ip_address(name: &[u8], constraint: &[u8]) -> bool {
    match (name.len(), constraint.len()) {
        (4, 8) => (0..4).all(|i| (name[i] ^ constraint[i]) & constraint[i + 4] == 0),
        (16, 32) => (0..16).all(|i| (name[i] ^ constraint[i]) & constraint[i + 16] == 0),
        _ => false,
    }
}

/// `compare_directory_name` returns true if `name` falls within the directory subtree
/// rooted at `constraint`: every constraint attribute must match an attribute of the name,
/// in order and contiguously from the name's first attribute. An empty name or constraint
/// matches unconditionally.
pub fn compare_directory_name(name: &Name, constraint: &Name) -> bool {
    let name_attrs = &name.rdn_sequence;
    let constraint_attrs = &constraint.rdn_sequence;

    if name_attrs.is_empty() || constraint_attrs.is_empty() {
        return true;
    }
    if name_attrs.len() < constraint_attrs.len() {
        return false;
    }

    let mut result = true;
    let mut name_start = 0;

    for constraint_attr in constraint_attrs {
        let mut local_result = false;

        for (j, name_attr) in name_attrs.iter().enumerate().skip(name_start) {
            local_result = name_attr.attr_type == constraint_attr.attr_type
                && string_prep(&name_attr.value) == string_prep(&constraint_attr.value);

            if name_attr.attr_type == constraint_attr.attr_type {
                result = result && local_result;
            }

            if local_result {
                if name_start == 0 || name_start == j {
                    name_start = j + 1;
                    break;
                }
                // a gap between matched attributes means the structures diverge
                return false;
            }
        }

        if !local_result {
            return false;
        }
    }

    name_start != 0 && result
}
