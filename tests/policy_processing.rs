//! Certificate policy table, policy mapping and indicator processing.

mod common;

use chainval::*;
use common::*;

const ANY_POLICY: &str = "2.5.29.32.0";

fn settings_with_policies(policies: &[&str]) -> ValidationSettings {
    ValidationSettings {
        initial_policy_set: policies.iter().map(|value| oid(value)).collect(),
        ..Default::default()
    }
}

#[test]
fn no_asserted_policies_yield_any_policy() {
    let (root, intermediate, end_entity) = simple_chain();
    let path = vec![root, intermediate, end_entity];

    let result =
        process_policies_and_constraints(&path, &settings_with_policies(&["1.2.3"])).unwrap();
    assert_eq!(result.auth_constr_policies, vec![oid(ANY_POLICY)]);
    // anyPolicy from the authorities leaves the caller's set untouched
    assert_eq!(result.user_constr_policies, vec![oid("1.2.3")]);
    assert!(!result.explicit_policy_indicator);
    assert_eq!(result.policy_mappings, vec![None, None, None]);
}

#[test]
fn rejects_disjoint_policy_sets() {
    let root = CertBuilder::new("Root CA", "Root CA", 1).ca().build();
    let intermediate = CertBuilder::new("Intermediate CA", "Root CA", 2)
        .ca()
        .policies(&["1.2.3"])
        .build();
    let end_entity = CertBuilder::new("End Entity", "Intermediate CA", 3)
        .policies(&["1.2.3"])
        .build();
    let path = vec![root, intermediate, end_entity];

    expect_code(
        process_policies_and_constraints(&path, &settings_with_policies(&["1.5.6.7"])),
        96,
    );
}

#[test]
fn repeated_require_explicit_policy_takes_the_minimum() {
    let root = CertBuilder::new("Root CA", "Root CA", 1).ca().build();
    let inner = |constraint: Option<u32>| {
        let mut builder = CertBuilder::new("Inner CA", "Outer CA", 3).ca();
        if let Some(skip_certs) = constraint {
            builder = builder.policy_constraints(Some(skip_certs), None);
        }
        builder.build()
    };
    let end_entity = CertBuilder::new("End Entity", "Inner CA", 4).build();

    // skipCerts 3 alone never reaches past the end entity position
    let outer = CertBuilder::new("Outer CA", "Root CA", 2)
        .ca()
        .policy_constraints(Some(3), None)
        .build();
    let path = vec![root.clone(), outer.clone(), inner(None), end_entity.clone()];
    let result =
        process_policies_and_constraints(&path, &ValidationSettings::default()).unwrap();
    assert!(result.explicit_policy_indicator);
    assert_eq!(result.user_constr_policies, vec![oid(ANY_POLICY)]);

    // a second constraint with skipCerts 1 lowers the pending count, arming the
    // indicator above the bare end entity
    let path = vec![root, outer, inner(Some(1)), end_entity];
    expect_code(
        process_policies_and_constraints(&path, &ValidationSettings::default()),
        96,
    );
}

#[test]
fn intersects_asserted_policies_with_initial_set() {
    let root = CertBuilder::new("Root CA", "Root CA", 1).ca().build();
    let intermediate = CertBuilder::new("Intermediate CA", "Root CA", 2)
        .ca()
        .policies(&["1.2.3", "1.2.4"])
        .build();
    let end_entity = CertBuilder::new("End Entity", "Intermediate CA", 3)
        .policies(&["1.2.3", "1.2.4"])
        .build();
    let path = vec![root, intermediate, end_entity];

    let result =
        process_policies_and_constraints(&path, &settings_with_policies(&["1.2.3"])).unwrap();
    assert_eq!(
        result.auth_constr_policies,
        vec![oid("1.2.3"), oid("1.2.4")]
    );
    assert_eq!(result.user_constr_policies, vec![oid("1.2.3")]);
}

#[test]
fn initial_explicit_policy_disables_any_policy_shortcut() {
    let root = CertBuilder::new("Root CA", "Root CA", 1).ca().build();
    let intermediate = CertBuilder::new("Intermediate CA", "Root CA", 2)
        .ca()
        .policies(&["1.2.3"])
        .build();
    let end_entity = CertBuilder::new("End Entity", "Intermediate CA", 3)
        .policies(&["1.2.3"])
        .build();
    let path = vec![root, intermediate, end_entity];

    let settings = ValidationSettings {
        initial_explicit_policy: true,
        ..Default::default()
    };
    let result = process_policies_and_constraints(&path, &settings).unwrap();
    assert!(result.explicit_policy_indicator);
    assert_eq!(result.auth_constr_policies, vec![oid("1.2.3")]);
    assert_eq!(result.user_constr_policies, vec![oid("1.2.3")]);
}

#[test]
fn policy_mapping_carries_assertions_downward() {
    let root = CertBuilder::new("Root CA", "Root CA", 1).ca().build();
    let intermediate = CertBuilder::new("Intermediate CA", "Root CA", 2)
        .ca()
        .policies(&["1.2.3"])
        .mappings(&[("1.2.3", "1.2.4")])
        .build();
    let end_entity = CertBuilder::new("End Entity", "Intermediate CA", 3)
        .policies(&["1.2.4"])
        .build();
    let path = vec![root, intermediate, end_entity];

    let result =
        process_policies_and_constraints(&path, &settings_with_policies(&["1.2.3"])).unwrap();
    assert_eq!(result.auth_constr_policies, vec![oid("1.2.3")]);
    assert_eq!(result.user_constr_policies, vec![oid("1.2.3")]);

    // anchor-first, the anchor never maps
    assert_eq!(result.policy_mappings.len(), 3);
    assert_eq!(result.policy_mappings[0], None);
    assert_eq!(
        result.policy_mappings[1],
        Some(vec![PolicyMapping {
            issuer_domain_policy: oid("1.2.3"),
            subject_domain_policy: oid("1.2.4"),
        }])
    );
    assert_eq!(result.policy_mappings[2], None);
}

#[test]
fn rejects_mappings_when_initially_inhibited() {
    let root = CertBuilder::new("Root CA", "Root CA", 1).ca().build();
    let intermediate = CertBuilder::new("Intermediate CA", "Root CA", 2)
        .ca()
        .mappings(&[("1.2.3", "1.2.4")])
        .build();
    let end_entity = CertBuilder::new("End Entity", "Intermediate CA", 3).build();
    let path = vec![root, intermediate, end_entity];

    let settings = ValidationSettings {
        initial_policy_mapping_inhibit: true,
        ..Default::default()
    };
    expect_code(process_policies_and_constraints(&path, &settings), 98);
}

#[test]
fn rejects_any_policy_inside_a_mapping() {
    let root = CertBuilder::new("Root CA", "Root CA", 1).ca().build();
    let intermediate = CertBuilder::new("Intermediate CA", "Root CA", 2)
        .ca()
        .mappings(&[(ANY_POLICY, "1.2.4")])
        .build();
    let end_entity = CertBuilder::new("End Entity", "Intermediate CA", 3).build();
    let path = vec![root, intermediate, end_entity];

    expect_code(
        process_policies_and_constraints(&path, &ValidationSettings::default()),
        99,
    );
}

#[test]
fn initial_inhibit_any_policy_clears_the_any_policy_row() {
    let (root, intermediate, end_entity) = simple_chain();
    let path = vec![root, intermediate, end_entity];

    let settings = ValidationSettings {
        initial_policy_set: vec![oid("1.2.3")],
        initial_inhibit_any_policy: true,
        ..Default::default()
    };
    // no certificate asserts any policy, so nothing survives the cleared anyPolicy row
    expect_code(process_policies_and_constraints(&path, &settings), 96);
}

#[test]
fn inhibit_any_policy_spares_the_asserting_certificate() {
    let root = CertBuilder::new("Root CA", "Root CA", 1).ca().build();
    let intermediate = CertBuilder::new("Intermediate CA", "Root CA", 2)
        .ca()
        .inhibit_any_policy(1)
        .build();
    let end_entity = CertBuilder::new("End Entity", "Intermediate CA", 3)
        .policies(&["1.2.3"])
        .build();
    let path = vec![root, intermediate, end_entity];

    // the intermediate keeps its own anyPolicy assertion; only the end entity's column is
    // cleared, and it asserts a real policy there
    let result =
        process_policies_and_constraints(&path, &ValidationSettings::default()).unwrap();
    assert_eq!(result.auth_constr_policies, vec![oid("1.2.3")]);
    assert_eq!(result.user_constr_policies, vec![oid(ANY_POLICY)]);
}

#[test]
fn require_explicit_policy_counts_down_certificates() {
    let root = CertBuilder::new("Root CA", "Root CA", 1).ca().build();
    let end_entity = CertBuilder::new("End Entity", "Intermediate CA", 3).build();

    // skipCerts 1 arms the indicator at the intermediate itself, so the bare end entity
    // below it leaves no acceptable policies
    let strict = CertBuilder::new("Intermediate CA", "Root CA", 2)
        .ca()
        .policy_constraints(Some(1), None)
        .build();
    let path = vec![root.clone(), strict, end_entity.clone()];
    expect_code(
        process_policies_and_constraints(&path, &ValidationSettings::default()),
        96,
    );

    // skipCerts 2 only reaches the end entity position
    let lenient = CertBuilder::new("Intermediate CA", "Root CA", 2)
        .ca()
        .policy_constraints(Some(2), None)
        .build();
    let path = vec![root, lenient, end_entity];
    let result =
        process_policies_and_constraints(&path, &ValidationSettings::default()).unwrap();
    assert!(result.explicit_policy_indicator);
    assert_eq!(result.user_constr_policies, vec![oid(ANY_POLICY)]);
}

#[test]
fn inhibit_policy_mapping_exempts_the_constrained_certificate() {
    let root = CertBuilder::new("Root CA", "Root CA", 1).ca().build();
    let end_entity = CertBuilder::new("End Entity", "Inner CA", 4)
        .policies(&["1.2.4"])
        .build();

    let mapping_ca = |constrainer: &str| {
        CertBuilder::new("Inner CA", constrainer, 3)
            .ca()
            .policies(&["1.2.3"])
            .mappings(&[("1.2.3", "1.2.4")])
            .build()
    };

    // skipCerts 0 takes effect immediately, so the mapping below is rejected
    let immediate = CertBuilder::new("Outer CA", "Root CA", 2)
        .ca()
        .policy_constraints(None, Some(0))
        .build();
    let path = vec![
        root.clone(),
        immediate,
        mapping_ca("Outer CA"),
        end_entity.clone(),
    ];
    expect_code(
        process_policies_and_constraints(&path, &ValidationSettings::default()),
        98,
    );

    // skipCerts 1 exempts the certificate carrying the mapping and inhibits below it
    let deferred = CertBuilder::new("Outer CA", "Root CA", 2)
        .ca()
        .policy_constraints(None, Some(1))
        .build();
    let path = vec![root, deferred, mapping_ca("Outer CA"), end_entity];
    let result =
        process_policies_and_constraints(&path, &settings_with_policies(&["1.2.3"])).unwrap();
    assert_eq!(result.user_constr_policies, vec![oid("1.2.3")]);
}

#[test]
fn rejects_too_short_path() {
    let root = CertBuilder::new("Root CA", "Root CA", 1).ca().build();
    expect_code(
        process_policies_and_constraints(&[root], &ValidationSettings::default()),
        9,
    );
}
