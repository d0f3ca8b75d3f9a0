/*
* Copyright (C) 2025 Pedro Henrique / phkaiser13
*
* File: src/rules.rs
*
* Classification of roles by the PodSecurityPolicies they grant `use` of.
* A rule counts when its API groups include `policy` (or the legacy
* `extensions` group), its resources include `podsecuritypolicies` and its
* verbs include `use`; every resource name on such a rule is a policy the
* role grants.
*
* SPDX-License-Identifier: Apache-2.0
*/

use k8s_openapi::api::rbac::v1::{ClusterRole, PolicyRule, Role};
use std::collections::BTreeSet;

pub const POLICY_API_GROUP: &str = "policy";
pub const LEGACY_POLICY_API_GROUP: &str = "extensions";
pub const POLICY_RESOURCE: &str = "podsecuritypolicies";
pub const USE_VERB: &str = "use";

/// Anything carrying an ordered list of RBAC rules.
pub trait HasRules {
    fn rules(&self) -> &[PolicyRule];
}

impl HasRules for ClusterRole {
    fn rules(&self) -> &[PolicyRule] {
        self.rules.as_deref().unwrap_or_default()
    }
}

impl HasRules for Role {
    fn rules(&self) -> &[PolicyRule] {
        self.rules.as_deref().unwrap_or_default()
    }
}

fn contains(values: Option<&Vec<String>>, wanted: &str) -> bool {
    values.is_some_and(|v| v.iter().any(|s| s == wanted))
}

/// Whether a single rule grants `use` of PodSecurityPolicies.
pub fn grants_policy_use(rule: &PolicyRule) -> bool {
    let group_matches = rule.api_groups.as_ref().is_some_and(|groups| {
        groups
            .iter()
            .any(|g| g == POLICY_API_GROUP || g == LEGACY_POLICY_API_GROUP)
    });
    group_matches
        && contains(rule.resources.as_ref(), POLICY_RESOURCE)
        && rule.verbs.iter().any(|v| v == USE_VERB)
}

/// Names of every policy `role` grants `use` of. Empty when none.
pub fn extract_policy_names<R: HasRules + ?Sized>(role: &R) -> BTreeSet<&str> {
    role.rules()
        .iter()
        .filter(|rule| grants_policy_use(rule))
        .flat_map(|rule| rule.resource_names.iter().flatten())
        .map(String::as_str)
        .collect()
}

/// The single rule of a managed ClusterRole: `use` of exactly `policy_name`.
pub fn use_policy_rule(policy_name: &str) -> PolicyRule {
    PolicyRule {
        api_groups: Some(vec![POLICY_API_GROUP.to_string()]),
        resources: Some(vec![POLICY_RESOURCE.to_string()]),
        resource_names: Some(vec![policy_name.to_string()]),
        verbs: vec![USE_VERB.to_string()],
        ..Default::default()
    }
}
