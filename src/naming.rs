/*
* Copyright (C) 2025 Pedro Henrique / phkaiser13
*
* File: src/naming.rs
*
* Deterministic names and annotations for the ClusterRole/ClusterRoleBinding
* pair this tool manages for a policy. The prefix keeps managed objects apart
* from anything a user created by hand, and the annotation is what later
* marks a role as managed in the relationship graph.
*
* SPDX-License-Identifier: Apache-2.0
*/

use std::collections::BTreeMap;

/// Prefix of every object name generated by this tool.
pub const MANAGED_PREFIX: &str = "psp-util";

/// Annotation holding the (sanitized) name of the policy a managed object serves.
pub const ANNOTATION_KEY_POLICY_NAME: &str = "psp-util.dev/psp-name";

const FORBIDDEN: &[char] = &[':', '/', '\\', '%'];

/// Replaces every character not allowed in an RBAC object name with `.`.
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if FORBIDDEN.contains(&c) { '.' } else { c })
        .collect()
}

/// Name of the managed ClusterRole and ClusterRoleBinding for `policy_name`.
pub fn managed_name(policy_name: &str) -> String {
    format!("{}.{}", MANAGED_PREFIX, sanitize(policy_name))
}

pub fn managed_annotations(policy_name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([(ANNOTATION_KEY_POLICY_NAME.to_string(), sanitize(policy_name))])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_managed_name_is_prefixed() {
        assert_eq!(managed_name("test1"), "psp-util.test1");
        assert_eq!(managed_name("eks.privileged"), "psp-util.eks.privileged");
    }

    #[test]
    fn test_managed_name_is_deterministic() {
        for name in ["privileged", "eks:privileged", "a/b"] {
            assert_eq!(managed_name(name), managed_name(name));
        }
    }

    #[test]
    fn test_forbidden_characters_are_replaced() {
        let annotations = managed_annotations("psp-util:eks.privileged_01/");
        assert_eq!(
            annotations.get(ANNOTATION_KEY_POLICY_NAME).map(String::as_str),
            Some("psp-util.eks.privileged_01.")
        );
        assert_eq!(annotations.len(), 1);
        assert_eq!(
            managed_name("psp-util:eks.privileged_01/"),
            "psp-util.psp-util.eks.privileged_01."
        );
    }

    #[test]
    fn test_annotation_of_generated_name_keeps_it() {
        let name = managed_name("test1");
        let annotations = managed_annotations(&name);
        assert_eq!(annotations[ANNOTATION_KEY_POLICY_NAME], "psp-util.test1");
    }

    #[test]
    fn test_distinct_fixture_names_do_not_collide() {
        let fixtures = ["privileged", "privileged:", "eks:privileged", "restricted/v2", "restricted"];
        let mut names: Vec<String> = fixtures.iter().map(|n| managed_name(n)).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), fixtures.len());
    }
}
