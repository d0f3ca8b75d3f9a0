/*
* Copyright (C) 2025 Pedro Henrique / phkaiser13
*
* File: src/graph.rs
*
* Builds the relationship forest PSP -> (Cluster)Role -> (Cluster)RoleBinding
* from the flat object lists returned by the API server.
*
* Architecture:
* - The graph only borrows the fetched objects; it is rebuilt per query.
* - A role granting several policies yields one node under each of them,
*   and every such node receives all bindings that reference the role.
* - Nodes keep discovery order: policies in list order, roles in role-list
*   order, bindings in binding-list order.
* - Unresolvable references are dropped silently; a binding to a deleted
*   role is valid cluster state.
*
* SPDX-License-Identifier: Apache-2.0
*/

use crate::bindings::{BindingIndex, Bindings, RoleKey};
use crate::client::{ClusterApi, Policy};
use crate::error::Result;
use crate::naming::ANNOTATION_KEY_POLICY_NAME;
use crate::rules::extract_policy_names;
use k8s_openapi::api::rbac::v1::{ClusterRole, ClusterRoleBinding, Role, RoleBinding};
use kube::ResourceExt;
use std::collections::HashMap;
use tracing::debug;

/// Everything the graph is built from, fetched in one pass.
#[derive(Debug, Default, Clone)]
pub struct ClusterSnapshot {
    pub policies: Vec<Policy>,
    pub cluster_roles: Vec<ClusterRole>,
    pub roles: Vec<Role>,
    pub bindings: Bindings,
}

impl ClusterSnapshot {
    /// Lists policies, ClusterRoles, Roles, then both binding scopes, one
    /// request after another.
    pub async fn fetch(api: &dyn ClusterApi) -> Result<Self> {
        let policies = api.list_policies().await?;
        let cluster_roles = api.list_cluster_roles().await?;
        let roles = api.list_roles().await?;
        let bindings = Bindings::fetch(api).await?;
        debug!(
            "Fetched {} PodSecurityPolicy(s), {} ClusterRole(s), {} Role(s)",
            policies.len(),
            cluster_roles.len(),
            roles.len()
        );
        Ok(ClusterSnapshot {
            policies,
            cluster_roles,
            roles,
            bindings,
        })
    }

    pub fn graph(&self) -> RelationshipGraph<'_> {
        RelationshipGraph::build(
            &self.policies,
            &self.cluster_roles,
            &self.roles,
            &self.bindings.cluster_role_bindings,
            &self.bindings.role_bindings,
        )
    }
}

#[derive(Debug)]
pub struct RelationshipGraph<'a> {
    pub policies: Vec<PolicyNode<'a>>,
}

#[derive(Debug)]
pub struct PolicyNode<'a> {
    pub policy: &'a Policy,
    pub cluster_roles: Vec<ClusterRoleNode<'a>>,
    pub roles: Vec<RoleNode<'a>>,
}

/// A ClusterRole can be bound cluster-wide or inside a namespace.
#[derive(Debug)]
pub struct ClusterRoleNode<'a> {
    pub role: &'a ClusterRole,
    pub cluster_role_bindings: Vec<&'a ClusterRoleBinding>,
    pub role_bindings: Vec<&'a RoleBinding>,
}

#[derive(Debug)]
pub struct RoleNode<'a> {
    pub role: &'a Role,
    pub role_bindings: Vec<&'a RoleBinding>,
}

fn is_managed<K: ResourceExt>(obj: &K) -> bool {
    obj.annotations().contains_key(ANNOTATION_KEY_POLICY_NAME)
}

impl PolicyNode<'_> {
    pub fn name(&self) -> String {
        self.policy.name_any()
    }

    pub fn has_roles(&self) -> bool {
        !self.cluster_roles.is_empty() || !self.roles.is_empty()
    }
}

impl ClusterRoleNode<'_> {
    pub fn name(&self) -> String {
        self.role.name_any()
    }

    /// Whether this tool created the role.
    pub fn is_managed(&self) -> bool {
        is_managed(self.role)
    }

    pub fn has_bindings(&self) -> bool {
        !self.cluster_role_bindings.is_empty() || !self.role_bindings.is_empty()
    }
}

impl RoleNode<'_> {
    pub fn name(&self) -> String {
        self.role.name_any()
    }

    pub fn namespace(&self) -> String {
        self.role.namespace().unwrap_or_default()
    }

    /// Whether this tool created the role.
    pub fn is_managed(&self) -> bool {
        is_managed(self.role)
    }
}

impl<'a> RelationshipGraph<'a> {
    pub fn build(
        policies: &'a [Policy],
        cluster_roles: &'a [ClusterRole],
        roles: &'a [Role],
        cluster_role_bindings: &'a [ClusterRoleBinding],
        role_bindings: &'a [RoleBinding],
    ) -> Self {
        let mut nodes: Vec<PolicyNode<'a>> = policies
            .iter()
            .map(|policy| PolicyNode {
                policy,
                cluster_roles: Vec::new(),
                roles: Vec::new(),
            })
            .collect();

        let mut by_name: HashMap<String, usize> = HashMap::new();
        for (i, node) in nodes.iter().enumerate() {
            by_name.entry(node.name()).or_insert(i);
        }

        let index = BindingIndex::build(cluster_role_bindings, role_bindings);

        for role in cluster_roles {
            for policy_name in extract_policy_names(role) {
                let Some(&i) = by_name.get(policy_name) else {
                    continue;
                };
                let key = RoleKey::cluster_role(role.name_any());
                nodes[i].cluster_roles.push(ClusterRoleNode {
                    role,
                    cluster_role_bindings: index.cluster_role_bindings_for(&key).to_vec(),
                    role_bindings: index.role_bindings_for(&key).to_vec(),
                });
            }
        }

        for role in roles {
            for policy_name in extract_policy_names(role) {
                let Some(&i) = by_name.get(policy_name) else {
                    continue;
                };
                let key = RoleKey::role(role.namespace().unwrap_or_default(), role.name_any());
                nodes[i].roles.push(RoleNode {
                    role,
                    role_bindings: index.role_bindings_for(&key).to_vec(),
                });
            }
        }

        RelationshipGraph { policies: nodes }
    }

    pub fn policy(&self, name: &str) -> Option<&PolicyNode<'a>> {
        self.policies.iter().find(|p| p.name() == name)
    }
}
