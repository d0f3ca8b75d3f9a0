/*
* Copyright (C) 2025 Pedro Henrique / phkaiser13
*
* File: src/bindings.rs
*
* Fetches ClusterRoleBindings and RoleBindings and indexes them by the role
* they reference. Only references in the RBAC API group with a kind the
* binding's scope allows are indexed; anything else points at a role this
* tool cannot resolve and is left out.
*
* SPDX-License-Identifier: Apache-2.0
*/

use crate::client::ClusterApi;
use crate::error::Result;
use k8s_openapi::api::rbac::v1::{ClusterRoleBinding, RoleBinding, RoleRef};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

pub const RBAC_API_GROUP: &str = "rbac.authorization.k8s.io";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RoleKind {
    ClusterRole,
    Role,
}

impl RoleKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RoleKind::ClusterRole => "ClusterRole",
            RoleKind::Role => "Role",
        }
    }

    fn parse(kind: &str) -> Option<Self> {
        match kind {
            "ClusterRole" => Some(RoleKind::ClusterRole),
            "Role" => Some(RoleKind::Role),
            _ => None,
        }
    }
}

impl fmt::Display for RoleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a role as seen from a binding's `roleRef`.
/// `namespace` is set only for namespace-scoped roles.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RoleKey {
    pub kind: RoleKind,
    pub namespace: Option<String>,
    pub name: String,
}

impl RoleKey {
    pub fn cluster_role(name: impl Into<String>) -> Self {
        RoleKey {
            kind: RoleKind::ClusterRole,
            namespace: None,
            name: name.into(),
        }
    }

    pub fn role(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        RoleKey {
            kind: RoleKind::Role,
            namespace: Some(namespace.into()),
            name: name.into(),
        }
    }

    /// Resolves a `roleRef` found on an object living in `binding_namespace`
    /// (`None` for ClusterRoleBindings).
    pub fn from_role_ref(role_ref: &RoleRef, binding_namespace: Option<&str>) -> Option<Self> {
        if role_ref.api_group != RBAC_API_GROUP {
            return None;
        }
        match (RoleKind::parse(&role_ref.kind)?, binding_namespace) {
            (RoleKind::ClusterRole, _) => Some(RoleKey::cluster_role(&role_ref.name)),
            (RoleKind::Role, Some(ns)) => Some(RoleKey::role(ns, &role_ref.name)),
            // A ClusterRoleBinding cannot reference a namespaced Role.
            (RoleKind::Role, None) => None,
        }
    }
}

/// Every binding in the cluster, both scopes, in API list order.
#[derive(Debug, Default, Clone)]
pub struct Bindings {
    pub cluster_role_bindings: Vec<ClusterRoleBinding>,
    pub role_bindings: Vec<RoleBinding>,
}

impl Bindings {
    /// Lists both binding scopes, cluster-scoped first.
    pub async fn fetch(api: &dyn ClusterApi) -> Result<Self> {
        let cluster_role_bindings = api.list_cluster_role_bindings().await?;
        let role_bindings = api.list_role_bindings().await?;
        debug!(
            "Fetched {} ClusterRoleBinding(s) and {} RoleBinding(s)",
            cluster_role_bindings.len(),
            role_bindings.len()
        );
        Ok(Bindings {
            cluster_role_bindings,
            role_bindings,
        })
    }
}

/// Bindings grouped by the role they reference, list order preserved per role.
#[derive(Debug, Default)]
pub struct BindingIndex<'a> {
    cluster_role_bindings: HashMap<RoleKey, Vec<&'a ClusterRoleBinding>>,
    role_bindings: HashMap<RoleKey, Vec<&'a RoleBinding>>,
}

impl<'a> BindingIndex<'a> {
    pub fn build(cluster_role_bindings: &'a [ClusterRoleBinding], role_bindings: &'a [RoleBinding]) -> Self {
        let mut index = BindingIndex::default();

        for crb in cluster_role_bindings {
            match RoleKey::from_role_ref(&crb.role_ref, None) {
                Some(key) => index.cluster_role_bindings.entry(key).or_default().push(crb),
                None => debug!(
                    "Skipping ClusterRoleBinding {:?}: unresolvable roleRef {}/{}",
                    crb.metadata.name, crb.role_ref.api_group, crb.role_ref.kind
                ),
            }
        }

        for rb in role_bindings {
            let namespace = rb.metadata.namespace.as_deref().unwrap_or_default();
            match RoleKey::from_role_ref(&rb.role_ref, Some(namespace)) {
                Some(key) => index.role_bindings.entry(key).or_default().push(rb),
                None => debug!(
                    "Skipping RoleBinding {}/{:?}: unresolvable roleRef {}/{}",
                    namespace, rb.metadata.name, rb.role_ref.api_group, rb.role_ref.kind
                ),
            }
        }

        index
    }

    pub fn cluster_role_bindings_for(&self, key: &RoleKey) -> &[&'a ClusterRoleBinding] {
        self.cluster_role_bindings.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn role_bindings_for(&self, key: &RoleKey) -> &[&'a RoleBinding] {
        self.role_bindings.get(key).map(Vec::as_slice).unwrap_or_default()
    }
}
