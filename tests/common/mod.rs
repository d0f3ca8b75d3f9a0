/*
* Copyright (C) 2025 Pedro Henrique / phkaiser13
*
* File: tests/common/mod.rs
*
* In-memory cluster used by the integration tests. It implements
* `ClusterApi` over plain vectors and counts writes so tests can assert
* that idempotent operations leave the cluster untouched.
*
* SPDX-License-Identifier: Apache-2.0
*/

#![allow(dead_code)]

use async_trait::async_trait;
use k8s_openapi::api::rbac::v1::{ClusterRole, ClusterRoleBinding, PolicyRule, Role, RoleBinding, RoleRef, Subject};
use kube::api::ObjectMeta;
use kube::core::ErrorResponse;
use kube::ResourceExt;
use psp_util::client::policy_resource;
use psp_util::{ClusterApi, Error, Policy, Result};
use std::sync::Mutex;

#[derive(Default)]
pub struct State {
    pub policies: Vec<Policy>,
    pub cluster_roles: Vec<ClusterRole>,
    pub roles: Vec<Role>,
    pub cluster_role_bindings: Vec<ClusterRoleBinding>,
    pub role_bindings: Vec<RoleBinding>,
    pub creates: usize,
    pub replaces: usize,
    pub deletes: usize,
    /// When set, every call fails with a server error.
    pub fail_all: bool,
    /// When set, calls of this `ClusterApi` method fail with a server error.
    pub fail_on: Option<&'static str>,
}

#[derive(Default)]
pub struct FakeCluster {
    pub state: Mutex<State>,
}

impl FakeCluster {
    pub fn new() -> Self {
        FakeCluster::default()
    }

    pub fn with_policies(names: &[&str]) -> Self {
        let cluster = FakeCluster::new();
        for name in names {
            cluster.add_policy(name);
        }
        cluster
    }

    pub fn add_policy(&self, name: &str) {
        let mut policy = Policy::new(name, &policy_resource());
        policy.data = serde_json::json!({
            "spec": {
                "privileged": false,
                "runAsUser": { "rule": "RunAsAny" },
            }
        });
        self.state.lock().unwrap().policies.push(policy);
    }

    pub fn add_cluster_role(&self, role: ClusterRole) {
        self.state.lock().unwrap().cluster_roles.push(role);
    }

    pub fn add_role(&self, role: Role) {
        self.state.lock().unwrap().roles.push(role);
    }

    pub fn add_cluster_role_binding(&self, binding: ClusterRoleBinding) {
        self.state.lock().unwrap().cluster_role_bindings.push(binding);
    }

    pub fn add_role_binding(&self, binding: RoleBinding) {
        self.state.lock().unwrap().role_bindings.push(binding);
    }

    pub fn fail_all(&self) {
        self.state.lock().unwrap().fail_all = true;
    }

    pub fn fail_on(&self, operation: &'static str) {
        self.state.lock().unwrap().fail_on = Some(operation);
    }

    pub fn creates(&self) -> usize {
        self.state.lock().unwrap().creates
    }

    pub fn writes(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.creates + state.replaces + state.deletes
    }

    pub fn replaces(&self) -> usize {
        self.state.lock().unwrap().replaces
    }

    pub fn cluster_role_binding(&self, name: &str) -> Option<ClusterRoleBinding> {
        let state = self.state.lock().unwrap();
        state.cluster_role_bindings.iter().find(|b| b.name_any() == name).cloned()
    }

    pub fn cluster_role(&self, name: &str) -> Option<ClusterRole> {
        let state = self.state.lock().unwrap();
        state.cluster_roles.iter().find(|r| r.name_any() == name).cloned()
    }

    fn check(&self, operation: &'static str, target: &str) -> Result<()> {
        let state = self.state.lock().unwrap();
        if state.fail_all || state.fail_on == Some(operation) {
            return Err(Error::Api {
                action: operation,
                target: target.to_string(),
                source: kube::Error::Api(ErrorResponse {
                    status: "Failure".to_string(),
                    message: "etcdserver: request timed out".to_string(),
                    reason: "InternalError".to_string(),
                    code: 500,
                }),
            });
        }
        Ok(())
    }
}

fn not_found(kind: &'static str, name: &str) -> Error {
    Error::NotFound {
        kind,
        name: name.to_string(),
    }
}

#[async_trait]
impl ClusterApi for FakeCluster {
    async fn list_policies(&self) -> Result<Vec<Policy>> {
        self.check("list_policies", "PodSecurityPolicies")?;
        Ok(self.state.lock().unwrap().policies.clone())
    }

    async fn get_policy(&self, name: &str) -> Result<Policy> {
        self.check("get_policy", name)?;
        let state = self.state.lock().unwrap();
        state
            .policies
            .iter()
            .find(|p| p.name_any() == name)
            .cloned()
            .ok_or_else(|| not_found("PodSecurityPolicy", name))
    }

    async fn list_cluster_roles(&self) -> Result<Vec<ClusterRole>> {
        self.check("list_cluster_roles", "ClusterRoles")?;
        Ok(self.state.lock().unwrap().cluster_roles.clone())
    }

    async fn get_cluster_role(&self, name: &str) -> Result<ClusterRole> {
        self.check("get_cluster_role", name)?;
        self.cluster_role(name).ok_or_else(|| not_found("ClusterRole", name))
    }

    async fn create_cluster_role(&self, role: &ClusterRole) -> Result<ClusterRole> {
        self.check("create_cluster_role", &role.name_any())?;
        let mut state = self.state.lock().unwrap();
        state.creates += 1;
        state.cluster_roles.push(role.clone());
        Ok(role.clone())
    }

    async fn delete_cluster_role(&self, name: &str) -> Result<()> {
        self.check("delete_cluster_role", name)?;
        let mut state = self.state.lock().unwrap();
        let before = state.cluster_roles.len();
        state.cluster_roles.retain(|r| r.name_any() != name);
        if state.cluster_roles.len() == before {
            return Err(not_found("ClusterRole", name));
        }
        state.deletes += 1;
        Ok(())
    }

    async fn list_roles(&self) -> Result<Vec<Role>> {
        self.check("list_roles", "Roles")?;
        Ok(self.state.lock().unwrap().roles.clone())
    }

    async fn list_cluster_role_bindings(&self) -> Result<Vec<ClusterRoleBinding>> {
        self.check("list_cluster_role_bindings", "ClusterRoleBindings")?;
        Ok(self.state.lock().unwrap().cluster_role_bindings.clone())
    }

    async fn get_cluster_role_binding(&self, name: &str) -> Result<ClusterRoleBinding> {
        self.check("get_cluster_role_binding", name)?;
        self.cluster_role_binding(name)
            .ok_or_else(|| not_found("ClusterRoleBinding", name))
    }

    async fn create_cluster_role_binding(&self, binding: &ClusterRoleBinding) -> Result<ClusterRoleBinding> {
        self.check("create_cluster_role_binding", &binding.name_any())?;
        let mut state = self.state.lock().unwrap();
        state.creates += 1;
        state.cluster_role_bindings.push(binding.clone());
        Ok(binding.clone())
    }

    async fn replace_cluster_role_binding(&self, binding: &ClusterRoleBinding) -> Result<ClusterRoleBinding> {
        let name = binding.name_any();
        self.check("replace_cluster_role_binding", &name)?;
        let mut state = self.state.lock().unwrap();
        let slot = state
            .cluster_role_bindings
            .iter_mut()
            .find(|b| b.name_any() == name)
            .ok_or_else(|| not_found("ClusterRoleBinding", &name))?;
        *slot = binding.clone();
        state.replaces += 1;
        Ok(binding.clone())
    }

    async fn delete_cluster_role_bindings(&self, role_name: &str) -> Result<()> {
        self.check("delete_cluster_role_bindings", role_name)?;
        let mut state = self.state.lock().unwrap();
        let before = state.cluster_role_bindings.len();
        state
            .cluster_role_bindings
            .retain(|b| !(b.role_ref.kind == "ClusterRole" && b.role_ref.name == role_name));
        let removed = before - state.cluster_role_bindings.len();
        if removed == 0 {
            return Err(not_found("ClusterRoleBinding for ClusterRole", role_name));
        }
        state.deletes += removed;
        Ok(())
    }

    async fn list_role_bindings(&self) -> Result<Vec<RoleBinding>> {
        self.check("list_role_bindings", "RoleBindings")?;
        Ok(self.state.lock().unwrap().role_bindings.clone())
    }
}

pub fn meta(namespace: Option<&str>, name: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: namespace.map(str::to_string),
        ..Default::default()
    }
}

pub fn role_ref(kind: &str, name: &str) -> RoleRef {
    RoleRef {
        api_group: "rbac.authorization.k8s.io".to_string(),
        kind: kind.to_string(),
        name: name.to_string(),
    }
}

/// A rule granting `use` of the named policies.
pub fn use_rule(policies: &[&str]) -> PolicyRule {
    PolicyRule {
        api_groups: Some(vec!["policy".to_string()]),
        resources: Some(vec!["podsecuritypolicies".to_string()]),
        verbs: vec!["use".to_string()],
        resource_names: Some(policies.iter().map(|p| p.to_string()).collect()),
        ..Default::default()
    }
}

pub fn cluster_role(name: &str, rules: Vec<PolicyRule>) -> ClusterRole {
    ClusterRole {
        metadata: meta(None, name),
        rules: Some(rules),
        ..Default::default()
    }
}

pub fn role(namespace: &str, name: &str, rules: Vec<PolicyRule>) -> Role {
    Role {
        metadata: meta(Some(namespace), name),
        rules: Some(rules),
    }
}

pub fn cluster_role_binding(name: &str, role: &str, subjects: Vec<Subject>) -> ClusterRoleBinding {
    ClusterRoleBinding {
        metadata: meta(None, name),
        role_ref: role_ref("ClusterRole", role),
        subjects: Some(subjects),
    }
}

pub fn role_binding(namespace: &str, name: &str, role_kind: &str, role: &str, subjects: Vec<Subject>) -> RoleBinding {
    RoleBinding {
        metadata: meta(Some(namespace), name),
        role_ref: role_ref(role_kind, role),
        subjects: Some(subjects),
    }
}
