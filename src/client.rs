/*
* Copyright (C) 2025 Pedro Henrique / phkaiser13
*
* File: src/client.rs
*
* The cluster capability every flow in this crate is written against, and
* its implementation on top of `kube`. Keeping the flows behind the
* `ClusterApi` trait lets them run against an in-memory cluster in tests.
*
* Architecture:
* - Every call is a single request; nothing is retried here.
* - HTTP 404 responses surface as `Error::NotFound`, every other failure as
*   `Error::Api` naming the operation and the object.
* - PodSecurityPolicies are served by `policy/v1beta1`, which current
*   k8s-openapi releases no longer model, so they are handled as
*   `DynamicObject`s and their content is passed through untouched.
*
* SPDX-License-Identifier: Apache-2.0
*/

use crate::config::ClientSettings;
use crate::error::{Error, Result};
use async_trait::async_trait;
use k8s_openapi::api::rbac::v1::{ClusterRole, ClusterRoleBinding, Role, RoleBinding};
use kube::{
    api::{Api, ApiResource, DeleteParams, DynamicObject, GroupVersionKind, ListParams, PostParams},
    Client, Config, ResourceExt,
};
use tracing::info;

/// A PodSecurityPolicy. Only its name is interpreted.
pub type Policy = DynamicObject;

/// API coordinates of `policy/v1beta1` PodSecurityPolicies.
pub fn policy_resource() -> ApiResource {
    let gvk = GroupVersionKind::gvk("policy", "v1beta1", "PodSecurityPolicy");
    ApiResource::from_gvk_with_plural(&gvk, "podsecuritypolicies")
}

/// Access to the cluster state this tool reads and writes.
/// Calls are awaited one at a time by every caller.
#[async_trait]
pub trait ClusterApi: Send + Sync {
    async fn list_policies(&self) -> Result<Vec<Policy>>;
    async fn get_policy(&self, name: &str) -> Result<Policy>;

    async fn list_cluster_roles(&self) -> Result<Vec<ClusterRole>>;
    async fn get_cluster_role(&self, name: &str) -> Result<ClusterRole>;
    async fn create_cluster_role(&self, role: &ClusterRole) -> Result<ClusterRole>;
    async fn delete_cluster_role(&self, name: &str) -> Result<()>;

    /// Roles of every namespace.
    async fn list_roles(&self) -> Result<Vec<Role>>;

    async fn list_cluster_role_bindings(&self) -> Result<Vec<ClusterRoleBinding>>;
    async fn get_cluster_role_binding(&self, name: &str) -> Result<ClusterRoleBinding>;
    async fn create_cluster_role_binding(&self, binding: &ClusterRoleBinding) -> Result<ClusterRoleBinding>;
    /// Unconditional full replace of the stored object.
    async fn replace_cluster_role_binding(&self, binding: &ClusterRoleBinding) -> Result<ClusterRoleBinding>;
    /// Deletes every ClusterRoleBinding whose roleRef names the ClusterRole
    /// `role_name`. `NotFound` when there is none.
    async fn delete_cluster_role_bindings(&self, role_name: &str) -> Result<()>;

    /// RoleBindings of every namespace.
    async fn list_role_bindings(&self) -> Result<Vec<RoleBinding>>;
}

/// Creates a Kubernetes client from explicit settings.
pub async fn initialize_client(settings: &ClientSettings) -> Result<Client> {
    Client::try_from(settings.load().await?).map_err(Error::Client)
}

/// `ClusterApi` backed by a live API server.
#[derive(Clone)]
pub struct KubeClusterApi {
    client: Client,
}

impl KubeClusterApi {
    pub fn new(client: Client) -> Self {
        KubeClusterApi { client }
    }

    pub async fn connect(settings: &ClientSettings) -> Result<Self> {
        Ok(KubeClusterApi::new(initialize_client(settings).await?))
    }

    /// For callers that already loaded the `Config`, e.g. to read its namespace.
    pub fn from_config(config: Config) -> Result<Self> {
        Ok(KubeClusterApi::new(Client::try_from(config).map_err(Error::Client)?))
    }

    fn policies(&self) -> Api<Policy> {
        Api::all_with(self.client.clone(), &policy_resource())
    }

    fn cluster_roles(&self) -> Api<ClusterRole> {
        Api::all(self.client.clone())
    }

    fn cluster_role_bindings(&self) -> Api<ClusterRoleBinding> {
        Api::all(self.client.clone())
    }
}

#[async_trait]
impl ClusterApi for KubeClusterApi {
    async fn list_policies(&self) -> Result<Vec<Policy>> {
        let list = self
            .policies()
            .list(&ListParams::default())
            .await
            .map_err(Error::from_kube("list", "PodSecurityPolicies", ""))?;
        Ok(list.items)
    }

    async fn get_policy(&self, name: &str) -> Result<Policy> {
        self.policies()
            .get(name)
            .await
            .map_err(Error::from_kube("get", "PodSecurityPolicy", name))
    }

    async fn list_cluster_roles(&self) -> Result<Vec<ClusterRole>> {
        let list = self
            .cluster_roles()
            .list(&ListParams::default())
            .await
            .map_err(Error::from_kube("list", "ClusterRoles", ""))?;
        Ok(list.items)
    }

    async fn get_cluster_role(&self, name: &str) -> Result<ClusterRole> {
        self.cluster_roles()
            .get(name)
            .await
            .map_err(Error::from_kube("get", "ClusterRole", name))
    }

    async fn create_cluster_role(&self, role: &ClusterRole) -> Result<ClusterRole> {
        let name = role.name_any();
        self.cluster_roles()
            .create(&PostParams::default(), role)
            .await
            .map_err(Error::from_kube("create", "ClusterRole", &name))
    }

    async fn delete_cluster_role(&self, name: &str) -> Result<()> {
        self.cluster_roles()
            .delete(name, &DeleteParams::default())
            .await
            .map_err(Error::from_kube("delete", "ClusterRole", name))?;
        info!("Deleted ClusterRole '{}'", name);
        Ok(())
    }

    async fn list_roles(&self) -> Result<Vec<Role>> {
        let api: Api<Role> = Api::all(self.client.clone());
        let list = api
            .list(&ListParams::default())
            .await
            .map_err(Error::from_kube("list", "Roles", ""))?;
        Ok(list.items)
    }

    async fn list_cluster_role_bindings(&self) -> Result<Vec<ClusterRoleBinding>> {
        let list = self
            .cluster_role_bindings()
            .list(&ListParams::default())
            .await
            .map_err(Error::from_kube("list", "ClusterRoleBindings", ""))?;
        Ok(list.items)
    }

    async fn get_cluster_role_binding(&self, name: &str) -> Result<ClusterRoleBinding> {
        self.cluster_role_bindings()
            .get(name)
            .await
            .map_err(Error::from_kube("get", "ClusterRoleBinding", name))
    }

    async fn create_cluster_role_binding(&self, binding: &ClusterRoleBinding) -> Result<ClusterRoleBinding> {
        let name = binding.name_any();
        self.cluster_role_bindings()
            .create(&PostParams::default(), binding)
            .await
            .map_err(Error::from_kube("create", "ClusterRoleBinding", &name))
    }

    async fn replace_cluster_role_binding(&self, binding: &ClusterRoleBinding) -> Result<ClusterRoleBinding> {
        let name = binding.name_any();
        self.cluster_role_bindings()
            .replace(&name, &PostParams::default(), binding)
            .await
            .map_err(Error::from_kube("update", "ClusterRoleBinding", &name))
    }

    async fn delete_cluster_role_bindings(&self, role_name: &str) -> Result<()> {
        let targets: Vec<String> = self
            .list_cluster_role_bindings()
            .await?
            .into_iter()
            .filter(|crb| crb.role_ref.kind == "ClusterRole" && crb.role_ref.name == role_name)
            .map(|crb| crb.name_any())
            .collect();

        if targets.is_empty() {
            return Err(Error::NotFound {
                kind: "ClusterRoleBinding for ClusterRole",
                name: role_name.to_string(),
            });
        }

        let api = self.cluster_role_bindings();
        for name in targets {
            api.delete(&name, &DeleteParams::default())
                .await
                .map_err(Error::from_kube("delete", "ClusterRoleBinding", &name))?;
            info!("Deleted ClusterRoleBinding '{}'", name);
        }
        Ok(())
    }

    async fn list_role_bindings(&self) -> Result<Vec<RoleBinding>> {
        let api: Api<RoleBinding> = Api::all(self.client.clone());
        let list = api
            .list(&ListParams::default())
            .await
            .map_err(Error::from_kube("list", "RoleBindings", ""))?;
        Ok(list.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_resource_coordinates() {
        let ar = policy_resource();
        assert_eq!(ar.group, "policy");
        assert_eq!(ar.version, "v1beta1");
        assert_eq!(ar.api_version, "policy/v1beta1");
        assert_eq!(ar.kind, "PodSecurityPolicy");
        assert_eq!(ar.plural, "podsecuritypolicies");
    }
}
