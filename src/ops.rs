/*
* Copyright (C) 2025 Pedro Henrique / phkaiser13
*
* File: src/ops.rs
*
* The attach, detach and clean flows built on the cluster capability.
*
* Architecture:
* - attach resolves the policy, then gets or creates the managed
*   ClusterRole, then gets or creates the managed ClusterRoleBinding, edits
*   its subject list and writes it back with an unconditional replace.
* - detach only ever reads and replaces; a missing managed pair simply means
*   the subject is not attached.
* - When the subject list is already in the desired state nothing is written.
* - Concurrent writers are not reconciled: the last replace wins.
*
* SPDX-License-Identifier: Apache-2.0
*/

use crate::bindings::{RoleKind, RBAC_API_GROUP};
use crate::client::ClusterApi;
use crate::error::{Error, Result};
use crate::naming::{managed_annotations, managed_name};
use crate::rules::use_policy_rule;
use crate::subject::{attach_subject, detach_subject, SubjectSpec};
use k8s_openapi::api::rbac::v1::{ClusterRole, ClusterRoleBinding, RoleRef};
use kube::api::ObjectMeta;
use kube::ResourceExt;
use tracing::info;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttachOutcome {
    Attached,
    AlreadyAttached,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetachOutcome {
    Detached,
    NotAttached,
}

/// What an attach did, including the managed objects created on the way.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttachReport {
    pub policy: String,
    pub managed_name: String,
    pub created_role: bool,
    pub created_binding: bool,
    pub outcome: AttachOutcome,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DetachReport {
    pub policy: String,
    pub managed_name: String,
    pub outcome: DetachOutcome,
}

/// The managed ClusterRole granting `use` of exactly `policy_name`.
pub fn build_managed_cluster_role(policy_name: &str) -> ClusterRole {
    ClusterRole {
        metadata: ObjectMeta {
            name: Some(managed_name(policy_name)),
            annotations: Some(managed_annotations(policy_name)),
            ..Default::default()
        },
        rules: Some(vec![use_policy_rule(policy_name)]),
        ..Default::default()
    }
}

/// The managed ClusterRoleBinding for `policy_name`, without subjects.
pub fn build_managed_cluster_role_binding(policy_name: &str, role_name: &str) -> ClusterRoleBinding {
    ClusterRoleBinding {
        metadata: ObjectMeta {
            name: Some(managed_name(policy_name)),
            annotations: Some(managed_annotations(policy_name)),
            ..Default::default()
        },
        role_ref: RoleRef {
            api_group: RBAC_API_GROUP.to_string(),
            kind: RoleKind::ClusterRole.as_str().to_string(),
            name: role_name.to_string(),
        },
        subjects: None,
    }
}

async fn get_or_create_role(api: &dyn ClusterApi, policy_name: &str) -> Result<(ClusterRole, bool)> {
    let name = managed_name(policy_name);
    match api.get_cluster_role(&name).await {
        Ok(role) => Ok((role, false)),
        Err(e) if e.is_not_found() => {
            info!("Managed ClusterRole '{}' is not found, creating it", name);
            let role = api
                .create_cluster_role(&build_managed_cluster_role(policy_name))
                .await?;
            Ok((role, true))
        }
        Err(e) => Err(e),
    }
}

async fn get_or_create_binding(
    api: &dyn ClusterApi,
    policy_name: &str,
    role: &ClusterRole,
) -> Result<(ClusterRoleBinding, bool)> {
    let name = managed_name(policy_name);
    match api.get_cluster_role_binding(&name).await {
        Ok(binding) => Ok((binding, false)),
        Err(e) if e.is_not_found() => {
            info!("Managed ClusterRoleBinding '{}' is not found, creating it", name);
            let binding = api
                .create_cluster_role_binding(&build_managed_cluster_role_binding(
                    policy_name,
                    &role.name_any(),
                ))
                .await?;
            Ok((binding, true))
        }
        Err(e) => Err(e),
    }
}

/// Grants `subject` use of the policy through the managed pair.
pub async fn attach(api: &dyn ClusterApi, policy_name: &str, subject: &SubjectSpec) -> Result<AttachReport> {
    let policy = api.get_policy(policy_name).await?;
    let policy_name = policy.name_any();

    let (role, created_role) = get_or_create_role(api, &policy_name).await?;
    let (mut binding, created_binding) = get_or_create_binding(api, &policy_name, &role).await?;

    let mut report = AttachReport {
        managed_name: binding.name_any(),
        policy: policy_name,
        created_role,
        created_binding,
        outcome: AttachOutcome::AlreadyAttached,
    };

    if attach_subject(&mut binding, &subject.to_subject()) {
        info!("{} is already attached to '{}'", subject, report.policy);
        return Ok(report);
    }

    api.replace_cluster_role_binding(&binding).await?;
    info!("Attached {} to '{}' via '{}'", subject, report.policy, report.managed_name);
    report.outcome = AttachOutcome::Attached;
    Ok(report)
}

/// Revokes `subject`'s use of the policy granted through the managed pair.
pub async fn detach(api: &dyn ClusterApi, policy_name: &str, subject: &SubjectSpec) -> Result<DetachReport> {
    let policy = api.get_policy(policy_name).await?;
    let policy_name = policy.name_any();
    let name = managed_name(&policy_name);

    let mut report = DetachReport {
        policy: policy_name,
        managed_name: name.clone(),
        outcome: DetachOutcome::NotAttached,
    };

    match api.get_cluster_role(&name).await {
        Ok(_) => {}
        Err(e) if e.is_not_found() => {
            info!("Managed ClusterRole '{}' is not found, nothing to detach", name);
            return Ok(report);
        }
        Err(e) => return Err(e),
    }

    let mut binding = match api.get_cluster_role_binding(&name).await {
        Ok(binding) => binding,
        Err(e) if e.is_not_found() => {
            info!("Managed ClusterRoleBinding '{}' is not found, nothing to detach", name);
            return Ok(report);
        }
        Err(e) => return Err(e),
    };

    if !detach_subject(&mut binding, &subject.to_subject()) {
        return Ok(report);
    }

    api.replace_cluster_role_binding(&binding).await?;
    info!("Detached {} from '{}'", subject, report.policy);
    report.outcome = DetachOutcome::Detached;
    Ok(report)
}

/// Removes the managed bindings, then the managed ClusterRole, of a policy.
/// The policy itself does not need to exist any more.
pub async fn clean(api: &dyn ClusterApi, policy_name: &str) -> Result<String> {
    let name = managed_name(policy_name);
    match api.delete_cluster_role_bindings(&name).await {
        Ok(()) => {}
        Err(e) if e.is_not_found() => {
            return Err(Error::NotFound {
                kind: "managed ClusterRole",
                name,
            })
        }
        Err(e) => return Err(e),
    }
    api.delete_cluster_role(&name).await?;
    Ok(name)
}
