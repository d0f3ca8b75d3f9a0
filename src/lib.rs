/*
* Copyright (C) 2025 Pedro Henrique / phkaiser13
*
* File: src/lib.rs
*
* psp-util correlates PodSecurityPolicies with the ClusterRoles and Roles
* that grant their use and with the bindings of those roles, and manages a
* ClusterRole/ClusterRoleBinding pair per policy to attach or detach RBAC
* subjects.
*
* SPDX-License-Identifier: Apache-2.0
*/

pub mod bindings;
pub mod client;
pub mod config;
pub mod error;
pub mod graph;
pub mod naming;
pub mod ops;
pub mod printers;
pub mod rules;
pub mod subject;
pub mod telemetry;

pub use client::{ClusterApi, KubeClusterApi, Policy};
pub use error::{Error, Result};
pub use graph::{ClusterSnapshot, RelationshipGraph};
pub use subject::{SubjectKind, SubjectSpec};
