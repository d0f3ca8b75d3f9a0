/*
* Copyright (C) 2025 Pedro Henrique / phkaiser13
*
* File: src/subject.rs
*
* RBAC subjects: the validated descriptor built from user input, and the
* idempotent edits that attach it to or detach it from a binding's subject
* list. Two subjects are equal when kind, name, namespace and API group all
* are, which is exactly `PartialEq` on the k8s-openapi `Subject`.
*
* SPDX-License-Identifier: Apache-2.0
*/

use crate::bindings::RBAC_API_GROUP;
use crate::error::{Error, Result};
use k8s_openapi::api::rbac::v1::{ClusterRoleBinding, RoleBinding, Subject};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum SubjectKind {
    #[value(name = "User")]
    User,
    #[value(name = "Group")]
    Group,
    #[value(name = "ServiceAccount")]
    ServiceAccount,
}

impl SubjectKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SubjectKind::User => "User",
            SubjectKind::Group => "Group",
            SubjectKind::ServiceAccount => "ServiceAccount",
        }
    }
}

impl fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A subject that passed validation. Construct through [`SubjectSpec::new`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubjectSpec {
    kind: SubjectKind,
    name: String,
    namespace: Option<String>,
    api_group: Option<String>,
}

impl SubjectSpec {
    /// Namespace is required for (and only allowed on) ServiceAccounts; the
    /// API group defaults to the RBAC group for users and groups and is not
    /// allowed on ServiceAccounts.
    pub fn new(
        kind: SubjectKind,
        name: impl Into<String>,
        namespace: Option<String>,
        api_group: Option<String>,
    ) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::Validation("subject name must not be empty".to_string()));
        }
        let namespace = namespace.filter(|ns| !ns.is_empty());
        let api_group = api_group.filter(|g| !g.is_empty());

        match kind {
            SubjectKind::ServiceAccount => {
                if namespace.is_none() {
                    return Err(Error::Validation(format!(
                        "ServiceAccount '{}' requires a namespace",
                        name
                    )));
                }
                if api_group.is_some() {
                    return Err(Error::Validation(
                        "an API group cannot be set for a ServiceAccount".to_string(),
                    ));
                }
                Ok(SubjectSpec {
                    kind,
                    name,
                    namespace,
                    api_group: None,
                })
            }
            SubjectKind::User | SubjectKind::Group => {
                if namespace.is_some() {
                    return Err(Error::Validation(format!(
                        "a namespace can only be set for a ServiceAccount, not a {}",
                        kind
                    )));
                }
                Ok(SubjectSpec {
                    kind,
                    name,
                    namespace: None,
                    api_group: Some(api_group.unwrap_or_else(|| RBAC_API_GROUP.to_string())),
                })
            }
        }
    }

    pub fn user(name: impl Into<String>) -> Result<Self> {
        SubjectSpec::new(SubjectKind::User, name, None, None)
    }

    pub fn group(name: impl Into<String>) -> Result<Self> {
        SubjectSpec::new(SubjectKind::Group, name, None, None)
    }

    pub fn service_account(namespace: impl Into<String>, name: impl Into<String>) -> Result<Self> {
        SubjectSpec::new(SubjectKind::ServiceAccount, name, Some(namespace.into()), None)
    }

    pub fn kind(&self) -> SubjectKind {
        self.kind
    }

    pub fn to_subject(&self) -> Subject {
        Subject {
            kind: self.kind.as_str().to_string(),
            name: self.name.clone(),
            namespace: self.namespace.clone(),
            api_group: self.api_group.clone(),
        }
    }
}

impl fmt::Display for SubjectSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{{Name: {}", self.kind, self.name)?;
        if let Some(ns) = &self.namespace {
            write!(f, ", Namespace: {}", ns)?;
        }
        if let Some(group) = &self.api_group {
            write!(f, ", APIGroup: {}", group)?;
        }
        f.write_str("}")
    }
}

/// A binding whose subject list can be edited in place.
pub trait SubjectHolder {
    fn subjects(&self) -> &[Subject];
    fn subjects_mut(&mut self) -> &mut Vec<Subject>;
}

impl SubjectHolder for ClusterRoleBinding {
    fn subjects(&self) -> &[Subject] {
        self.subjects.as_deref().unwrap_or_default()
    }

    fn subjects_mut(&mut self) -> &mut Vec<Subject> {
        self.subjects.get_or_insert_with(Vec::new)
    }
}

impl SubjectHolder for RoleBinding {
    fn subjects(&self) -> &[Subject] {
        self.subjects.as_deref().unwrap_or_default()
    }

    fn subjects_mut(&mut self) -> &mut Vec<Subject> {
        self.subjects.get_or_insert_with(Vec::new)
    }
}

/// Appends `subject` unless an equal one is present.
/// Returns whether it was already present (in which case nothing changed).
pub fn attach_subject<B: SubjectHolder + ?Sized>(binding: &mut B, subject: &Subject) -> bool {
    if binding.subjects().contains(subject) {
        return true;
    }
    binding.subjects_mut().push(subject.clone());
    false
}

/// Removes the first subject equal to `subject`, keeping the order of the rest.
/// Returns whether one was present (if not, nothing changed).
pub fn detach_subject<B: SubjectHolder + ?Sized>(binding: &mut B, subject: &Subject) -> bool {
    match binding.subjects().iter().position(|s| s == subject) {
        Some(pos) => {
            binding.subjects_mut().remove(pos);
            true
        }
        None => false,
    }
}
