/*
* Copyright (C) 2025 Pedro Henrique / phkaiser13
*
* File: src/error.rs
*
* The error taxonomy shared by every fallible operation in the crate.
* `NotFound` is kept apart from every other API failure because callers
* branch on it: a missing managed ClusterRole triggers creation, a missing
* policy is reported to the user as such.
*
* SPDX-License-Identifier: Apache-2.0
*/

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{} is not found", describe(.kind, .name))]
    NotFound { kind: &'static str, name: String },

    #[error("failed to {action} {target}: {source}")]
    Api {
        action: &'static str,
        target: String,
        #[source]
        source: kube::Error,
    },

    #[error("invalid subject: {0}")]
    Validation(String),

    #[error("failed to load kubeconfig: {0}")]
    Kubeconfig(#[from] kube::config::KubeconfigError),

    #[error("failed to infer Kubernetes config: {0}")]
    InferConfig(#[from] kube::config::InferConfigError),

    #[error("failed to create Kubernetes client: {0}")]
    Client(#[source] kube::Error),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// Returns a mapper turning a kube error into an `Error`, with HTTP 404
    /// responses becoming `NotFound` for the given object.
    pub(crate) fn from_kube(
        action: &'static str,
        kind: &'static str,
        name: &str,
    ) -> impl FnOnce(kube::Error) -> Error {
        let name = name.to_string();
        move |err| match err {
            kube::Error::Api(resp) if resp.code == 404 => Error::NotFound { kind, name },
            source => Error::Api {
                action,
                target: describe(kind, &name),
                source,
            },
        }
    }
}

/// `Kind 'name'`, or just the kind for collection-wide calls.
fn describe(kind: &str, name: &str) -> String {
    if name.is_empty() {
        kind.to_string()
    } else {
        format!("{} '{}'", kind, name)
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
