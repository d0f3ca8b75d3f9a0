/*
* Copyright (C) 2025 Pedro Henrique / phkaiser13
*
* File: src/config.rs
*
* Explicit client settings handed from the CLI to client construction.
* Loading them yields a kube `Config`, whose `default_namespace` is the
* namespace used for ServiceAccount subjects when none is given on the
* command line: the selected context's namespace, the pod's namespace when
* running in-cluster, `default` otherwise.
*
* SPDX-License-Identifier: Apache-2.0
*/

use crate::error::Result;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::Config;
use std::path::PathBuf;
use tracing::debug;

/// Where to find cluster credentials. `None` fields defer to kube's inference.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClientSettings {
    pub kubeconfig: Option<PathBuf>,
    pub context: Option<String>,
}

impl ClientSettings {
    /// Resolves the client configuration. Without an explicit path or context
    /// this is kube's inference (`$KUBECONFIG`, `~/.kube/config`, in-cluster).
    /// An unreadable kubeconfig or an unknown context is an error.
    pub async fn load(&self) -> Result<Config> {
        let options = KubeConfigOptions {
            context: self.context.clone(),
            ..Default::default()
        };

        let config = match (&self.kubeconfig, &self.context) {
            (Some(path), _) => {
                debug!("Using kubeconfig path: {}", path.display());
                let kubeconfig = Kubeconfig::read_from(path)?;
                Config::from_custom_kubeconfig(kubeconfig, &options).await?
            }
            (None, Some(_)) => Config::from_kubeconfig(&options).await?,
            (None, None) => Config::infer().await?,
        };
        debug!("Default namespace: {}", config.default_namespace);
        Ok(config)
    }
}
