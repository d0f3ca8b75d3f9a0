/*
* Copyright (C) 2025 Pedro Henrique / phkaiser13
*
* File: src/main.rs
*
* Entrypoint for the psp-util binary. Parses the command line, installs
* logging, connects to the cluster and dispatches to the library flows.
* Results go to stdout; failures are reported on stderr with exit status 1.
*
* SPDX-License-Identifier: Apache-2.0
*/

use anyhow::{Context, Result};
use clap::Parser;
use psp_util::config::ClientSettings;
use psp_util::ops::{self, AttachOutcome, DetachOutcome};
use psp_util::printers::{render_forest, write_list, TreeStyle};
use psp_util::{ClusterSnapshot, KubeClusterApi};
use std::io::{self, Write};
use std::process::ExitCode;

mod cli;

use cli::{Cli, Commands};

async fn connect(settings: &ClientSettings) -> Result<KubeClusterApi> {
    KubeClusterApi::connect(settings)
        .await
        .context("Failed to connect to the Kubernetes cluster")
}

async fn run(cli: Cli) -> Result<()> {
    let settings = ClientSettings {
        kubeconfig: cli.kubeconfig,
        context: cli.context,
    };

    match cli.command {
        Commands::Tree(args) => {
            let api = connect(&settings).await?;
            let snapshot = ClusterSnapshot::fetch(&api).await?;
            let style = TreeStyle { color: !args.no_color };
            let mut stdout = io::stdout().lock();
            stdout.write_all(render_forest(&snapshot.graph(), &style).as_bytes())?;
            stdout.flush()?;
        }

        Commands::List(args) => {
            let api = connect(&settings).await?;
            let snapshot = ClusterSnapshot::fetch(&api).await?;
            write_list(io::stdout().lock(), &snapshot.graph(), &args.columns(), !args.no_headers)
                .context("Failed to write the table")?;
        }

        Commands::Attach(args) => {
            let config = settings.load().await.context("Failed to load the Kubernetes config")?;
            let subject = args
                .subject_spec(|| Ok(config.default_namespace.clone()))
                .context("Invalid subject")?;
            let api = KubeClusterApi::from_config(config)
                .context("Failed to connect to the Kubernetes cluster")?;
            let report = ops::attach(&api, &args.policy, &subject)
                .await
                .with_context(|| format!("Failed to attach {} to psp '{}'", subject, args.policy))?;
            if report.created_role {
                println!("Managed ClusterRole '{}' created", report.managed_name);
            }
            if report.created_binding {
                println!("Managed ClusterRoleBinding '{}' created", report.managed_name);
            }
            match report.outcome {
                AttachOutcome::Attached => {
                    println!("✅ Attached {} to psp '{}'", subject, report.policy)
                }
                AttachOutcome::AlreadyAttached => {
                    println!("psp '{}' has already been attached to {}", report.policy, subject)
                }
            }
        }

        Commands::Detach(args) => {
            let config = settings.load().await.context("Failed to load the Kubernetes config")?;
            let subject = args
                .subject_spec(|| Ok(config.default_namespace.clone()))
                .context("Invalid subject")?;
            let api = KubeClusterApi::from_config(config)
                .context("Failed to connect to the Kubernetes cluster")?;
            let report = ops::detach(&api, &args.policy, &subject)
                .await
                .with_context(|| format!("Failed to detach {} from psp '{}'", subject, args.policy))?;
            match report.outcome {
                DetachOutcome::Detached => {
                    println!("✅ Detached {} from psp '{}'", subject, report.policy)
                }
                DetachOutcome::NotAttached => {
                    println!("psp '{}' has NOT been attached to {}", report.policy, subject)
                }
            }
        }

        Commands::Clean(args) => {
            let api = connect(&settings).await?;
            let name = ops::clean(&api, &args.policy)
                .await
                .with_context(|| format!("Failed to clean managed objects of psp '{}'", args.policy))?;
            println!("✅ Deleted managed ClusterRoleBinding and ClusterRole '{}'", name);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = psp_util::telemetry::init(cli.verbose) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ An error occurred: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
