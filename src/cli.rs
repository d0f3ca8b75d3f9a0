/*
* Copyright (C) 2025 Pedro Henrique / phkaiser13
*
* File: src/cli.rs
*
* Command-line interface for psp-util, declared with clap's derive API.
* Global flags select the cluster; each subcommand maps onto one flow of
* the library.
*
* SPDX-License-Identifier: Apache-2.0
*/

use clap::{Args, Parser, Subcommand};
use psp_util::printers::ListColumns;
use psp_util::{Error, SubjectKind, SubjectSpec};
use std::path::PathBuf;

/// Inspect PodSecurityPolicy RBAC relationships and manage which subjects may use a policy.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the kubeconfig file. Defaults to KUBECONFIG or ~/.kube/config.
    #[arg(long, global = true)]
    pub kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use instead of the current one.
    #[arg(long, global = true)]
    pub context: Option<String>,

    /// Print debug logs to stderr.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show each PSP with its roles, bindings and subjects as a tree.
    Tree(TreeArgs),

    /// List PSP, role and binding relationships as a table.
    List(ListArgs),

    /// Allow a subject to use a PSP through the managed ClusterRoleBinding.
    Attach(SubjectArgs),

    /// Revoke a subject previously attached to a PSP.
    Detach(SubjectArgs),

    /// Delete the managed ClusterRole and ClusterRoleBinding of a PSP.
    Clean(CleanArgs),
}

#[derive(Args, Debug)]
pub struct TreeArgs {
    /// Disable colored output.
    #[arg(long)]
    pub no_color: bool,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Do not print the header row.
    #[arg(long)]
    pub no_headers: bool,

    /// Only show ClusterRoles and their bindings.
    #[arg(long, short = 'c', conflicts_with = "role")]
    pub cluster_role: bool,

    /// Only show namespaced Roles and their RoleBindings.
    #[arg(long, short = 'r')]
    pub role: bool,
}

impl ListArgs {
    pub fn columns(&self) -> ListColumns {
        if self.cluster_role {
            ListColumns::cluster_roles_only()
        } else if self.role {
            ListColumns::roles_only()
        } else {
            ListColumns::all()
        }
    }
}

/// Either `--kind` with `--name`, or exactly one of `--user`, `--group`, `--sa`.
#[derive(Args, Debug)]
pub struct SubjectArgs {
    /// Name of the PodSecurityPolicy.
    #[arg(value_name = "PSP-NAME")]
    pub policy: String,

    /// Subject kind.
    #[arg(long, value_enum, requires = "name")]
    pub kind: Option<SubjectKind>,

    /// Subject name, used with --kind.
    #[arg(long)]
    pub name: Option<String>,

    /// Subject API group, for User and Group subjects.
    #[arg(long)]
    pub api_group: Option<String>,

    /// Namespace of a ServiceAccount. Defaults to the context's namespace.
    #[arg(long, short = 'n')]
    pub namespace: Option<String>,

    /// Shorthand for --kind User --name <USER>.
    #[arg(long, short = 'u', conflicts_with_all = ["kind", "group", "sa"])]
    pub user: Option<String>,

    /// Shorthand for --kind Group --name <GROUP>.
    #[arg(long, short = 'g', conflicts_with_all = ["kind", "user", "sa"])]
    pub group: Option<String>,

    /// Shorthand for --kind ServiceAccount --name <SA>.
    #[arg(long, short = 's', conflicts_with_all = ["kind", "user", "group"])]
    pub sa: Option<String>,
}

impl SubjectArgs {
    /// Builds the validated subject. `default_namespace` is only consulted for
    /// a ServiceAccount given without `--namespace`.
    pub fn subject_spec<F>(&self, default_namespace: F) -> psp_util::Result<SubjectSpec>
    where
        F: FnOnce() -> psp_util::Result<String>,
    {
        let (kind, name) = match (self.kind, &self.user, &self.group, &self.sa) {
            (Some(kind), None, None, None) => {
                let name = self
                    .name
                    .clone()
                    .ok_or_else(|| Error::Validation("--kind requires --name".to_string()))?;
                (kind, name)
            }
            (None, Some(user), None, None) => (SubjectKind::User, user.clone()),
            (None, None, Some(group), None) => (SubjectKind::Group, group.clone()),
            (None, None, None, Some(sa)) => (SubjectKind::ServiceAccount, sa.clone()),
            (None, None, None, None) => {
                return Err(Error::Validation(
                    "a subject is required: use --kind and --name, or one of --user, --group, --sa".to_string(),
                ))
            }
            _ => {
                return Err(Error::Validation(
                    "only one of --kind, --user, --group, --sa may be given".to_string(),
                ))
            }
        };

        if self.kind.is_none() && self.name.is_some() {
            return Err(Error::Validation("--name can only be used with --kind".to_string()));
        }
        if self.kind.is_none() && self.api_group.is_some() {
            return Err(Error::Validation("--api-group can only be used with --kind".to_string()));
        }

        let namespace = match (kind, &self.namespace) {
            (SubjectKind::ServiceAccount, None) => Some(default_namespace()?),
            (_, ns) => ns.clone(),
        };
        SubjectSpec::new(kind, name, namespace, self.api_group.clone())
    }
}

#[derive(Args, Debug)]
pub struct CleanArgs {
    /// Name of the PodSecurityPolicy whose managed objects should be removed.
    #[arg(value_name = "PSP-NAME")]
    pub policy: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject_args(args: &[&str]) -> SubjectArgs {
        let argv = ["psp-util", "attach"].iter().chain(args.iter()).copied();
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Attach(args) => args,
            other => panic!("unexpected command {:?}", other),
        }
    }

    fn no_default() -> psp_util::Result<String> {
        panic!("default namespace should not be consulted")
    }

    #[test]
    fn test_user_shorthand() {
        let spec = subject_args(&["privileged", "-u", "alice"]).subject_spec(no_default).unwrap();
        assert_eq!(spec, SubjectSpec::user("alice").unwrap());
    }

    #[test]
    fn test_explicit_kind_and_api_group() {
        let spec = subject_args(&["privileged", "--kind", "Group", "--name", "devs", "--api-group", "example.com"])
            .subject_spec(no_default)
            .unwrap();
        assert_eq!(spec.kind(), SubjectKind::Group);
        assert_eq!(spec.to_subject().api_group.as_deref(), Some("example.com"));
    }

    #[test]
    fn test_service_account_uses_default_namespace() {
        let spec = subject_args(&["privileged", "-s", "builder"])
            .subject_spec(|| Ok("from-context".to_string()))
            .unwrap();
        assert_eq!(spec, SubjectSpec::service_account("from-context", "builder").unwrap());

        let spec = subject_args(&["privileged", "-s", "builder", "-n", "ci"])
            .subject_spec(no_default)
            .unwrap();
        assert_eq!(spec, SubjectSpec::service_account("ci", "builder").unwrap());
    }

    #[test]
    fn test_missing_subject_is_rejected() {
        let err = subject_args(&["privileged"]).subject_spec(no_default).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_name_without_kind_is_rejected() {
        let err = subject_args(&["privileged", "-u", "alice", "--name", "bob"])
            .subject_spec(no_default)
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_conflicting_shorthands_fail_to_parse() {
        assert!(Cli::try_parse_from(["psp-util", "attach", "p", "-u", "a", "-g", "b"]).is_err());
        assert!(Cli::try_parse_from(["psp-util", "attach", "p", "--kind", "User"]).is_err());
        assert!(Cli::try_parse_from(["psp-util", "list", "-c", "-r"]).is_err());
    }

    #[test]
    fn test_list_columns_and_global_flags() {
        let cli = Cli::try_parse_from(["psp-util", "list", "-r", "--context", "prod", "--no-headers"]).unwrap();
        assert_eq!(cli.context.as_deref(), Some("prod"));
        match cli.command {
            Commands::List(args) => {
                assert!(args.no_headers);
                assert_eq!(args.columns(), ListColumns::roles_only());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
