/*
* Copyright (C) 2025 Pedro Henrique / phkaiser13
*
* File: src/printers/list.rs
*
* Flattens the relationship graph into one row per (policy, role, binding)
* path and writes the rows through elastic tab stops. Which columns appear
* is chosen by an explicit `ListColumns` value.
*
* SPDX-License-Identifier: Apache-2.0
*/

use super::qualified;
use crate::graph::RelationshipGraph;
use kube::ResourceExt;
use std::io::{self, Write};
use tabwriter::TabWriter;

pub const HEADER: [&str; 6] = [
    "PSP",
    "ClusterRole",
    "ClusterRoleBinding",
    "NS/Role",
    "NS/RoleBinding",
    "Managed",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListColumns {
    pub policy: bool,
    pub cluster_role: bool,
    pub cluster_role_binding: bool,
    pub role: bool,
    pub role_binding: bool,
    pub managed: bool,
}

impl ListColumns {
    pub fn all() -> Self {
        ListColumns {
            policy: true,
            cluster_role: true,
            cluster_role_binding: true,
            role: true,
            role_binding: true,
            managed: true,
        }
    }

    /// ClusterRoles and whatever binds them, without the Managed column.
    pub fn cluster_roles_only() -> Self {
        ListColumns {
            role: false,
            managed: false,
            ..ListColumns::all()
        }
    }

    /// Namespaced Roles and their RoleBindings. Roles are never managed.
    pub fn roles_only() -> Self {
        ListColumns {
            cluster_role: false,
            cluster_role_binding: false,
            managed: false,
            ..ListColumns::all()
        }
    }

    fn flags(&self) -> [bool; 6] {
        [
            self.policy,
            self.cluster_role,
            self.cluster_role_binding,
            self.role,
            self.role_binding,
            self.managed,
        ]
    }

    fn select<'s>(&self, cells: [&'s str; 6]) -> Vec<&'s str> {
        cells
            .into_iter()
            .zip(self.flags())
            .filter_map(|(cell, on)| on.then_some(cell))
            .collect()
    }

    pub fn header(&self) -> Vec<&'static str> {
        self.select(HEADER)
    }

    fn wants_cluster_roles(&self) -> bool {
        self.cluster_role
    }

    fn wants_roles(&self) -> bool {
        self.role
    }
}

impl Default for ListColumns {
    fn default() -> Self {
        ListColumns::all()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListRow {
    pub policy: String,
    pub cluster_role: String,
    pub cluster_role_binding: String,
    pub role: String,
    pub role_binding: String,
    pub managed: String,
}

impl ListRow {
    pub fn cells(&self, columns: &ListColumns) -> Vec<String> {
        columns
            .select([
                self.policy.as_str(),
                self.cluster_role.as_str(),
                self.cluster_role_binding.as_str(),
                self.role.as_str(),
                self.role_binding.as_str(),
                self.managed.as_str(),
            ])
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}

pub fn list_rows(graph: &RelationshipGraph<'_>, columns: &ListColumns) -> Vec<ListRow> {
    let mut rows = Vec::new();

    for psp in &graph.policies {
        let policy = psp.name();
        let start = rows.len();

        if columns.wants_cluster_roles() {
            for cr in &psp.cluster_roles {
                let base = ListRow {
                    policy: policy.clone(),
                    cluster_role: cr.name(),
                    managed: cr.is_managed().to_string(),
                    ..Default::default()
                };
                if !cr.has_bindings() {
                    rows.push(base);
                    continue;
                }
                for crb in &cr.cluster_role_bindings {
                    rows.push(ListRow {
                        cluster_role_binding: crb.name_any(),
                        ..base.clone()
                    });
                }
                // The managed pair never uses RoleBindings.
                for rb in &cr.role_bindings {
                    rows.push(ListRow {
                        role_binding: qualified(&rb.namespace().unwrap_or_default(), &rb.name_any()),
                        managed: false.to_string(),
                        ..base.clone()
                    });
                }
            }
        }

        if columns.wants_roles() {
            for r in &psp.roles {
                let base = ListRow {
                    policy: policy.clone(),
                    role: qualified(&r.namespace(), &r.name()),
                    managed: r.is_managed().to_string(),
                    ..Default::default()
                };
                if r.role_bindings.is_empty() {
                    rows.push(base);
                    continue;
                }
                for rb in &r.role_bindings {
                    rows.push(ListRow {
                        role_binding: qualified(&r.namespace(), &rb.name_any()),
                        ..base.clone()
                    });
                }
            }
        }

        if rows.len() == start {
            rows.push(ListRow {
                policy,
                ..Default::default()
            });
        }
    }

    rows
}

/// Writes the table for `graph`, tab-aligned.
pub fn write_list<W: Write>(
    out: W,
    graph: &RelationshipGraph<'_>,
    columns: &ListColumns,
    headers: bool,
) -> io::Result<()> {
    let mut tw = TabWriter::new(out).padding(3);
    if headers {
        writeln!(tw, "{}", columns.header().join("\t"))?;
    }
    for row in list_rows(graph, columns) {
        writeln!(tw, "{}", row.cells(columns).join("\t"))?;
    }
    tw.flush()
}
