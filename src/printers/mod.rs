/*
* Copyright (C) 2025 Pedro Henrique / phkaiser13
*
* File: src/printers/mod.rs
*
* Presentation of the relationship graph: a tab-aligned table (`list`) and a
* nested tree (`tree`). Both only read the graph.
*
* SPDX-License-Identifier: Apache-2.0
*/

pub mod list;
pub mod tree;

pub use list::{list_rows, write_list, ListColumns, ListRow};
pub use tree::{render_forest, TreeNode, TreeStyle};

/// `namespace/name`, as namespaced objects are shown everywhere.
pub(crate) fn qualified(namespace: &str, name: &str) -> String {
    format!("{}/{}", namespace, name)
}
