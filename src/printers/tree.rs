/*
* Copyright (C) 2025 Pedro Henrique / phkaiser13
*
* File: src/printers/tree.rs
*
* Renders the relationship graph as one box-drawn tree per policy, down to
* the subjects of every binding.
*
* SPDX-License-Identifier: Apache-2.0
*/

use super::qualified;
use crate::graph::{ClusterRoleNode, PolicyNode, RelationshipGraph, RoleNode};
use crate::subject::SubjectHolder;
use colored::{Color, Colorize};
use k8s_openapi::api::rbac::v1::Subject;
use kube::ResourceExt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TreeStyle {
    pub color: bool,
}

impl TreeStyle {
    fn paint(&self, text: &str, color: Color) -> String {
        if self.color {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeNode {
    pub label: String,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn new(label: impl Into<String>) -> Self {
        TreeNode {
            label: label.into(),
            children: Vec::new(),
        }
    }

    pub fn push(&mut self, child: TreeNode) {
        self.children.push(child);
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.label);
        out.push('\n');
        render_children(&self.children, "", &mut out);
        out
    }
}

fn render_children(children: &[TreeNode], prefix: &str, out: &mut String) {
    for (i, child) in children.iter().enumerate() {
        let last = i + 1 == children.len();
        out.push_str(prefix);
        out.push_str(if last { "└── " } else { "├── " });
        out.push_str(&child.label);
        out.push('\n');
        let nested = format!("{}{}", prefix, if last { "    " } else { "│   " });
        render_children(&child.children, &nested, out);
    }
}

fn subject_node(subject: &Subject, style: &TreeStyle) -> TreeNode {
    TreeNode::new(format!(
        "📗 Subject{{Kind: {}, Name: {}, Namespace: {}}}",
        style.paint(&subject.kind, Color::Cyan),
        style.paint(&subject.name, Color::Red),
        style.paint(subject.namespace.as_deref().unwrap_or_default(), Color::Blue),
    ))
}

fn binding_node<B: SubjectHolder>(label: String, binding: &B, style: &TreeStyle) -> TreeNode {
    let mut node = TreeNode::new(label);
    for subject in binding.subjects() {
        node.push(subject_node(subject, style));
    }
    node
}

fn cluster_role_node(cr: &ClusterRoleNode<'_>, style: &TreeStyle) -> TreeNode {
    let mut node = TreeNode::new(format!("📕 ClusterRole {}", style.paint(&cr.name(), Color::Green)));
    for crb in &cr.cluster_role_bindings {
        let label = format!("📘 ClusterRoleBinding {}", style.paint(&crb.name_any(), Color::Green));
        node.push(binding_node(label, *crb, style));
    }
    for rb in &cr.role_bindings {
        let name = qualified(&rb.namespace().unwrap_or_default(), &rb.name_any());
        let label = format!("📓 RoleBinding {}", style.paint(&name, Color::Green));
        node.push(binding_node(label, *rb, style));
    }
    node
}

fn role_node(r: &RoleNode<'_>, style: &TreeStyle) -> TreeNode {
    let name = qualified(&r.namespace(), &r.name());
    let mut node = TreeNode::new(format!("📓 Role {}", style.paint(&name, Color::Green)));
    for rb in &r.role_bindings {
        let name = qualified(&r.namespace(), &rb.name_any());
        let label = format!("📓 RoleBinding {}", style.paint(&name, Color::Green));
        node.push(binding_node(label, *rb, style));
    }
    node
}

pub fn policy_tree(psp: &PolicyNode<'_>, style: &TreeStyle) -> TreeNode {
    let mut node = TreeNode::new(format!("📙 PSP {}", style.paint(&psp.name(), Color::Green)));
    for cr in &psp.cluster_roles {
        node.push(cluster_role_node(cr, style));
    }
    for r in &psp.roles {
        node.push(role_node(r, style));
    }
    node
}

/// One rendered tree per policy, each followed by a blank line.
pub fn render_forest(graph: &RelationshipGraph<'_>, style: &TreeStyle) -> String {
    graph
        .policies
        .iter()
        .map(|psp| policy_tree(psp, style).render() + "\n")
        .collect()
}
