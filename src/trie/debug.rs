//! Debug utilities for byte trie troubleshooting.

use std::fmt::Write;

use super::node::TrieNode;
use super::ByteTrie;
use crate::root::NodeId;

fn escape_label(label: &[u8], out: &mut String) {
    for &b in label {
        if (0x20..0x7f).contains(&b) {
            out.push(b as char);
        } else {
            let _ = write!(out, "\\x{b:02x}");
        }
    }
}

impl<T> ByteTrie<T> {
    /// Render the node structure, one node per line, children indented.
    ///
    /// ```text
    /// node label="" leaf=no
    ///   node label="ab" leaf=yes
    ///     node label="c" leaf=yes
    /// ```
    pub fn debug_tree(&self) -> String {
        let mut out = String::new();
        let Some(root) = self.root.root else {
            out.push_str("(empty)\n");
            return out;
        };

        let nodes = &self.root.nodes;
        let mut stack: Vec<(NodeId, usize)> = vec![(root, 0)];
        while let Some((id, depth)) = stack.pop() {
            let node = &nodes[id];
            out.push_str(&"  ".repeat(depth));
            out.push_str("node label=\"");
            escape_label(&node.label, &mut out);
            out.push_str("\" leaf=");
            out.push_str(if node.leaf.is_some() { "yes\n" } else { "no\n" });
            for &child in node.children.iter().rev() {
                stack.push((child, depth + 1));
            }
        }
        out
    }

    /// Verify tree integrity - returns list of issues found.
    ///
    /// Checks parent links, sibling order, label and compression invariants,
    /// leaf back-references and that every leaf's key spells its path.
    pub fn verify(&self) -> Vec<String> {
        let mut issues = Vec::new();
        let nodes = &self.root.nodes;

        let Some(root) = self.root.root else {
            if self.len() != 0 {
                issues.push(format!("empty root but {} leaves", self.len()));
            }
            if self.root.node_count() != 0 {
                issues.push(format!("empty root but {} nodes", self.root.node_count()));
            }
            return issues;
        };

        if nodes[root].parent.is_some() {
            issues.push("root has a parent".to_string());
        }
        if !nodes[root].label.is_empty() {
            issues.push("root label is not empty".to_string());
        }
        if nodes[root].is_vacant() {
            issues.push("root is vacant".to_string());
        }

        let mut reached_nodes = 0usize;
        let mut reached_leaves = 0usize;
        let mut stack: Vec<(NodeId, Vec<u8>)> = vec![(root, Vec::new())];

        while let Some((id, path)) = stack.pop() {
            reached_nodes += 1;
            let node: &TrieNode = &nodes[id];

            if id != root {
                if node.label.is_empty() {
                    issues.push(format!("non-root node at {path:?} has empty label"));
                }
                if node.is_vacant() {
                    issues.push(format!("node at {path:?} has no leaf and no children"));
                }
                if node.leaf.is_none() && node.children.len() == 1 {
                    issues.push(format!("node at {path:?} should be merged into its child"));
                }
            }

            if let Some(leaf_id) = node.leaf {
                reached_leaves += 1;
                match self.leaves.get(leaf_id.0) {
                    Some(leaf) => {
                        if leaf.term != id {
                            issues.push(format!("leaf at {path:?} points at another node"));
                        }
                        if (self.get_key)(&leaf.value) != path.as_slice() {
                            issues.push(format!("leaf key differs from path {path:?}"));
                        }
                    }
                    None => issues.push(format!("node at {path:?} holds a stale leaf")),
                }
            }

            let mut prev: Option<u8> = None;
            for &child in &node.children {
                let Some(child_node) = nodes.get(child) else {
                    issues.push(format!("node at {path:?} has a stale child"));
                    continue;
                };
                if child_node.parent != Some(id) {
                    issues.push(format!("child of {path:?} has wrong parent"));
                }
                if let Some(&first) = child_node.label.first() {
                    if prev.is_some_and(|p| p >= first) {
                        issues.push(format!("children of {path:?} out of order"));
                    }
                    prev = Some(first);
                }
                let mut child_path = path.clone();
                child_path.extend_from_slice(&child_node.label);
                stack.push((child, child_path));
            }
        }

        if reached_leaves != self.len() {
            issues.push(format!(
                "reached {reached_leaves} leaves but len is {}",
                self.len()
            ));
        }
        if reached_nodes != self.root.node_count() {
            issues.push(format!(
                "reached {reached_nodes} nodes but {} are allocated",
                self.root.node_count()
            ));
        }
        issues
    }
}
