//! Debug utilities for the integer tree.

use std::fmt::Write;

use super::node::{Slots, MAP_SHIFT};
use super::{IndexTree, Tag};
use crate::root::NodeId;

impl<T> IndexTree<T> {
    /// Render occupied slots, one per line, with per-node tag masks.
    ///
    /// ```text
    /// height=2
    /// node shift=6 count=2 tags=[0x8000,0x0,0x0]
    ///   [0] node shift=0 count=2 tags=[0x0,0x0,0x0]
    ///     [0] item
    ///     [1] item
    ///   [15] node shift=0 count=1 tags=[0x10000000000,0x0,0x0]
    ///     [40] item
    /// ```
    pub fn debug_tree(&self) -> String {
        let mut out = String::new();
        let Some(root) = self.root.root else {
            out.push_str("(empty)\n");
            return out;
        };
        let _ = writeln!(out, "height={}", self.root.height);

        let nodes = &self.root.nodes;
        let mut stack: Vec<(NodeId, Option<usize>, usize)> = vec![(root, None, 0)];
        while let Some((id, slot, depth)) = stack.pop() {
            let node = &nodes[id];
            out.push_str(&"  ".repeat(depth));
            if let Some(slot) = slot {
                let _ = write!(out, "[{slot}] ");
            }
            let _ = writeln!(
                out,
                "node shift={} count={} tags=[{:#x},{:#x},{:#x}]",
                node.shift, node.count, node.tags[0], node.tags[1], node.tags[2]
            );
            match &node.slots {
                Slots::Interior(children) => {
                    for (offset, child) in children.iter().enumerate().rev() {
                        if let Some(child) = child {
                            stack.push((*child, Some(offset), depth + 1));
                        }
                    }
                }
                Slots::Leaf(items) => {
                    for (offset, _) in items.iter().enumerate().filter(|(_, i)| i.is_some()) {
                        out.push_str(&"  ".repeat(depth + 1));
                        let _ = writeln!(out, "[{offset}] item");
                    }
                }
            }
        }
        out
    }

    /// Verify tree integrity - returns list of issues found.
    ///
    /// Checks level shifts, occupied-slot counts, the entry count and that
    /// every interior tag bit is set exactly when its child carries the tag.
    pub fn verify(&self) -> Vec<String> {
        let mut issues = Vec::new();
        let nodes = &self.root.nodes;

        let Some(root) = self.root.root else {
            if self.len != 0 {
                issues.push(format!("empty root but len is {}", self.len));
            }
            if self.root.height != 0 {
                issues.push(format!("empty root but height is {}", self.root.height));
            }
            return issues;
        };

        if nodes[root].shift != (self.root.height - 1) * MAP_SHIFT {
            issues.push(format!(
                "root shift {} does not match height {}",
                nodes[root].shift, self.root.height
            ));
        }

        let mut entries = 0usize;
        let mut reached = 0usize;
        let mut stack: Vec<(NodeId, u64)> = vec![(root, 0)];
        while let Some((id, base)) = stack.pop() {
            reached += 1;
            let node = &nodes[id];
            let mut occupied = 0usize;

            match &node.slots {
                Slots::Leaf(items) => {
                    if node.shift != 0 {
                        issues.push(format!("item slots at shift {} (base {base})", node.shift));
                    }
                    for (offset, item) in items.iter().enumerate() {
                        if item.is_some() {
                            occupied += 1;
                            continue;
                        }
                        for tag in Tag::ALL {
                            if node.tag_get(tag, offset) {
                                issues.push(format!(
                                    "empty index {} carries tag {}",
                                    base + offset as u64,
                                    tag.index()
                                ));
                            }
                        }
                    }
                }
                Slots::Interior(children) => {
                    if node.shift == 0 {
                        issues.push(format!("child slots at shift 0 (base {base})"));
                    }
                    for (offset, child) in children.iter().enumerate() {
                        let Some(child) = *child else {
                            for tag in Tag::ALL {
                                if node.tag_get(tag, offset) {
                                    issues.push(format!("empty slot {offset} under {base} tagged"));
                                }
                            }
                            continue;
                        };
                        occupied += 1;
                        let Some(child_node) = nodes.get(child) else {
                            issues.push(format!("stale child in slot {offset} under {base}"));
                            continue;
                        };
                        if child_node.shift + MAP_SHIFT != node.shift {
                            issues.push(format!(
                                "child shift {} under parent shift {}",
                                child_node.shift, node.shift
                            ));
                        }
                        for tag in Tag::ALL {
                            if node.tag_get(tag, offset) != child_node.any_tag(tag) {
                                issues.push(format!(
                                    "tag {} in slot {offset} under {base} out of sync",
                                    tag.index()
                                ));
                            }
                        }
                        stack.push((child, base | ((offset as u64) << node.shift)));
                    }
                }
            }

            if occupied != node.count as usize {
                issues.push(format!(
                    "node at {base} counts {} but holds {occupied}",
                    node.count
                ));
            }
            if matches!(node.slots, Slots::Leaf(_)) {
                entries += occupied;
            }
        }

        if entries != self.len {
            issues.push(format!("found {entries} entries but len is {}", self.len));
        }
        if reached != self.root.node_count() {
            issues.push(format!(
                "reached {reached} nodes but {} are allocated",
                self.root.node_count()
            ));
        }
        issues
    }
}
