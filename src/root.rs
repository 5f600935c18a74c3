//! Root descriptor shared by both tree flavours.

use crate::arena::{Arena, ArenaId};
use crate::{Config, MemoryStats};

pub(crate) type NodeId = ArenaId;

/// Behaviour every node type stored under a [`Root`] provides.
pub(crate) trait RadixNode {
    /// Heap bytes owned by the node outside its arena slot.
    fn heap_bytes(&self) -> usize;
}

/// Root node handle, height and node storage.
///
/// `root == None` is the empty tree in both modes. `height` is only
/// meaningful for the integer tree; the byte trie leaves it at zero.
pub(crate) struct Root<N> {
    pub(crate) nodes: Arena<N>,
    pub(crate) root: Option<NodeId>,
    pub(crate) height: u32,
}

impl<N: RadixNode> Root<N> {
    pub(crate) fn new(config: &Config) -> Self {
        Self {
            nodes: Arena::with_capacity(config.initial_capacity),
            root: None,
            height: 0,
        }
    }

    /// Drop every node and return to the empty state.
    pub(crate) fn reset(&mut self) {
        self.nodes.clear();
        self.root = None;
        self.height = 0;
    }

    pub(crate) fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn node_bytes(&self) -> usize {
        self.nodes.slab_bytes()
            + self
                .nodes
                .iter()
                .map(|(_, node)| node.heap_bytes())
                .sum::<usize>()
    }
}

/// Operations common to [`ByteTrie`](crate::ByteTrie) and
/// [`IndexTree`](crate::IndexTree).
pub trait RadixIndex {
    /// Number of entries in the tree.
    fn len(&self) -> usize;

    /// Whether the tree holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of internal nodes currently allocated.
    fn node_count(&self) -> usize;

    /// Memory usage statistics.
    fn memory_usage(&self) -> MemoryStats;
}

pub(crate) fn stats(entries: usize, nodes: usize, node_bytes: usize, entry_bytes: usize) -> MemoryStats {
    let total = node_bytes + entry_bytes;
    MemoryStats {
        node_bytes,
        entry_bytes,
        num_nodes: nodes,
        num_entries: entries,
        bytes_per_entry: if entries > 0 {
            total as f64 / entries as f64
        } else {
            0.0
        },
    }
}
