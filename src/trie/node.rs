//! Compressed trie node.

use smallvec::SmallVec;

use crate::root::{NodeId, RadixNode};
use crate::LeafId;

/// Label bytes stored inline up to this length.
pub(crate) const INLINE_LABEL: usize = 16;

pub(crate) type Label = SmallVec<[u8; INLINE_LABEL]>;

/// A node of the compressed byte trie.
///
/// Children are kept sorted by the first byte of their label. Siblings
/// never share a first byte, so this is also the lexicographic order of
/// the labels.
pub(crate) struct TrieNode {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: SmallVec<[NodeId; 4]>,
    /// Bytes on the edge from the parent. Empty only on the root.
    pub(crate) label: Label,
    /// Leaf whose key ends exactly here.
    pub(crate) leaf: Option<LeafId>,
}

impl TrieNode {
    pub(crate) fn root() -> Self {
        Self {
            parent: None,
            children: SmallVec::new(),
            label: Label::new(),
            leaf: None,
        }
    }

    pub(crate) fn with_label(parent: NodeId, label: &[u8]) -> Self {
        debug_assert!(!label.is_empty());
        Self {
            parent: Some(parent),
            children: SmallVec::new(),
            label: Label::from_slice(label),
            leaf: None,
        }
    }

    /// First label byte, the sort key among siblings.
    #[inline]
    pub(crate) fn first_byte(&self) -> u8 {
        self.label[0]
    }

    /// No leaf and no children: the node can be pruned.
    #[inline]
    pub(crate) fn is_vacant(&self) -> bool {
        self.leaf.is_none() && self.children.is_empty()
    }
}

impl RadixNode for TrieNode {
    fn heap_bytes(&self) -> usize {
        let label = if self.label.spilled() {
            self.label.capacity()
        } else {
            0
        };
        let children = if self.children.spilled() {
            self.children.capacity() * std::mem::size_of::<NodeId>()
        } else {
            0
        };
        label + children
    }
}

/// Length of the longest common prefix of `a` and `b`.
#[inline]
pub(crate) fn common_prefix(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}
