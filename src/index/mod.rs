//! Fixed fan-out integer radix tree.
//!
//! A page-cache style index over `u64` keys. Every node has 64 slots and
//! decodes six bits of the index; a tree of height `h` covers indices
//! `0..64^h`. The height grows on demand by pushing the current root down
//! into slot 0 of a new top node.
//!
//! ```text
//! height 2, index 1000 = 0b001111_101000
//!
//!   root (shift 6)   slot 15 ──► node (shift 0)   slot 40 ──► item
//! ```
//!
//! Each entry carries up to [`MAX_TAGS`] boolean tags. A tag bit on an
//! interior slot means "some entry below this slot carries the tag", which
//! makes [`IndexTree::tagged`] and tag-filtered gang lookups skip whole
//! untagged subtrees.

mod debug;
mod gang;
mod node;

use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::error::{RadixError, Result};
use crate::root::{stats, NodeId, RadixIndex, Root};
use crate::{Config, MemoryStats};

pub use gang::{Iter, IterMut};
pub use node::{Tag, MAP_SHIFT, MAP_SIZE, MAX_HEIGHT, MAX_TAGS};
use node::{height_for, max_index_for, slot_offset, SlotNode, Slots};

/// Root-to-bottom path: each node with the slot offset taken in it.
type Path = SmallVec<[(NodeId, usize); MAX_HEIGHT as usize]>;

/// A 64-way radix tree keyed by `u64` indices.
///
/// ```rust
/// use radix_rs::IndexTree;
///
/// let mut tree = IndexTree::new();
/// tree.insert(0, "a").unwrap();
/// tree.insert(1, "b").unwrap();
/// tree.insert(1000, "c").unwrap();
///
/// assert_eq!(tree.get(999), None);
/// assert_eq!(tree.get(1000), Some(&"c"));
/// assert_eq!(tree.delete(1), Ok("b"));
/// assert_eq!(tree.height(), 2);
/// ```
pub struct IndexTree<T> {
    root: Root<SlotNode<T>>,
    len: usize,
}

impl<T> IndexTree<T> {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create an empty tree with the given configuration.
    pub fn with_config(config: Config) -> Self {
        let config = Config {
            initial_capacity: config.initial_capacity.div_ceil(MAP_SIZE),
        };
        Self {
            root: Root::new(&config),
            len: 0,
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the tree holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current number of levels. Zero for a tree that never held an entry.
    ///
    /// Height only grows; deleting entries never lowers it.
    pub fn height(&self) -> u32 {
        self.root.height
    }

    /// Largest index representable at the current height.
    pub fn max_index(&self) -> u64 {
        max_index_for(self.root.height)
    }

    // =========================================================================
    // Insert
    // =========================================================================

    /// Store `item` at `index`.
    ///
    /// Fails with [`RadixError::DuplicateKey`] if the slot is occupied and
    /// [`RadixError::AllocationFailure`] if the node slab cannot grow; the
    /// tree is unchanged in both cases. The 64-slot arrays of new nodes are
    /// boxed infallibly and abort on out-of-memory like any `Box::new`.
    pub fn insert(&mut self, index: u64, item: T) -> Result<()> {
        if self.contains_key(index) {
            return Err(RadixError::DuplicateKey);
        }
        let needed = height_for(index);
        let growth = needed.saturating_sub(self.root.height);
        self.root
            .nodes
            .reserve((growth + self.root.height.max(needed)) as usize)?;

        self.extend(needed);

        let mut node = match self.root.root {
            Some(root) => root,
            None => unreachable!("extend always leaves a root"),
        };
        loop {
            let shift = self.root.nodes[node].shift;
            let offset = slot_offset(index, shift);

            if shift == 0 {
                let n = &mut self.root.nodes[node];
                if let Slots::Leaf(items) = &mut n.slots {
                    items[offset] = Some(item);
                    n.count += 1;
                    self.len += 1;
                }
                return Ok(());
            }

            node = match self.root.nodes[node].child(offset) {
                Some(child) => child,
                None => {
                    let child = self.root.nodes.insert(SlotNode::new(shift - MAP_SHIFT));
                    let n = &mut self.root.nodes[node];
                    if let Slots::Interior(children) = &mut n.slots {
                        children[offset] = Some(child);
                    }
                    n.count += 1;
                    child
                }
            };
        }
    }

    /// Grow the tree until it has at least `needed` levels.
    fn extend(&mut self, needed: u32) {
        let Some(mut top) = self.root.root else {
            let root = self.root.nodes.insert(SlotNode::new((needed - 1) * MAP_SHIFT));
            self.root.root = Some(root);
            self.root.height = needed;
            trace!(height = needed, "created index tree root");
            return;
        };

        while self.root.height < needed {
            let mut node = SlotNode::new(self.root.height * MAP_SHIFT);
            if let Slots::Interior(children) = &mut node.slots {
                children[0] = Some(top);
            }
            node.count = 1;
            for tag in Tag::ALL {
                if self.root.nodes[top].any_tag(tag) {
                    node.tag_set(tag, 0);
                }
            }

            top = self.root.nodes.insert(node);
            self.root.root = Some(top);
            self.root.height += 1;
            trace!(height = self.root.height, "grew index tree");
        }
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Bottom-level node covering `index`, without creating anything.
    fn bottom_node(&self, index: u64) -> Option<NodeId> {
        if index > self.max_index() {
            return None;
        }
        let nodes = &self.root.nodes;
        let mut node = self.root.root?;
        loop {
            let n = &nodes[node];
            if n.shift == 0 {
                return Some(node);
            }
            node = n.child(slot_offset(index, n.shift))?;
        }
    }

    /// Path from the root to the bottom-level node covering `index`.
    fn path(&self, index: u64) -> Option<Path> {
        if index > self.max_index() {
            return None;
        }
        let nodes = &self.root.nodes;
        let mut path = Path::new();
        let mut node = self.root.root?;
        loop {
            let n = &nodes[node];
            let offset = slot_offset(index, n.shift);
            path.push((node, offset));
            if n.shift == 0 {
                return Some(path);
            }
            node = n.child(offset)?;
        }
    }

    /// The item stored at `index`.
    pub fn get(&self, index: u64) -> Option<&T> {
        let node = self.bottom_node(index)?;
        match &self.root.nodes[node].slots {
            Slots::Leaf(items) => items[slot_offset(index, 0)].as_ref(),
            Slots::Interior(_) => None,
        }
    }

    /// Mutable access to the item stored at `index`.
    pub fn get_mut(&mut self, index: u64) -> Option<&mut T> {
        let node = self.bottom_node(index)?;
        match &mut self.root.nodes[node].slots {
            Slots::Leaf(items) => items[slot_offset(index, 0)].as_mut(),
            Slots::Interior(_) => None,
        }
    }

    /// Whether an item is stored at `index`.
    pub fn contains_key(&self, index: u64) -> bool {
        self.get(index).is_some()
    }

    // =========================================================================
    // Delete
    // =========================================================================

    /// Remove and return the item at `index`.
    ///
    /// All tags of the entry are cleared. Emptied nodes are kept and the
    /// height does not shrink.
    pub fn delete(&mut self, index: u64) -> Result<T> {
        let path = self.path(index).ok_or(RadixError::NotFound)?;
        let &(bottom, offset) = path.last().ok_or(RadixError::NotFound)?;

        let n = &mut self.root.nodes[bottom];
        let item = match &mut n.slots {
            Slots::Leaf(items) => items[offset].take(),
            Slots::Interior(_) => None,
        }
        .ok_or(RadixError::NotFound)?;
        n.count -= 1;
        self.len -= 1;

        for tag in Tag::ALL {
            self.retract_tag(&path, tag);
        }
        Ok(item)
    }

    /// Drop every entry and node. The height returns to zero.
    pub fn clear(&mut self) {
        debug!(entries = self.len, nodes = self.root.node_count(), "cleared index tree");
        self.root.reset();
        self.len = 0;
    }

    // =========================================================================
    // Tags
    // =========================================================================

    /// Set `tag` on the entry at `index` and on every slot above it.
    ///
    /// Returns the tagged item, or [`RadixError::NotFound`].
    pub fn tag_set(&mut self, index: u64, tag: Tag) -> Result<&T> {
        let path = self.present_path(index)?;
        for &(node, offset) in &path {
            self.root.nodes[node].tag_set(tag, offset);
        }
        self.get(index).ok_or(RadixError::NotFound)
    }

    /// Clear `tag` on the entry at `index`.
    ///
    /// Ancestor bits are cleared too, up to the first node that still has
    /// another slot carrying the tag.
    pub fn tag_clear(&mut self, index: u64, tag: Tag) -> Result<&T> {
        let path = self.present_path(index)?;
        self.retract_tag(&path, tag);
        self.get(index).ok_or(RadixError::NotFound)
    }

    /// Whether the entry at `index` carries `tag`.
    pub fn tag_get(&self, index: u64, tag: Tag) -> bool {
        match self.bottom_node(index) {
            Some(node) => {
                self.contains_key(index)
                    && self.root.nodes[node].tag_get(tag, slot_offset(index, 0))
            }
            None => false,
        }
    }

    /// Whether any entry in the tree carries `tag`.
    pub fn tagged(&self, tag: Tag) -> bool {
        self.root
            .root
            .is_some_and(|root| self.root.nodes[root].any_tag(tag))
    }

    fn present_path(&self, index: u64) -> Result<Path> {
        if !self.contains_key(index) {
            return Err(RadixError::NotFound);
        }
        self.path(index).ok_or(RadixError::NotFound)
    }

    /// Clear `tag` bottom-up along `path`, stopping at the first node that
    /// still carries the tag elsewhere.
    fn retract_tag(&mut self, path: &Path, tag: Tag) {
        for &(node, offset) in path.iter().rev() {
            let n = &mut self.root.nodes[node];
            n.tag_clear(tag, offset);
            if n.any_tag(tag) {
                break;
            }
        }
    }

    /// Memory usage statistics.
    pub fn memory_usage(&self) -> MemoryStats {
        stats(
            self.len,
            self.root.node_count(),
            self.root.node_bytes(),
            self.len * std::mem::size_of::<T>(),
        )
    }
}

impl<T> Default for IndexTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RadixIndex for IndexTree<T> {
    fn len(&self) -> usize {
        self.len
    }

    fn node_count(&self) -> usize {
        self.root.node_count()
    }

    fn memory_usage(&self) -> MemoryStats {
        IndexTree::memory_usage(self)
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for IndexTree<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
