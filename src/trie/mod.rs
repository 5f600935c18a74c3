//! Compressed byte trie (PATRICIA / radix style).
//!
//! Keys are arbitrary byte strings extracted from the stored leaves by a
//! caller-supplied callback. Chains of single-child nodes are collapsed
//! into one node carrying a multi-byte label:
//!
//! ```text
//! insert "romane", "romanus", "rubens"
//!
//!            (root)
//!              |
//!             "r"
//!            /   \
//!        "oman"  "ubens"*
//!         /   \
//!      "e"*   "us"*
//! ```
//!
//! Each leaf keeps a back-reference to the node that terminates it, so
//! [`ByteTrie::erase`], [`ByteTrie::next`] and [`ByteTrie::prev`] start
//! from the leaf instead of re-descending from the root.

mod debug;
mod iter;
pub(crate) mod node;

use std::fmt;

use tracing::{debug, trace};

use crate::arena::{Arena, ArenaId};
use crate::error::{InsertError, RadixError, Result};
use crate::root::{stats, NodeId, RadixIndex, Root};
use crate::{Config, MemoryStats};

pub use iter::Iter;
use node::{common_prefix, TrieNode};

/// Handle to a leaf stored in a [`ByteTrie`].
///
/// Returned by [`ByteTrie::insert`]; valid until the leaf is erased or the
/// trie is cleared.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LeafId(ArenaId);

/// Key extraction callback: returns the key bytes of a leaf.
pub type KeyFn<T> = Box<dyn for<'a> Fn(&'a T) -> &'a [u8]>;

/// Destructor callback invoked once per leaf by [`ByteTrie::destroy`].
pub type DestructorFn<T> = Box<dyn FnMut(T)>;

struct Leaf<T> {
    value: T,
    /// Node this leaf terminates at.
    term: NodeId,
}

/// A compressed trie over byte-string keys.
///
/// The trie owns its leaves but never looks inside them except through the
/// key callback. Two leaves with equal keys cannot be members at once.
///
/// ```rust
/// use radix_rs::ByteTrie;
///
/// struct User {
///     name: String,
///     id: u32,
/// }
///
/// let mut trie = ByteTrie::new(|u: &User| u.name.as_bytes());
/// trie.insert(User { name: "bob".into(), id: 2 }).unwrap();
/// let alice = trie.insert(User { name: "alice".into(), id: 1 }).unwrap();
///
/// assert_eq!(trie.first(), Some(alice));
/// assert_eq!(trie.get_by_key(b"bob").map(|u| u.id), Some(2));
/// ```
pub struct ByteTrie<T> {
    root: Root<TrieNode>,
    leaves: Arena<Leaf<T>>,
    get_key: KeyFn<T>,
    destructor: Option<DestructorFn<T>>,
}

impl<T> ByteTrie<T> {
    /// Create an empty trie using `get_key` to read each leaf's key.
    ///
    /// The returned slice must stay unchanged while the leaf is a member.
    pub fn new<F>(get_key: F) -> Self
    where
        F: for<'a> Fn(&'a T) -> &'a [u8] + 'static,
    {
        Self::with_config(get_key, Config::default())
    }

    /// Create an empty trie with the given configuration.
    pub fn with_config<F>(get_key: F, config: Config) -> Self
    where
        F: for<'a> Fn(&'a T) -> &'a [u8] + 'static,
    {
        Self {
            root: Root::new(&config),
            leaves: Arena::with_capacity(config.initial_capacity),
            get_key: Box::new(get_key),
            destructor: None,
        }
    }

    /// Register the callback [`ByteTrie::destroy`] hands every leaf to.
    pub fn with_destructor<D>(mut self, destructor: D) -> Self
    where
        D: FnMut(T) + 'static,
    {
        self.destructor = Some(Box::new(destructor));
        self
    }

    /// Number of leaves in the trie.
    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    /// Whether the trie holds no leaves.
    pub fn is_empty(&self) -> bool {
        self.leaves.len() == 0
    }

    /// Key bytes of `leaf` as seen by this trie.
    pub fn key_of<'a>(&self, leaf: &'a T) -> &'a [u8] {
        (self.get_key)(leaf)
    }

    /// The leaf behind `id`, if it is still a member.
    pub fn get(&self, id: LeafId) -> Option<&T> {
        self.leaves.get(id.0).map(|leaf| &leaf.value)
    }

    /// The leaf stored under `key`.
    pub fn get_by_key(&self, key: &[u8]) -> Option<&T> {
        self.search_key(key).and_then(|id| self.get(id))
    }

    /// Whether a leaf with exactly this key is present.
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.search_key(key).is_some()
    }

    /// Whether `id` names a current member.
    pub fn contains(&self, id: LeafId) -> bool {
        self.leaves.contains(id.0)
    }

    // =========================================================================
    // Insert
    // =========================================================================

    /// Insert `leaf` under the key the callback extracts from it.
    ///
    /// On failure the leaf is handed back inside the error and the trie is
    /// unchanged:
    /// - [`RadixError::DuplicateKey`] if a leaf with the same key is present
    /// - [`RadixError::AllocationFailure`] if the node or leaf slab cannot
    ///   grow (labels longer than the inline buffer spill to the heap
    ///   infallibly)
    pub fn insert(&mut self, leaf: T) -> std::result::Result<LeafId, InsertError<T>> {
        // Root creation, one split and one new branch at most.
        if let Err(err) = self.root.nodes.reserve(3) {
            return Err(InsertError::new(err, leaf));
        }
        if let Err(err) = self.leaves.reserve(1) {
            return Err(InsertError::new(err, leaf));
        }

        let key = (self.get_key)(&leaf);
        let term = match self.descend_and_split(key) {
            Ok(term) => term,
            Err(kind) => return Err(InsertError::new(kind, leaf)),
        };

        let id = LeafId(self.leaves.insert(Leaf { value: leaf, term }));
        self.root.nodes[term].leaf = Some(id);
        Ok(id)
    }

    /// Walk `key` down from the root, splitting a child whose label only
    /// partially matches, and return the node the key terminates at.
    ///
    /// A duplicate is only possible along a path of full label matches, so
    /// the tree is untouched when this returns `DuplicateKey`.
    fn descend_and_split(&mut self, key: &[u8]) -> Result<NodeId> {
        let mut node = match self.root.root {
            Some(root) => root,
            None => {
                let root = self.root.nodes.insert(TrieNode::root());
                self.root.root = Some(root);
                root
            }
        };
        let mut rest = key;

        loop {
            let Some(&first) = rest.first() else {
                if self.root.nodes[node].leaf.is_some() {
                    return Err(RadixError::DuplicateKey);
                }
                return Ok(node);
            };

            match self.child_position(node, first) {
                Err(pos) => {
                    let child = self.root.nodes.insert(TrieNode::with_label(node, rest));
                    self.root.nodes[node].children.insert(pos, child);
                    return Ok(child);
                }
                Ok(pos) => {
                    let child = self.root.nodes[node].children[pos];
                    let label = &self.root.nodes[child].label;
                    let common = common_prefix(label, rest);
                    if common < label.len() {
                        node = self.split(node, pos, child, common);
                    } else {
                        node = child;
                    }
                    rest = &rest[common..];
                }
            }
        }
    }

    /// Cut `child`'s label after `at` bytes: a new node holding the prefix
    /// takes `child`'s place under `parent` and adopts `child` with the
    /// remaining suffix.
    fn split(&mut self, parent: NodeId, pos: usize, child: NodeId, at: usize) -> NodeId {
        let nodes = &mut self.root.nodes;
        let mut mid = TrieNode::with_label(parent, &nodes[child].label[..at]);
        mid.children.push(child);
        let mid = nodes.insert(mid);

        let child_node = &mut nodes[child];
        child_node.label.drain(..at);
        child_node.parent = Some(mid);
        nodes[parent].children[pos] = mid;

        trace!(at, "split trie node");
        mid
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// Find the leaf whose key equals `key` exactly.
    pub fn search_key(&self, key: &[u8]) -> Option<LeafId> {
        let nodes = &self.root.nodes;
        let mut node = self.root.root?;
        let mut rest = key;

        while let Some(&first) = rest.first() {
            let pos = self.child_position(node, first).ok()?;
            let child = nodes[node].children[pos];
            let label = nodes[child].label.as_slice();
            if !rest.starts_with(label) {
                return None;
            }
            rest = &rest[label.len()..];
            node = child;
        }

        nodes[node].leaf
    }

    /// Find the member whose key equals the key of `probe`.
    pub fn search_by_leaf(&self, probe: &T) -> Option<LeafId> {
        self.search_key((self.get_key)(probe))
    }

    /// Position of the child starting with `byte`, or where it would go.
    fn child_position(&self, node: NodeId, byte: u8) -> std::result::Result<usize, usize> {
        let nodes = &self.root.nodes;
        nodes[node]
            .children
            .binary_search_by(|&child| nodes[child].first_byte().cmp(&byte))
    }

    fn position_in_parent(&self, parent: NodeId, child: NodeId) -> usize {
        let nodes = &self.root.nodes;
        match self.child_position(parent, nodes[child].first_byte()) {
            Ok(pos) => pos,
            Err(_) => unreachable!("child missing from parent's child list"),
        }
    }

    // =========================================================================
    // Erase
    // =========================================================================

    /// Remove the leaf behind `id` and return it.
    ///
    /// Locates the leaf through its back-reference; no search is done.
    /// Returns [`RadixError::NotFound`] if `id` is no longer a member.
    pub fn erase(&mut self, id: LeafId) -> Result<T> {
        let leaf = self.leaves.remove(id.0).ok_or(RadixError::NotFound)?;
        debug_assert_eq!(self.root.nodes[leaf.term].leaf, Some(id));
        self.root.nodes[leaf.term].leaf = None;
        self.compact_from(leaf.term);
        Ok(leaf.value)
    }

    /// Remove the leaf stored under `key`.
    pub fn erase_key(&mut self, key: &[u8]) -> Result<T> {
        let id = self.search_key(key).ok_or(RadixError::NotFound)?;
        self.erase(id)
    }

    /// Restore the compression invariants after `node` lost its leaf.
    fn compact_from(&mut self, mut node: NodeId) {
        while self.root.nodes[node].is_vacant() {
            let Some(parent) = self.root.nodes[node].parent else {
                break;
            };
            let pos = self.position_in_parent(parent, node);
            self.root.nodes[parent].children.remove(pos);
            self.root.nodes.remove(node);
            trace!("pruned trie node");
            node = parent;
        }

        self.merge_single_child(node);

        if let Some(root) = self.root.root {
            if self.root.nodes[root].is_vacant() {
                self.root.reset();
            }
        }
    }

    /// Fold a leafless non-root node with one child into that child.
    fn merge_single_child(&mut self, node: NodeId) {
        let nodes = &self.root.nodes;
        let n = &nodes[node];
        let Some(parent) = n.parent else {
            return;
        };
        if n.leaf.is_some() || n.children.len() != 1 {
            return;
        }

        let child = n.children[0];
        let pos = self.position_in_parent(parent, node);
        let nodes = &mut self.root.nodes;
        let Some(removed) = nodes.remove(node) else {
            return;
        };

        let mut label = removed.label;
        label.extend_from_slice(&nodes[child].label);
        let child_node = &mut nodes[child];
        child_node.label = label;
        child_node.parent = Some(parent);
        nodes[parent].children[pos] = child;

        trace!("merged trie node into only child");
    }

    // =========================================================================
    // Ordered traversal
    // =========================================================================

    /// Smallest leaf in key order.
    pub fn first(&self) -> Option<LeafId> {
        self.subtree_min(self.root.root?)
    }

    /// Largest leaf in key order.
    pub fn last(&self) -> Option<LeafId> {
        self.subtree_max(self.root.root?)
    }

    /// Leaf following `id` in key order.
    pub fn next(&self, id: LeafId) -> Option<LeafId> {
        let nodes = &self.root.nodes;
        let mut node = self.leaves.get(id.0)?.term;

        if let Some(&child) = nodes[node].children.first() {
            return self.subtree_min(child);
        }

        while let Some(parent) = nodes[node].parent {
            let pos = self.position_in_parent(parent, node);
            if let Some(&sibling) = nodes[parent].children.get(pos + 1) {
                return self.subtree_min(sibling);
            }
            node = parent;
        }
        None
    }

    /// Leaf preceding `id` in key order.
    pub fn prev(&self, id: LeafId) -> Option<LeafId> {
        let nodes = &self.root.nodes;
        let mut node = self.leaves.get(id.0)?.term;

        while let Some(parent) = nodes[node].parent {
            let pos = self.position_in_parent(parent, node);
            if pos > 0 {
                return self.subtree_max(nodes[parent].children[pos - 1]);
            }
            // A prefix sorts before everything below it.
            if let Some(leaf) = nodes[parent].leaf {
                return Some(leaf);
            }
            node = parent;
        }
        None
    }

    /// A node's own leaf comes before its descendants.
    fn subtree_min(&self, mut node: NodeId) -> Option<LeafId> {
        let nodes = &self.root.nodes;
        loop {
            let n = &nodes[node];
            if n.leaf.is_some() {
                return n.leaf;
            }
            node = *n.children.first()?;
        }
    }

    fn subtree_max(&self, mut node: NodeId) -> Option<LeafId> {
        let nodes = &self.root.nodes;
        loop {
            let n = &nodes[node];
            match n.children.last() {
                Some(&child) => node = child,
                None => return n.leaf,
            }
        }
    }

    /// Iterate over `(id, leaf)` pairs in key order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self)
    }

    // =========================================================================
    // Clear / destroy
    // =========================================================================

    /// Detach every leaf and free all nodes. The leaves are returned in key
    /// order; the destructor is not called.
    pub fn clear(&mut self) -> Vec<T> {
        let mut ids = Vec::with_capacity(self.len());
        let mut cursor = self.first();
        while let Some(id) = cursor {
            ids.push(id);
            cursor = self.next(id);
        }

        let leaves: Vec<T> = ids
            .into_iter()
            .filter_map(|id| self.leaves.remove(id.0))
            .map(|leaf| leaf.value)
            .collect();
        debug!(leaves = leaves.len(), nodes = self.root.node_count(), "cleared byte trie");

        self.root.reset();
        leaves
    }

    /// Free all nodes and hand every leaf to the registered destructor.
    ///
    /// Without a destructor the leaves are dropped.
    pub fn destroy(&mut self) {
        let leaves = self.clear();
        let count = leaves.len();
        match self.destructor.as_mut() {
            Some(destructor) => {
                for leaf in leaves {
                    destructor(leaf);
                }
            }
            None => drop(leaves),
        }
        debug!(leaves = count, "destroyed byte trie");
    }

    /// Memory usage statistics.
    pub fn memory_usage(&self) -> MemoryStats {
        let entry_bytes = self.leaves.slab_bytes();
        stats(
            self.len(),
            self.root.node_count(),
            self.root.node_bytes(),
            entry_bytes,
        )
    }
}

impl<T: AsRef<[u8]> + 'static> Default for ByteTrie<T> {
    /// A trie keyed by the leaves' own bytes.
    fn default() -> Self {
        Self::new(|leaf: &T| leaf.as_ref())
    }
}

impl<T> RadixIndex for ByteTrie<T> {
    fn len(&self) -> usize {
        ByteTrie::len(self)
    }

    fn node_count(&self) -> usize {
        self.root.node_count()
    }

    fn memory_usage(&self) -> MemoryStats {
        ByteTrie::memory_usage(self)
    }
}

impl<T: fmt::Debug> fmt::Debug for ByteTrie<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter().map(|(_, leaf)| leaf)).finish()
    }
}
