//! # radix-rs
//!
//! In-memory ordered indexes built on two radix tree flavours that share
//! one root descriptor:
//!
//! - [`ByteTrie`]: a compressed (PATRICIA style) trie over arbitrary
//!   byte-string keys, with node splitting on partial prefix matches,
//!   path compression on erase and `first`/`last`/`next`/`prev` traversal.
//! - [`IndexTree`]: a fixed fan-out (64-way) trie over `u64` indices in
//!   the style of a page-cache index, growing in height on demand, with
//!   three boolean tags per entry and bounded gang lookups.
//!
//! Both are single-writer structures with no internal locking.
//!
//! ## Example
//!
//! ```rust
//! use radix_rs::{ByteTrie, IndexTree, Tag};
//!
//! let mut words: ByteTrie<String> = ByteTrie::default();
//! words.insert("abd".to_string()).unwrap();
//! words.insert("ab".to_string()).unwrap();
//! words.insert("abc".to_string()).unwrap();
//! let ordered: Vec<&str> = words.iter().map(|(_, w)| w.as_str()).collect();
//! assert_eq!(ordered, ["ab", "abc", "abd"]);
//!
//! let mut pages: IndexTree<&str> = IndexTree::new();
//! pages.insert(0, "a").unwrap();
//! pages.insert(1000, "c").unwrap();
//! pages.tag_set(1000, Tag::DIRTY).unwrap();
//! assert_eq!(pages.get(1000), Some(&"c"));
//! assert_eq!(pages.gang_lookup_tag(0, 10, Tag::DIRTY), vec![(1000, &"c")]);
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod arena;
pub mod error;
pub mod index;
mod root;
pub mod trie;

pub use error::{InsertError, RadixError, Result};
pub use index::{IndexTree, Tag};
pub use root::RadixIndex;
pub use trie::{ByteTrie, LeafId};

/// Memory usage statistics for a tree.
#[derive(Debug, Clone, Default)]
pub struct MemoryStats {
    /// Bytes used by internal nodes (slab plus spilled labels/child lists)
    pub node_bytes: usize,
    /// Bytes used by leaf / entry storage
    pub entry_bytes: usize,
    /// Number of internal nodes
    pub num_nodes: usize,
    /// Number of entries stored
    pub num_entries: usize,
    /// Bytes per entry (calculated)
    pub bytes_per_entry: f64,
}

/// Configuration shared by both tree flavours.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Initial capacity hint for node and leaf storage (0 = grow lazily)
    pub initial_capacity: usize,
}

#[cfg(test)]
mod proptests;
