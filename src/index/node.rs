//! Fixed fan-out node and tag definitions.

use crate::error::{RadixError, Result};
use crate::root::{NodeId, RadixNode};

/// Index bits decoded per level.
pub const MAP_SHIFT: u32 = 6;
/// Slots per node.
pub const MAP_SIZE: usize = 1 << MAP_SHIFT;
pub(crate) const MAP_MASK: u64 = (MAP_SIZE as u64) - 1;
/// Levels needed to cover every `u64` index.
pub const MAX_HEIGHT: u32 = u64::BITS.div_ceil(MAP_SHIFT);
/// Independent tags per entry.
pub const MAX_TAGS: usize = 3;

/// A boolean annotation attachable to an entry of an
/// [`IndexTree`](crate::IndexTree).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(u8);

impl Tag {
    /// Entry has been modified.
    pub const DIRTY: Tag = Tag(0);
    /// Entry is being written back.
    pub const WRITEBACK: Tag = Tag(1);
    /// Entry is queued for write-back.
    pub const TOWRITE: Tag = Tag(2);

    /// All tags, in numeric order.
    pub const ALL: [Tag; MAX_TAGS] = [Tag::DIRTY, Tag::WRITEBACK, Tag::TOWRITE];

    /// Tag from its number. Fails with `InvalidArgument` unless `raw < 3`.
    pub fn new(raw: u32) -> Result<Tag> {
        if (raw as usize) < MAX_TAGS {
            Ok(Tag(raw as u8))
        } else {
            Err(RadixError::InvalidArgument("tag out of range"))
        }
    }

    /// Tag number.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Slot offset for `index` at the level decoding bits `[shift, shift + 6)`.
#[inline]
pub(crate) fn slot_offset(index: u64, shift: u32) -> usize {
    ((index >> shift) & MAP_MASK) as usize
}

/// Levels needed to hold `index`; at least one.
#[inline]
pub(crate) fn height_for(index: u64) -> u32 {
    let bits = u64::BITS - index.leading_zeros();
    bits.div_ceil(MAP_SHIFT).max(1)
}

/// Largest index a tree of `height` levels can hold.
#[inline]
pub(crate) fn max_index_for(height: u32) -> u64 {
    let bits = height * MAP_SHIFT;
    if height == 0 {
        0
    } else if bits >= u64::BITS {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

pub(crate) enum Slots<T> {
    /// Levels above the bottom: child nodes.
    Interior(Box<[Option<NodeId>; MAP_SIZE]>),
    /// Bottom level (shift 0): the items themselves.
    Leaf(Box<[Option<T>; MAP_SIZE]>),
}

pub(crate) struct SlotNode<T> {
    pub(crate) slots: Slots<T>,
    /// Per tag, bit `i` set when slot `i` (or something below it) is tagged.
    pub(crate) tags: [u64; MAX_TAGS],
    pub(crate) shift: u32,
    /// Occupied slots.
    pub(crate) count: u8,
}

impl<T> SlotNode<T> {
    pub(crate) fn new(shift: u32) -> Self {
        let slots = if shift == 0 {
            Slots::Leaf(Box::new(std::array::from_fn(|_| None)))
        } else {
            Slots::Interior(Box::new([None; MAP_SIZE]))
        };
        Self {
            slots,
            tags: [0; MAX_TAGS],
            shift,
            count: 0,
        }
    }

    #[inline]
    pub(crate) fn child(&self, offset: usize) -> Option<NodeId> {
        match &self.slots {
            Slots::Interior(children) => children[offset],
            Slots::Leaf(_) => None,
        }
    }

    #[inline]
    pub(crate) fn tag_get(&self, tag: Tag, offset: usize) -> bool {
        self.tags[tag.index()] & (1u64 << offset) != 0
    }

    #[inline]
    pub(crate) fn tag_set(&mut self, tag: Tag, offset: usize) {
        self.tags[tag.index()] |= 1u64 << offset;
    }

    #[inline]
    pub(crate) fn tag_clear(&mut self, tag: Tag, offset: usize) {
        self.tags[tag.index()] &= !(1u64 << offset);
    }

    #[inline]
    pub(crate) fn any_tag(&self, tag: Tag) -> bool {
        self.tags[tag.index()] != 0
    }
}

impl<T> RadixNode for SlotNode<T> {
    fn heap_bytes(&self) -> usize {
        match &self.slots {
            Slots::Interior(_) => std::mem::size_of::<[Option<NodeId>; MAP_SIZE]>(),
            Slots::Leaf(_) => std::mem::size_of::<[Option<T>; MAP_SIZE]>(),
        }
    }
}
