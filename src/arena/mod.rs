//! Slab arena for tree nodes and leaves.
//!
//! Nodes and leaves live in contiguous vectors and refer to each other by
//! 32-bit slot index instead of by pointer. This gives:
//! - Cheap parent and back-references (no `Rc`/`RefCell` cycles)
//! - Slot reuse through a free list
//! - Stale handle detection through per-slot generations
//! - Fallible growth (`try_reserve`) ahead of any structural change

use std::mem;
use std::ops::{Index, IndexMut};

use crate::error::{RadixError, Result};

/// Handle to an arena slot.
///
/// A handle stays valid until the slot it names is removed. Removing bumps
/// the slot generation, so an old handle never aliases a later occupant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct ArenaId {
    index: u32,
    generation: u32,
}

enum Entry<N> {
    Occupied { generation: u32, value: N },
    Vacant { generation: u32 },
}

pub(crate) struct Arena<N> {
    entries: Vec<Entry<N>>,
    free: Vec<u32>,
    len: usize,
}

impl<N> Arena<N> {
    pub(crate) fn new() -> Self {
        Self::with_capacity(0)
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            free: Vec::new(),
            len: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Make room for `additional` inserts without reallocating.
    ///
    /// After this returns `Ok`, the next `additional` calls to
    /// [`Arena::insert`] cannot fail.
    pub(crate) fn reserve(&mut self, additional: usize) -> Result<()> {
        let needed = additional.saturating_sub(self.free.len());
        if needed == 0 {
            return Ok(());
        }
        if self.entries.len().saturating_add(needed) > u32::MAX as usize {
            return Err(RadixError::AllocationFailure);
        }
        self.entries.try_reserve(needed)?;
        Ok(())
    }

    pub(crate) fn insert(&mut self, value: N) -> ArenaId {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let entry = &mut self.entries[index as usize];
            let generation = match *entry {
                Entry::Vacant { generation } => generation,
                Entry::Occupied { .. } => unreachable!("free list points at an occupied slot"),
            };
            *entry = Entry::Occupied { generation, value };
            return ArenaId { index, generation };
        }

        let index = self.entries.len() as u32;
        self.entries.push(Entry::Occupied {
            generation: 0,
            value,
        });
        ArenaId {
            index,
            generation: 0,
        }
    }

    pub(crate) fn remove(&mut self, id: ArenaId) -> Option<N> {
        let entry = self.entries.get_mut(id.index as usize)?;
        match entry {
            Entry::Occupied { generation, .. } if *generation == id.generation => {}
            _ => return None,
        }
        let vacant = Entry::Vacant {
            generation: id.generation.wrapping_add(1),
        };
        match mem::replace(entry, vacant) {
            Entry::Occupied { value, .. } => {
                self.free.push(id.index);
                self.len -= 1;
                Some(value)
            }
            Entry::Vacant { .. } => None,
        }
    }

    pub(crate) fn get(&self, id: ArenaId) -> Option<&N> {
        match self.entries.get(id.index as usize)? {
            Entry::Occupied { generation, value } if *generation == id.generation => Some(value),
            _ => None,
        }
    }

    pub(crate) fn get_mut(&mut self, id: ArenaId) -> Option<&mut N> {
        match self.entries.get_mut(id.index as usize)? {
            Entry::Occupied { generation, value } if *generation == id.generation => Some(value),
            _ => None,
        }
    }

    /// Mutable access to several distinct slots at once.
    ///
    /// `ids` must be sorted by slot and free of duplicates; an id that is
    /// out of order, repeated or stale is skipped.
    pub(crate) fn get_sorted_mut(&mut self, ids: &[ArenaId]) -> Vec<(ArenaId, &mut N)> {
        let mut out = Vec::with_capacity(ids.len());
        let mut rest: &mut [Entry<N>] = &mut self.entries;
        let mut consumed = 0usize;

        for &id in ids {
            let index = id.index as usize;
            if index < consumed {
                continue;
            }
            let tail = mem::take(&mut rest);
            let Some((entry, after)) = tail
                .get_mut(index - consumed..)
                .and_then(|s| s.split_first_mut())
            else {
                break;
            };
            rest = after;
            consumed = index + 1;

            if let Entry::Occupied { generation, value } = entry {
                if *generation == id.generation {
                    out.push((id, value));
                }
            }
        }
        out
    }

    pub(crate) fn contains(&self, id: ArenaId) -> bool {
        self.get(id).is_some()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.free.clear();
        self.len = 0;
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (ArenaId, &N)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| match entry {
                Entry::Occupied { generation, value } => Some((
                    ArenaId {
                        index: index as u32,
                        generation: *generation,
                    },
                    value,
                )),
                Entry::Vacant { .. } => None,
            })
    }

    /// Bytes held by the slot vector and free list (not by the values' own
    /// heap allocations).
    pub(crate) fn slab_bytes(&self) -> usize {
        self.entries.capacity() * mem::size_of::<Entry<N>>()
            + self.free.capacity() * mem::size_of::<u32>()
    }
}

impl<N> Default for Arena<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> Index<ArenaId> for Arena<N> {
    type Output = N;

    fn index(&self, id: ArenaId) -> &N {
        match self.get(id) {
            Some(value) => value,
            None => panic!("stale arena handle {id:?}"),
        }
    }
}

impl<N> IndexMut<ArenaId> for Arena<N> {
    fn index_mut(&mut self, id: ArenaId) -> &mut N {
        match self.get_mut(id) {
            Some(value) => value,
            None => panic!("stale arena handle {id:?}"),
        }
    }
}
