//! Ordered scans and gang lookups over an [`IndexTree`].
//!
//! The scan walks the tree with an explicit stack of `(node, base, offset)`
//! frames, so runs of empty slots cost one slot check each and empty
//! subtrees are never entered. With a tag filter, any slot whose tag bit is
//! clear is skipped together with everything below it.

use std::iter::FusedIterator;

use smallvec::{smallvec, SmallVec};

use super::node::{slot_offset, SlotNode, Slots, MAP_SIZE, MAX_HEIGHT};
use super::{IndexTree, Tag};
use crate::arena::Arena;
use crate::root::NodeId;

/// Position of a present entry: its index, bottom node and slot offset.
type Hit = (u64, NodeId, usize);

/// Stack walk over present slots in ascending index order.
struct Walk {
    /// Node, first index it covers, next slot to examine.
    stack: SmallVec<[(NodeId, u64, usize); MAX_HEIGHT as usize]>,
    start: u64,
    tag: Option<Tag>,
    /// Set while the next slot examined lies on the path to `start`.
    on_start_path: bool,
}

impl Walk {
    fn new<T>(tree: &IndexTree<T>, start: u64, tag: Option<Tag>) -> Self {
        let mut stack = SmallVec::new();
        if start <= tree.max_index() {
            if let Some(root) = tree.root.root {
                let shift = tree.root.nodes[root].shift;
                stack.push((root, 0, slot_offset(start, shift)));
            }
        }
        Self {
            stack,
            start,
            tag,
            on_start_path: true,
        }
    }

    fn advance<T>(&mut self, nodes: &Arena<SlotNode<T>>) -> Option<Hit> {
        while let Some(top) = self.stack.last_mut() {
            let (id, base, offset) = *top;
            if offset >= MAP_SIZE {
                self.stack.pop();
                self.on_start_path = false;
                continue;
            }
            top.2 = offset + 1;

            let entering_start = std::mem::replace(&mut self.on_start_path, false);
            let node = &nodes[id];
            if let Some(tag) = self.tag {
                if !node.tag_get(tag, offset) {
                    continue;
                }
            }

            match &node.slots {
                Slots::Leaf(items) => {
                    if items[offset].is_some() {
                        return Some((base | offset as u64, id, offset));
                    }
                }
                Slots::Interior(children) => {
                    if let Some(child) = children[offset] {
                        let child_shift = nodes[child].shift;
                        let child_base = base | ((offset as u64) << node.shift);
                        let first = if entering_start {
                            slot_offset(self.start, child_shift)
                        } else {
                            0
                        };
                        self.stack.push((child, child_base, first));
                        self.on_start_path = entering_start;
                    }
                }
            }
        }
        None
    }
}

/// Iterator over `(index, &item)` in ascending index order.
///
/// Created by [`IndexTree::iter`] and [`IndexTree::iter_from`].
pub struct Iter<'a, T> {
    tree: &'a IndexTree<T>,
    walk: Walk,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (u64, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let tree: &'a IndexTree<T> = self.tree;
        let nodes = &tree.root.nodes;
        let (index, id, offset) = self.walk.advance(nodes)?;
        match &nodes[id].slots {
            Slots::Leaf(items) => items[offset].as_ref().map(|item| (index, item)),
            Slots::Interior(_) => None,
        }
    }
}

impl<T> FusedIterator for Iter<'_, T> {}

impl<'a, T> IntoIterator for &'a IndexTree<T> {
    type Item = (u64, &'a T);
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over `(index, &mut item)` in ascending index order.
///
/// Created by [`IndexTree::iter_mut`] and [`IndexTree::iter_from_mut`].
/// Positions are gathered when the iterator is created.
pub struct IterMut<'a, T> {
    inner: std::vec::IntoIter<(u64, &'a mut T)>,
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = (u64, &'a mut T);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> DoubleEndedIterator for IterMut<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}

impl<T> FusedIterator for IterMut<'_, T> {}

impl<'a, T> IntoIterator for &'a mut IndexTree<T> {
    type Item = (u64, &'a mut T);
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<T> IndexTree<T> {
    /// All entries in ascending index order.
    pub fn iter(&self) -> Iter<'_, T> {
        self.iter_from(0)
    }

    /// Entries with index `>= first`, in ascending order.
    pub fn iter_from(&self, first: u64) -> Iter<'_, T> {
        Iter {
            tree: self,
            walk: Walk::new(self, first, None),
        }
    }

    /// All entries in ascending index order, mutably.
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        self.iter_from_mut(0)
    }

    /// Entries with index `>= first`, in ascending order, mutably.
    pub fn iter_from_mut(&mut self, first: u64) -> IterMut<'_, T> {
        IterMut {
            inner: self.collect_mut(first, usize::MAX, None).into_iter(),
        }
    }

    /// Up to `max_items` present entries with index `>= first`, ascending.
    ///
    /// Stops early at the end of the representable range; never wraps
    /// around to index 0.
    pub fn gang_lookup(&self, first: u64, max_items: usize) -> Vec<(u64, &T)> {
        self.iter_from(first).take(max_items).collect()
    }

    /// Like [`IndexTree::gang_lookup`] but only entries carrying `tag`.
    pub fn gang_lookup_tag(&self, first: u64, max_items: usize, tag: Tag) -> Vec<(u64, &T)> {
        Iter {
            tree: self,
            walk: Walk::new(self, first, Some(tag)),
        }
        .take(max_items)
        .collect()
    }

    /// Like [`IndexTree::gang_lookup`] but returns only the indices.
    pub fn gang_lookup_indices(&self, first: u64, max_items: usize) -> Vec<u64> {
        self.iter_from(first)
            .take(max_items)
            .map(|(index, _)| index)
            .collect()
    }

    /// Like [`IndexTree::gang_lookup`] but the items can be updated in place.
    pub fn gang_lookup_mut(&mut self, first: u64, max_items: usize) -> Vec<(u64, &mut T)> {
        self.collect_mut(first, max_items, None)
    }

    /// Like [`IndexTree::gang_lookup_tag`] but the items can be updated in
    /// place.
    pub fn gang_lookup_tag_mut(
        &mut self,
        first: u64,
        max_items: usize,
        tag: Tag,
    ) -> Vec<(u64, &mut T)> {
        self.collect_mut(first, max_items, Some(tag))
    }

    /// Walk for up to `max_items` hits, then borrow each bottom node once.
    fn collect_mut(
        &mut self,
        first: u64,
        max_items: usize,
        tag: Option<Tag>,
    ) -> Vec<(u64, &mut T)> {
        // Hits of one bottom node are contiguous in index order.
        let mut groups: Vec<(NodeId, SmallVec<[(u64, usize); 8]>)> = Vec::new();
        let mut walk = Walk::new(self, first, tag);
        for _ in 0..max_items {
            let Some((index, id, offset)) = walk.advance(&self.root.nodes) else {
                break;
            };
            match groups.last_mut() {
                Some((last, hits)) if *last == id => hits.push((index, offset)),
                _ => groups.push((id, smallvec![(index, offset)])),
            }
        }

        let mut order: Vec<(NodeId, usize)> = groups
            .iter()
            .enumerate()
            .map(|(g, (id, _))| (*id, g))
            .collect();
        order.sort_unstable();
        let ids: Vec<NodeId> = order.iter().map(|&(id, _)| id).collect();

        let mut per_group: Vec<Vec<(u64, &mut T)>> = groups.iter().map(|_| Vec::new()).collect();
        let nodes = self.root.nodes.get_sorted_mut(&ids);
        for ((id, node), &(want, g)) in nodes.into_iter().zip(&order) {
            debug_assert_eq!(id, want);
            let Slots::Leaf(items) = &mut node.slots else {
                continue;
            };
            let mut hits = groups[g].1.iter().peekable();
            for (offset, slot) in items.iter_mut().enumerate() {
                match hits.peek() {
                    Some(&&(index, at)) if at == offset => {
                        if let Some(item) = slot.as_mut() {
                            per_group[g].push((index, item));
                        }
                        hits.next();
                    }
                    Some(_) => {}
                    None => break,
                }
            }
        }
        per_group.into_iter().flatten().collect()
    }
}
