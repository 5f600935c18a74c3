//! Ordered iteration over a [`ByteTrie`].

use std::iter::FusedIterator;

use super::{ByteTrie, LeafId};

/// Iterator over the leaves of a [`ByteTrie`] in key order.
///
/// Created by [`ByteTrie::iter`]. Walks the leaf back-references with
/// [`ByteTrie::next`] / [`ByteTrie::prev`], so no stack is kept.
pub struct Iter<'a, T> {
    trie: &'a ByteTrie<T>,
    front: Option<LeafId>,
    back: Option<LeafId>,
    remaining: usize,
}

impl<'a, T> Iter<'a, T> {
    pub(super) fn new(trie: &'a ByteTrie<T>) -> Self {
        Self {
            trie,
            front: trie.first(),
            back: trie.last(),
            remaining: trie.len(),
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (LeafId, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.front?;
        self.remaining -= 1;
        self.front = self.trie.next(id);
        Some((id, self.trie.get(id)?))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.back?;
        self.remaining -= 1;
        self.back = self.trie.prev(id);
        Some((id, self.trie.get(id)?))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

impl<'a, T> IntoIterator for &'a ByteTrie<T> {
    type Item = (LeafId, &'a T);
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use crate::ByteTrie;

    #[test]
    fn test_meet_in_the_middle() {
        let mut t: ByteTrie<&'static str> = ByteTrie::default();
        for k in ["d", "a", "c", "b", "e"] {
            t.insert(k).unwrap();
        }

        let mut it = t.iter();
        assert_eq!(it.len(), 5);
        assert_eq!(it.next().map(|(_, k)| *k), Some("a"));
        assert_eq!(it.next_back().map(|(_, k)| *k), Some("e"));
        assert_eq!(it.next().map(|(_, k)| *k), Some("b"));
        assert_eq!(it.next_back().map(|(_, k)| *k), Some("d"));
        assert_eq!(it.next().map(|(_, k)| *k), Some("c"));
        assert_eq!(it.next(), None);
        assert_eq!(it.next_back(), None);
    }

    #[test]
    fn test_empty() {
        let t: ByteTrie<Vec<u8>> = ByteTrie::default();
        assert_eq!(t.iter().count(), 0);
        assert_eq!((&t).into_iter().rev().count(), 0);
    }
}
