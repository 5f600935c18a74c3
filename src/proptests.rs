use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use crate::index::MAX_TAGS;
use std::collections::BTreeMap;

type Entry = (Vec<u8>, u32);

fn entry_trie() -> ByteTrie<Entry> {
    ByteTrie::new(|e: &Entry| e.0.as_slice())
}

fn validate_trie<T>(t: &ByteTrie<T>) {
    let issues = t.verify();
    assert!(issues.is_empty(), "trie integrity: {issues:?}");
    assert_eq!(t.iter().count(), t.len());
}

fn validate_index<T>(t: &IndexTree<T>) {
    let issues = t.verify();
    assert!(issues.is_empty(), "index integrity: {issues:?}");
    assert_eq!(t.iter().count(), t.len());
}

// =========================================================================
// Byte trie against BTreeMap
// =========================================================================

#[derive(Clone, Debug)]
enum Op {
    Insert(Vec<u8>, u32),
    Erase(Vec<u8>),
    Search(Vec<u8>),
    Walk,
}

fn key_strategy() -> impl Strategy<Value = Vec<u8>> + Clone {
    // A narrow alphabet makes shared prefixes, splits and merges common.
    prop_oneof![
        3 => prop::collection::vec(prop::sample::select(vec![0u8, b'a', b'b', 0xff]), 0..=6),
        1 => prop::collection::vec(any::<u8>(), 0..=24),
    ]
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    let key = key_strategy();
    let op = prop_oneof![
        50 => (key.clone(), any::<u32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        25 => key.clone().prop_map(Op::Erase),
        24 => key.clone().prop_map(Op::Search),
        1 => Just(Op::Walk),
    ];
    prop::collection::vec(op, 0..=1000)
}

// =========================================================================
// Index tree against BTreeMap
// =========================================================================

fn index_strategy() -> impl Strategy<Value = u64> {
    prop_oneof![
        4 => 0u64..256,
        2 => 0u64..(1 << 20),
        1 => any::<u64>(),
    ]
}

#[derive(Clone, Debug, Arbitrary)]
enum IndexOp {
    Insert(#[proptest(strategy = "index_strategy()")] u64, u16),
    Delete(#[proptest(strategy = "index_strategy()")] u64),
    Lookup(#[proptest(strategy = "index_strategy()")] u64),
    TagSet(
        #[proptest(strategy = "index_strategy()")] u64,
        #[proptest(strategy = "0u32..3")] u32,
    ),
    TagClear(
        #[proptest(strategy = "index_strategy()")] u64,
        #[proptest(strategy = "0u32..3")] u32,
    ),
    Gang(
        #[proptest(strategy = "index_strategy()")] u64,
        #[proptest(strategy = "0usize..20")] usize,
        #[proptest(strategy = "prop::option::of(0u32..3)")] Option<u32>,
    ),
    /// Add `delta` to every item of a (possibly tagged) gang, in place.
    GangMut(
        #[proptest(strategy = "index_strategy()")] u64,
        #[proptest(strategy = "0usize..20")] usize,
        #[proptest(strategy = "prop::option::of(0u32..3)")] Option<u32>,
        u16,
    ),
}

/// Model entry: value plus one flag per tag.
type ModelEntry = (u16, [bool; MAX_TAGS]);

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_trie_equivalence(ops in ops_strategy()) {
        let mut t = entry_trie();
        let mut m: BTreeMap<Vec<u8>, u32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(key, value) => {
                    let got = t.insert((key.clone(), value));
                    if let Some(&old) = m.get(&key) {
                        let err = got.err().map(|e| (e.kind, e.leaf));
                        prop_assert_eq!(err, Some((RadixError::DuplicateKey, (key.clone(), value))));
                        prop_assert_eq!(t.get_by_key(&key).map(|e| e.1), Some(old));
                    } else {
                        let id = got.ok();
                        prop_assert!(id.is_some());
                        prop_assert_eq!(id.and_then(|id| t.get(id)).map(|e| e.1), Some(value));
                        m.insert(key, value);
                    }
                }
                Op::Erase(key) => {
                    let got = t.erase_key(&key).map(|e| e.1);
                    let want = m.remove(key.as_slice()).ok_or(RadixError::NotFound);
                    prop_assert_eq!(got, want);
                }
                Op::Search(key) => {
                    let got = t.get_by_key(&key).map(|e| e.1);
                    prop_assert_eq!(got, m.get(key.as_slice()).copied());
                }
                Op::Walk => {
                    validate_trie(&t);
                }
            }

            prop_assert_eq!(t.len(), m.len());
        }

        validate_trie(&t);
        let got: Vec<Entry> = t.iter().map(|(_, e)| e.clone()).collect();
        let expected: Vec<Entry> = m.iter().map(|(k, v)| (k.clone(), *v)).collect();
        prop_assert_eq!(&got, &expected);

        let mut backwards: Vec<Entry> = t.iter().rev().map(|(_, e)| e.clone()).collect();
        backwards.reverse();
        prop_assert_eq!(&backwards, &expected);

        let drained = t.clear();
        prop_assert_eq!(drained, expected);
        prop_assert!(t.is_empty());
        validate_trie(&t);
    }

    #[test]
    fn prop_trie_next_prev_agree(keys in prop::collection::btree_set(key_strategy(), 0..64)) {
        let mut t = entry_trie();
        for (i, k) in keys.iter().enumerate() {
            prop_assert!(t.insert((k.clone(), i as u32)).is_ok());
        }

        let mut cur = t.first();
        let mut walked = Vec::new();
        while let Some(id) = cur {
            walked.push(id);
            let next = t.next(id);
            if let Some(n) = next {
                prop_assert_eq!(t.prev(n), Some(id));
            }
            cur = next;
        }
        prop_assert_eq!(walked.last().copied(), t.last());

        let ordered: Vec<&[u8]> = walked
            .iter()
            .filter_map(|&id| t.get(id))
            .map(|e| e.0.as_slice())
            .collect();
        let expected: Vec<&[u8]> = keys.iter().map(Vec::as_slice).collect();
        prop_assert_eq!(ordered, expected);
    }

    #[test]
    fn prop_index_equivalence(ops in prop::collection::vec(any::<IndexOp>(), 0..=500)) {
        let mut t: IndexTree<u16> = IndexTree::new();
        let mut m: BTreeMap<u64, ModelEntry> = BTreeMap::new();

        for op in ops {
            match op {
                IndexOp::Insert(index, value) => {
                    let got = t.insert(index, value);
                    if m.contains_key(&index) {
                        prop_assert_eq!(got, Err(RadixError::DuplicateKey));
                    } else {
                        prop_assert_eq!(got, Ok(()));
                        m.insert(index, (value, [false; MAX_TAGS]));
                    }
                }
                IndexOp::Delete(index) => {
                    let want = m.remove(&index).map(|(v, _)| v).ok_or(RadixError::NotFound);
                    prop_assert_eq!(t.delete(index), want);
                }
                IndexOp::Lookup(index) => {
                    prop_assert_eq!(t.get(index).copied(), m.get(&index).map(|(v, _)| *v));
                }
                IndexOp::TagSet(index, raw) => {
                    let tag = Tag::new(raw).unwrap();
                    let got = t.tag_set(index, tag).copied();
                    match m.get_mut(&index) {
                        Some((v, tags)) => {
                            tags[tag.index()] = true;
                            prop_assert_eq!(got, Ok(*v));
                        }
                        None => prop_assert_eq!(got, Err(RadixError::NotFound)),
                    }
                }
                IndexOp::TagClear(index, raw) => {
                    let tag = Tag::new(raw).unwrap();
                    let got = t.tag_clear(index, tag).copied();
                    match m.get_mut(&index) {
                        Some((v, tags)) => {
                            tags[tag.index()] = false;
                            prop_assert_eq!(got, Ok(*v));
                        }
                        None => prop_assert_eq!(got, Err(RadixError::NotFound)),
                    }
                }
                IndexOp::Gang(first, max, raw) => {
                    let tag = raw.map(|r| Tag::new(r).unwrap());
                    let got: Vec<(u64, u16)> = match tag {
                        Some(tag) => t.gang_lookup_tag(first, max, tag),
                        None => t.gang_lookup(first, max),
                    }
                    .into_iter()
                    .map(|(i, v)| (i, *v))
                    .collect();
                    let want: Vec<(u64, u16)> = m
                        .range(first..)
                        .filter(|(_, (_, tags))| tag.map_or(true, |tag| tags[tag.index()]))
                        .take(max)
                        .map(|(i, (v, _))| (*i, *v))
                        .collect();
                    prop_assert!(got.len() <= max);
                    prop_assert!(got.iter().all(|(i, _)| *i >= first));
                    prop_assert_eq!(got, want);
                }
                IndexOp::GangMut(first, max, raw, delta) => {
                    let tag = raw.map(|r| Tag::new(r).unwrap());
                    let batch = match tag {
                        Some(tag) => t.gang_lookup_tag_mut(first, max, tag),
                        None => t.gang_lookup_mut(first, max),
                    };
                    let mut touched = Vec::with_capacity(batch.len());
                    for (index, item) in batch {
                        *item = item.wrapping_add(delta);
                        touched.push(index);
                    }

                    let want: Vec<u64> = m
                        .range_mut(first..)
                        .filter(|(_, (_, tags))| tag.map_or(true, |tag| tags[tag.index()]))
                        .take(max)
                        .map(|(i, (v, _))| {
                            *v = v.wrapping_add(delta);
                            *i
                        })
                        .collect();
                    prop_assert_eq!(touched, want);
                }
            }

            prop_assert_eq!(t.len(), m.len());
        }

        validate_index(&t);
        for tag in Tag::ALL {
            let any = m.values().any(|(_, tags)| tags[tag.index()]);
            prop_assert_eq!(t.tagged(tag), any);
        }
        for (&index, (_, tags)) in &m {
            for tag in Tag::ALL {
                prop_assert_eq!(t.tag_get(index, tag), tags[tag.index()]);
            }
        }
        let got: Vec<(u64, u16)> = t.iter().map(|(i, v)| (i, *v)).collect();
        let expected: Vec<(u64, u16)> = m.iter().map(|(i, (v, _))| (*i, *v)).collect();
        prop_assert_eq!(got, expected);
    }
}

// =========================================================================
// Exhaustive small cases
// =========================================================================

/// Visit every ordering of `items` (Heap's algorithm, iterative).
fn each_ordering<T: Clone>(items: &[T], mut visit: impl FnMut(&[T])) {
    let mut order = items.to_vec();
    let mut counters = vec![0usize; order.len()];
    visit(&order);

    let mut level = 1;
    while level < order.len() {
        if counters[level] < level {
            let swap_with = if level % 2 == 0 { 0 } else { counters[level] };
            order.swap(swap_with, level);
            visit(&order);
            counters[level] += 1;
            level = 1;
        } else {
            counters[level] = 0;
            level += 1;
        }
    }
}

fn small_keys() -> Vec<Vec<u8>> {
    vec![
        b"".to_vec(),
        b"a".to_vec(),
        b"b".to_vec(),
        b"ab".to_vec(),
        b"abc".to_vec(),
        b"abd".to_vec(),
    ]
}

#[test]
fn exhaustive_insert_order_small_set() {
    let keys = small_keys();
    let mut sorted = keys.clone();
    sorted.sort();

    each_ordering(&keys, |order| {
        let mut t = entry_trie();
        for (i, k) in order.iter().enumerate() {
            assert!(t.insert((k.clone(), i as u32)).is_ok());
        }

        validate_trie(&t);
        let got: Vec<Vec<u8>> = t.iter().map(|(_, e)| e.0.clone()).collect();
        assert_eq!(got, sorted);
    });
}

#[test]
fn exhaustive_erase_order_small_set() {
    let keys = small_keys();

    each_ordering(&keys, |order| {
        let mut t = entry_trie();
        let ids: BTreeMap<Vec<u8>, LeafId> = keys
            .iter()
            .enumerate()
            .map(|(i, k)| (k.clone(), t.insert((k.clone(), i as u32)).unwrap()))
            .collect();

        let mut remaining: BTreeMap<Vec<u8>, LeafId> = ids.clone();
        for k in order {
            let id = remaining.remove(k).unwrap();
            assert_eq!(t.erase(id).map(|e| e.0), Ok(k.clone()));
            assert!(!t.contains(id));
            assert_eq!(t.search_key(k), None);
            for (other, &other_id) in &remaining {
                assert_eq!(t.search_key(other), Some(other_id));
            }
            validate_trie(&t);
        }
        assert!(t.is_empty());
        assert_eq!(t.node_count(), 0);
    });
}

#[test]
fn exhaustive_index_delete_order() {
    let indices = [0u64, 1, 63, 64, 4095, 1 << 30];
    let mut seen = 0usize;

    each_ordering(&indices, |order| {
        let mut t = IndexTree::new();
        for &i in &indices {
            t.insert(i, i).unwrap();
            t.tag_set(i, Tag::DIRTY).unwrap();
        }
        let height = t.height();

        for (n, &i) in order.iter().enumerate() {
            assert_eq!(t.delete(i), Ok(i));
            assert_eq!(t.tagged(Tag::DIRTY), n + 1 < indices.len());
            validate_index(&t);
        }
        assert!(t.is_empty());
        assert_eq!(t.height(), height);
        seen += 1;
    });
    assert_eq!(seen, 720);
}

#[test]
fn randomized_trie_against_model() {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(7);
    let mut t = entry_trie();
    let mut m: BTreeMap<Vec<u8>, LeafId> = BTreeMap::new();

    for step in 0..20_000u32 {
        let len = rng.gen_range(0..8);
        let key: Vec<u8> = (0..len).map(|_| rng.gen_range(b'a'..=b'd')).collect();
        if rng.gen_bool(0.6) {
            match t.insert((key.clone(), step)) {
                Ok(id) => assert!(m.insert(key, id).is_none()),
                Err(e) => {
                    assert_eq!(e.kind, RadixError::DuplicateKey);
                    assert!(m.contains_key(&e.leaf.0));
                }
            }
        } else if let Some(id) = m.remove(&key) {
            assert_eq!(t.erase(id).map(|e| e.0), Ok(key));
        } else {
            assert_eq!(t.erase_key(&key), Err(RadixError::NotFound));
        }
    }

    validate_trie(&t);
    let got: Vec<LeafId> = t.iter().map(|(id, _)| id).collect();
    let expected: Vec<LeafId> = m.values().copied().collect();
    assert_eq!(got, expected);
}
