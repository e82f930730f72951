#![cfg(test)]

// Property tests for the hashed containers kept inside the crate so they
// can reach the internal invariant checks.

use crate::hash_index::HashConfig;
use crate::hashed::{HashedMap, HashedMultiSet};
use crate::storage::Handle;
use proptest::prelude::*;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hasher;

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations to improve shrinking: indices shrink to earlier
// keys, pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    Assign(usize, i32),
    Remove(usize),
    Find(usize),
    Contains(String),
    Mutate(usize, i32),
    Rehash(usize),
    Reserve(usize),
    Iterate,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=8).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Assign(i, v)),
            idx.clone().prop_map(OpI::Remove),
            idx.clone().prop_map(OpI::Find),
            prop_oneof![
                contains_pool.prop_map(|s: String| s),
                "[a-z]{0,5}".prop_map(|s| s)
            ]
            .prop_map(OpI::Contains),
            (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            (0usize..32).prop_map(OpI::Rehash),
            (0usize..64).prop_map(OpI::Reserve),
            Just(OpI::Iterate),
        ];
        proptest::collection::vec(op, 1..60).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Property: State-machine equivalence against std::collections::HashMap,
// plus an insertion-order model (a Vec of live keys). Invariants:
// - Duplicate inserts are rejected and report the existing handle.
// - `find`/`contains_key` parity; handles survive rehash and reserve.
// - `remove` returns the model's value and invalidates the handle.
// - Full iteration equals the insertion-order model after every op, and
//   every node sits in the bucket its cached hash selects.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_map_state_machine((pool, ops) in arb_scenario()) {
        // A single starting bucket guarantees growth paths run.
        let mut sut: HashedMap<Key, i32> = HashedMap::with_config(HashConfig {
            initial_buckets: 1,
            max_load_factor: 1.0,
        });
        let mut model: HashMap<Key, i32> = HashMap::new();
        let mut order: Vec<Key> = Vec::new();
        let mut live: HashMap<Key, Handle> = HashMap::new();
        let mut stale: Vec<Handle> = Vec::new();

        for op in ops {
            match op {
                OpI::Insert(i, v) => {
                    let k = key_from(&pool, i);
                    let already = model.contains_key(&k);
                    let (h, inserted) = sut.insert(k.clone(), v);
                    prop_assert_eq!(inserted, !already, "insert must fail iff duplicate");
                    if inserted {
                        let prev = live.insert(k.clone(), h);
                        prop_assert!(prev.is_none());
                        order.push(k.clone());
                        model.insert(k, v);
                    } else {
                        prop_assert_eq!(Some(&h), live.get(&k), "rejection reports the live handle");
                    }
                }
                OpI::Assign(i, v) => {
                    let k = key_from(&pool, i);
                    let (h, old) = sut.insert_or_assign(k.clone(), v);
                    prop_assert_eq!(old.as_ref(), model.get(&k));
                    if old.is_none() {
                        live.insert(k.clone(), h);
                        order.push(k.clone());
                    } else {
                        prop_assert_eq!(Some(&h), live.get(&k), "assignment reuses the node");
                    }
                    model.insert(k, v);
                }
                OpI::Remove(i) => {
                    let k = key_from(&pool, i);
                    let got = sut.remove(&k);
                    prop_assert_eq!(got, model.remove(&k));
                    if let Some(h) = live.remove(&k) {
                        prop_assert!(got.is_some());
                        order.retain(|ok| *ok != k);
                        stale.push(h);
                    } else {
                        prop_assert!(got.is_none());
                    }
                }
                OpI::Find(i) => {
                    let k = key_from(&pool, i);
                    let s = sut.find(&k);
                    prop_assert_eq!(s.is_some(), model.contains_key(&k));
                    if let Some(h) = s {
                        prop_assert_eq!(Some(&h), live.get(&k), "handles are stable");
                        prop_assert_eq!(sut.get_at(h).map(|(gk, _)| gk), Some(&k));
                    }
                }
                OpI::Contains(s) => {
                    let has = sut.contains_key(s.as_str());
                    let has_model = model.keys().any(|k| k.0 == s);
                    prop_assert_eq!(has, has_model);
                }
                OpI::Mutate(i, d) => {
                    let k = key_from(&pool, i);
                    match (sut.get_mut(&k), model.get_mut(&k)) {
                        (Some(vr), Some(mv)) => {
                            *vr = vr.saturating_add(d);
                            *mv = mv.saturating_add(d);
                        }
                        (None, None) => {}
                        _ => prop_assert!(false, "get_mut parity with the model"),
                    }
                }
                OpI::Rehash(n) => {
                    sut.rehash(n);
                    prop_assert!(sut.load_factor() <= sut.max_load_factor());
                }
                OpI::Reserve(n) => {
                    sut.reserve(n);
                }
                OpI::Iterate => {
                    let s: Vec<Key> = sut.keys().cloned().collect();
                    prop_assert_eq!(&s, &order, "iteration equals insertion order");
                }
            }

            // Post-conditions after each op
            for &h in &stale {
                prop_assert!(sut.get_at(h).is_none(), "stale handles never resolve");
            }
            prop_assert_eq!(sut.len(), model.len());
            prop_assert_eq!(sut.is_empty(), model.is_empty());
            sut.assert_invariants();
        }
    }
}

// Collision variant using a constant hasher to stress equality resolution.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl std::hash::BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

#[derive(Clone, Debug)]
enum MultiOpI {
    Insert(usize),
    RemoveAll(usize),
    RemoveOne(usize),
    Count(usize),
    Rehash(usize),
    Iterate,
}

fn arb_multi_scenario() -> impl Strategy<Value = (Vec<String>, Vec<MultiOpI>)> {
    proptest::collection::vec("[a-c]{0,3}", 1..=6).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            3 => idx.clone().prop_map(MultiOpI::Insert),
            1 => idx.clone().prop_map(MultiOpI::RemoveAll),
            1 => idx.clone().prop_map(MultiOpI::RemoveOne),
            1 => idx.clone().prop_map(MultiOpI::Count),
            1 => (0usize..16).prop_map(MultiOpI::Rehash),
            1 => Just(MultiOpI::Iterate),
        ];
        proptest::collection::vec(op, 1..60).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Property: multiset equivalence under worst-case collisions (constant
// hasher) against a HashMap of key counts plus an insertion-order model.
// Everything lands in one chain, so duplicate placement, `remove_all`
// draining and per-bucket contiguity all run through equality probing.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_multiset_with_collisions((pool, ops) in arb_multi_scenario()) {
        let mut sut: HashedMultiSet<Key, ConstBuildHasher> =
            HashedMultiSet::with_hasher(ConstBuildHasher);
        let mut counts: HashMap<Key, usize> = HashMap::new();
        let mut order: Vec<Key> = Vec::new();

        for op in ops {
            match op {
                MultiOpI::Insert(i) => {
                    let k = key_from(&pool, i);
                    sut.insert(k.clone());
                    *counts.entry(k.clone()).or_insert(0) += 1;
                    order.push(k);
                }
                MultiOpI::RemoveAll(i) => {
                    let k = key_from(&pool, i);
                    let gone = sut.remove_all(&k);
                    prop_assert_eq!(gone, counts.remove(&k).unwrap_or(0));
                    order.retain(|ok| *ok != k);
                }
                MultiOpI::RemoveOne(i) => {
                    let k = key_from(&pool, i);
                    if let Some(h) = sut.find(&k) {
                        let removed = sut.remove_at(h).expect("found handles are removable");
                        prop_assert_eq!(&removed, &k);
                        // `find` resolves the earliest inserted of the run.
                        let at = order.iter().position(|ok| *ok == k).expect("in order model");
                        order.remove(at);
                        let n = counts.get_mut(&k).expect("present in model");
                        *n -= 1;
                        if *n == 0 {
                            counts.remove(&k);
                        }
                    } else {
                        prop_assert!(!counts.contains_key(&k));
                    }
                }
                MultiOpI::Count(i) => {
                    let k = key_from(&pool, i);
                    prop_assert_eq!(sut.count(&k), counts.get(&k).copied().unwrap_or(0));
                }
                MultiOpI::Rehash(n) => {
                    sut.rehash(n);
                }
                MultiOpI::Iterate => {
                    let s: Vec<Key> = sut.iter().cloned().collect();
                    prop_assert_eq!(&s, &order, "iteration equals insertion order");

                    // With one hash value there is one populated chain;
                    // each key's run must be contiguous inside it.
                    let b = sut.bucket(&Key(String::new()));
                    let chain: Vec<Key> = sut.bucket_iter(b).map(|(k, _)| k.clone()).collect();
                    let mut seen_done: Vec<Key> = Vec::new();
                    let mut prev: Option<Key> = None;
                    for k in chain {
                        if prev.as_ref() != Some(&k) {
                            prop_assert!(!seen_done.contains(&k), "duplicates split across the chain");
                            if let Some(p) = prev.take() {
                                seen_done.push(p);
                            }
                        }
                        prev = Some(k);
                    }
                }
            }

            let total: usize = counts.values().sum();
            prop_assert_eq!(sut.len(), total);
            sut.assert_invariants();
        }
    }
}
