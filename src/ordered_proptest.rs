#![cfg(test)]

// Property tests for the ordered containers kept inside the crate so they
// can reach the internal invariant checks.

use crate::ordered::{OrderedMap, OrderedMultiSet};
use crate::storage::Handle;
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::fmt;

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
    Bounds(usize),
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
            idx.clone().prop_map(OpI::Bounds),
            Just(OpI::Iterate),
        ];
        proptest::collection::vec(op, 1..60).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Property: State-machine equivalence against std::collections::BTreeMap.
// Invariants exercised across random operation sequences:
// - Duplicate inserts are rejected and report the existing handle.
// - `find`/`contains_key` parity; handles stay stable while the element lives.
// - `remove` returns the model's value and invalidates the handle.
// - `lower_bound`/`upper_bound` agree with the model's `range` view.
// - Full iteration equals the model's sorted sequence after every op, and
//   the red-black structure validates.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_map_state_machine((pool, ops) in arb_scenario()) {
        let mut sut: OrderedMap<Key, i32> = OrderedMap::new();
        let mut model: BTreeMap<Key, i32> = BTreeMap::new();
        let mut live: BTreeMap<Key, Handle> = BTreeMap::new();
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
                OpI::Bounds(i) => {
                    let k = key_from(&pool, i);
                    let lb = sut.lower_bound(&k);
                    let model_lb = model.range(k.clone()..).next().map(|(mk, _)| mk);
                    prop_assert_eq!(sut.get_at(lb).map(|(gk, _)| gk), model_lb);
                    let ub = sut.upper_bound(&k);
                    let model_ub = model
                        .range(k.clone()..)
                        .find(|(mk, _)| **mk != k)
                        .map(|(mk, _)| mk);
                    prop_assert_eq!(sut.get_at(ub).map(|(gk, _)| gk), model_ub);
                }
                OpI::Iterate => {
                    let s: Vec<(Key, i32)> = sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
                    let m: Vec<(Key, i32)> = model.iter().map(|(k, v)| (k.clone(), *v)).collect();
                    prop_assert_eq!(s, m, "iteration equals the sorted model");
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

#[derive(Clone, Debug)]
enum MultiOpI {
    Insert(usize),
    RemoveAll(usize),
    RemoveOne(usize),
    Count(usize),
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
            1 => Just(MultiOpI::Iterate),
        ];
        proptest::collection::vec(op, 1..60).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Property: multiset equivalence against a BTreeMap of key counts. The
// tight key alphabet forces long equal runs, stressing the duplicate
// placement and removal paths:
// - `count` parity after every op; `remove_all` drains exactly the run.
// - Removing one element of a run shrinks the count by one.
// - Iteration is sorted with each key's duplicates contiguous.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_multiset_state_machine((pool, ops) in arb_multi_scenario()) {
        let mut sut: OrderedMultiSet<Key> = OrderedMultiSet::new();
        let mut model: BTreeMap<Key, usize> = BTreeMap::new();

        for op in ops {
            match op {
                MultiOpI::Insert(i) => {
                    let k = key_from(&pool, i);
                    sut.insert(k.clone());
                    *model.entry(k).or_insert(0) += 1;
                }
                MultiOpI::RemoveAll(i) => {
                    let k = key_from(&pool, i);
                    let gone = sut.remove_all(&k);
                    prop_assert_eq!(gone, model.remove(&k).unwrap_or(0));
                }
                MultiOpI::RemoveOne(i) => {
                    let k = key_from(&pool, i);
                    if let Some(h) = sut.find(&k) {
                        let removed = sut.remove_at(h).expect("found handles are removable");
                        prop_assert_eq!(&removed, &k);
                        let n = model.get_mut(&k).expect("present in model");
                        *n -= 1;
                        if *n == 0 {
                            model.remove(&k);
                        }
                    } else {
                        prop_assert!(!model.contains_key(&k));
                    }
                }
                MultiOpI::Count(i) => {
                    let k = key_from(&pool, i);
                    prop_assert_eq!(sut.count(&k), model.get(&k).copied().unwrap_or(0));
                }
                MultiOpI::Iterate => {
                    let s: Vec<Key> = sut.iter().cloned().collect();
                    let m: Vec<Key> = model
                        .iter()
                        .flat_map(|(k, &n)| std::iter::repeat(k.clone()).take(n))
                        .collect();
                    prop_assert_eq!(s, m, "sorted with contiguous duplicates");
                }
            }

            let total: usize = model.values().sum();
            prop_assert_eq!(sut.len(), total);
            sut.assert_invariants();
        }
    }
}
