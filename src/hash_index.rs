//! Hash index: an explicit bucket table over storage handles.
//!
//! The hashed containers keep their storage list in pure insertion order;
//! this table only accelerates key lookup. Buckets hold non-owning
//! handles, and each node's hash is computed once at insertion and cached
//! in a `SecondaryMap`, so `K: Hash` is never invoked during a rehash.

use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};

use slotmap::{DefaultKey, SecondaryMap};

use crate::storage::{Pair, Storage};

/// Tunables of the bucket table, passed in at construction so tests can
/// exercise tiny and degenerate configurations deterministically.
#[derive(Clone, Copy, Debug)]
pub struct HashConfig {
    /// Bucket count the table starts with; clamped to at least 1.
    pub initial_buckets: usize,
    /// Load-factor cap that triggers growth; non-positive or non-finite
    /// values fall back to the default.
    pub max_load_factor: f32,
}

impl Default for HashConfig {
    fn default() -> Self {
        HashConfig {
            initial_buckets: 8,
            max_load_factor: 1.0,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct HashIndex<S> {
    hasher: S,
    buckets: Vec<Vec<DefaultKey>>,
    hashes: SecondaryMap<DefaultKey, u64>,
    max_load_factor: f32,
}

impl<S: BuildHasher> HashIndex<S> {
    pub(crate) fn with_config(hasher: S, config: HashConfig) -> Self {
        let max_load_factor = if config.max_load_factor.is_finite() && config.max_load_factor > 0.0
        {
            config.max_load_factor
        } else {
            HashConfig::default().max_load_factor
        };
        HashIndex {
            hasher,
            buckets: vec![Vec::new(); config.initial_buckets.max(1)],
            hashes: SecondaryMap::new(),
            max_load_factor,
        }
    }

    pub(crate) fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    pub(crate) fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub(crate) fn bucket_of(&self, hash: u64) -> usize {
        (hash as usize) % self.buckets.len()
    }

    pub(crate) fn bucket_len(&self, i: usize) -> usize {
        self.buckets.get(i).map(Vec::len).unwrap_or(0)
    }

    /// Handles of one bucket, in first-inserted-first order per key run.
    pub(crate) fn bucket_handles(&self, i: usize) -> &[DefaultKey] {
        self.buckets.get(i).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn load_factor(&self, len: usize) -> f32 {
        len as f32 / self.buckets.len() as f32
    }

    pub(crate) fn max_load_factor(&self) -> f32 {
        self.max_load_factor
    }

    /// Lowers or raises the growth cap; the table immediately rehashes if
    /// the current occupancy violates the new ratio.
    pub(crate) fn set_max_load_factor<K, V>(&mut self, s: &Storage<Pair<K, V>>, ratio: f32)
    where
        K: Eq,
    {
        self.max_load_factor = ratio;
        if self.load_factor(s.len()) > ratio {
            self.rehash(s, 0);
        }
    }

    /// Scans the bucket a query hashes to. O(1) average, O(bucket) worst.
    pub(crate) fn find<K, V, Q>(
        &self,
        s: &Storage<Pair<K, V>>,
        hash: u64,
        q: &Q,
    ) -> Option<DefaultKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        self.buckets[self.bucket_of(hash)]
            .iter()
            .copied()
            .find(|&k| s.entry(k).map(|e| e.key.borrow() == q).unwrap_or(false))
    }

    /// Registers an already-spliced node, growing the table when the
    /// insertion exceeds the load-factor cap. The hash is cached before
    /// any growth: `k` is already in the list, and a rehash walk must be
    /// able to resolve every listed node's cached hash.
    pub(crate) fn insert<K, V>(&mut self, s: &Storage<Pair<K, V>>, k: DefaultKey, hash: u64)
    where
        K: Eq,
    {
        self.hashes.insert(k, hash);
        if s.len() as f32 > self.buckets.len() as f32 * self.max_load_factor {
            // The rehash walk re-places every listed node, `k` included.
            let doubled = self.buckets.len() * 2;
            self.rehash(s, doubled);
        } else {
            self.place(s, k, hash);
        }
    }

    // Placement keeps one key's duplicates adjacent within their bucket:
    // a new handle goes right after the last equal-key handle, else at
    // the bucket tail.
    fn place<K, V>(&mut self, s: &Storage<Pair<K, V>>, k: DefaultKey, hash: u64)
    where
        K: Eq,
    {
        let b = self.bucket_of(hash);
        let at = {
            let key = &s
                .entry(k)
                .expect("placed handles always resolve in the storage arena")
                .key;
            let bucket = &self.buckets[b];
            let mut at = bucket.len();
            for (i, &other) in bucket.iter().enumerate().rev() {
                if other == k {
                    continue;
                }
                if s.entry(other).map(|e| e.key == *key).unwrap_or(false) {
                    at = i + 1;
                    break;
                }
            }
            at
        };
        self.buckets[b].insert(at, k);
    }

    /// Drops the bucket reference of `k` by identity. O(bucket).
    pub(crate) fn erase(&mut self, k: DefaultKey) {
        if let Some(hash) = self.hashes.remove(k) {
            let b = self.bucket_of(hash);
            if let Some(i) = self.buckets[b].iter().position(|&x| x == k) {
                self.buckets[b].remove(i);
            }
        }
    }

    /// Redistributes every node over at least `n` fresh buckets (never
    /// fewer than the current size requires at the configured cap). Node
    /// identities and list order are untouched.
    pub(crate) fn rehash<K, V>(&mut self, s: &Storage<Pair<K, V>>, n: usize)
    where
        K: Eq,
    {
        let floor = (s.len() as f32 / self.max_load_factor).ceil() as usize;
        let count = n.max(floor).max(1);
        self.buckets = vec![Vec::new(); count];
        // Reassign in list order so bucket scans keep resolving to the
        // earliest-inserted of an equal run.
        let mut cur = s.head();
        while cur != s.sentinel() {
            let hash = self.hashes[cur];
            self.place(s, cur, hash);
            cur = s.next(cur);
        }
    }

    /// Prepares the table for `n` elements without violating the cap.
    pub(crate) fn reserve<K, V>(&mut self, s: &Storage<Pair<K, V>>, n: usize)
    where
        K: Eq,
    {
        let wanted = (n as f32 / self.max_load_factor).ceil() as usize;
        self.rehash(s, wanted);
    }

    /// Empties every bucket but keeps the bucket count.
    pub(crate) fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.hashes.clear();
    }

    /// Membership invariant: every node sits in the bucket its cached
    /// hash selects, and every bucket entry resolves.
    #[cfg(test)]
    pub(crate) fn validate<K, V>(&self, s: &Storage<Pair<K, V>>) {
        let mut seen = 0;
        for (i, bucket) in self.buckets.iter().enumerate() {
            for &k in bucket {
                assert!(s.entry(k).is_some(), "bucket entry must resolve");
                assert_eq!(self.bucket_of(self.hashes[k]), i, "node in wrong bucket");
                seen += 1;
            }
        }
        assert_eq!(seen, s.len(), "bucket population must equal list size");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::RandomState;

    type S = Storage<Pair<String, i32>>;

    fn index_with(buckets: usize) -> HashIndex<RandomState> {
        HashIndex::with_config(
            RandomState::new(),
            HashConfig {
                initial_buckets: buckets,
                max_load_factor: 1.0,
            },
        )
    }

    fn put(ix: &mut HashIndex<RandomState>, s: &mut S, key: &str, value: i32) -> DefaultKey {
        let hash = ix.make_hash(key);
        let k = s.push_back(Pair {
            key: key.to_string(),
            value,
        });
        ix.insert(s, k, hash);
        k
    }

    /// A single-bucket table still resolves every key through equality.
    #[test]
    fn single_bucket_lookup() {
        let mut s = S::new();
        let mut ix = index_with(1);
        ix.max_load_factor = 100.0; // keep it from growing
        for (i, key) in ["a", "b", "c", "d"].iter().enumerate() {
            put(&mut ix, &mut s, key, i as i32);
        }
        ix.validate(&s);
        for key in ["a", "b", "c", "d"] {
            let hash = ix.make_hash(key);
            let k = ix.find(&s, hash, key).expect("present key resolves");
            assert_eq!(s.entry(k).map(|e| e.key.as_str()), Some(key));
        }
        let hash = ix.make_hash("missing");
        assert!(ix.find(&s, hash, "missing").is_none());
    }

    /// The insert that crosses the cap grows the table with the new node
    /// already listed but not yet placed; the rehash walk must resolve its
    /// cached hash and land it in a bucket.
    #[test]
    fn crossing_insert_places_the_new_node() {
        let mut s = S::new();
        let mut ix = index_with(1);
        put(&mut ix, &mut s, "a", 1);
        let b = put(&mut ix, &mut s, "b", 2);
        ix.validate(&s);
        assert!(ix.bucket_count() >= 2);
        let hash = ix.make_hash("b");
        assert_eq!(ix.find(&s, hash, "b"), Some(b));
    }

    /// Growth keeps every node in the bucket its cached hash selects and
    /// never rehashes keys through `K: Hash` again.
    #[test]
    fn growth_preserves_membership() {
        let mut s = S::new();
        let mut ix = index_with(1);
        for i in 0..64 {
            put(&mut ix, &mut s, &format!("k{i}"), i);
            ix.validate(&s);
        }
        assert!(ix.bucket_count() >= 64);
        for i in 0..64 {
            let key = format!("k{i}");
            let hash = ix.make_hash(key.as_str());
            assert!(ix.find(&s, hash, key.as_str()).is_some());
        }
    }

    /// `reserve(n)` sizes the table to hold `n` nodes at the cap.
    #[test]
    fn reserve_honours_load_factor() {
        let mut s = S::new();
        let mut ix = HashIndex::with_config(
            RandomState::new(),
            HashConfig {
                initial_buckets: 1,
                max_load_factor: 0.5,
            },
        );
        for i in 0..10 {
            put(&mut ix, &mut s, &format!("k{i}"), i);
        }
        ix.reserve(&s, 100);
        assert!(ix.bucket_count() as f32 >= 100.0 / ix.max_load_factor());
        ix.validate(&s);
    }

    /// Erase removes exactly the one handle, leaving siblings resolvable.
    #[test]
    fn erase_is_by_identity() {
        let mut s = S::new();
        let mut ix = index_with(1);
        ix.max_load_factor = 100.0;
        let a = put(&mut ix, &mut s, "dup", 1);
        let b = put(&mut ix, &mut s, "dup", 2);
        ix.erase(a);
        s.unlink(a);
        ix.validate(&s);
        let hash = ix.make_hash("dup");
        assert_eq!(ix.find(&s, hash, "dup"), Some(b));
    }

    /// Duplicate keys stay adjacent within their bucket, earliest first.
    #[test]
    fn duplicates_contiguous_in_bucket() {
        let mut s = S::new();
        let mut ix = index_with(1);
        ix.max_load_factor = 100.0;
        let a1 = put(&mut ix, &mut s, "a", 1);
        put(&mut ix, &mut s, "x", 0);
        let a2 = put(&mut ix, &mut s, "a", 2);
        let a3 = put(&mut ix, &mut s, "a", 3);

        let bucket = ix.bucket_handles(0);
        let run: Vec<DefaultKey> = bucket
            .iter()
            .copied()
            .filter(|&k| s.entry(k).map(|e| e.key == "a").unwrap_or(false))
            .collect();
        assert_eq!(run, vec![a1, a2, a3]);
        let first = bucket
            .iter()
            .position(|&k| k == a1)
            .expect("first duplicate present");
        assert_eq!(bucket[first + 1], a2);
        assert_eq!(bucket[first + 2], a3);
    }
}
