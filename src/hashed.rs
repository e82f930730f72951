//! Hashed containers: one storage list in pure insertion order plus the
//! bucket-table index, behind four façades (`HashedMap`, `HashedSet`,
//! `HashedMultiMap`, `HashedMultiSet`).
//!
//! Global iteration always follows insertion order; the per-bucket
//! iterators are what expose one key's duplicates contiguously. As in the
//! ordered family, the Unique/Multi policy is a value injected at
//! construction and the set variants store `V = ()`.

use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::mem;

use slotmap::DefaultKey;
use std::collections::hash_map::RandomState;

use crate::error::Error;
use crate::guard::Exclusion;
use crate::hash_index::{HashConfig, HashIndex};
use crate::storage::{step_next, step_prev, Handle, Iter, IterMut, Keys, Pair, Policy, Storage};

#[derive(Clone, Debug)]
pub(crate) struct HashedCore<K, V, S> {
    storage: Storage<Pair<K, V>>,
    index: HashIndex<S>,
    policy: Policy,
    guard: Exclusion,
}

impl<K, V, S> HashedCore<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn with_config(hasher: S, config: HashConfig, policy: Policy) -> Self {
        HashedCore {
            storage: Storage::new(),
            index: HashIndex::with_config(hasher, config),
            policy,
            guard: Exclusion::new(),
        }
    }

    fn len(&self) -> usize {
        self.storage.len()
    }

    fn begin(&self) -> Handle {
        Handle::new(self.storage.head())
    }

    fn end(&self) -> Handle {
        Handle::new(self.storage.sentinel())
    }

    fn pair_at(&self, h: Handle) -> Option<(&K, &V)> {
        self.storage.entry(h.raw()).map(|e| (&e.key, &e.value))
    }

    fn value_at_mut(&mut self, h: Handle) -> Option<&mut V> {
        self.storage.entry_mut(h.raw()).map(|e| &mut e.value)
    }

    fn insert(&mut self, key: K, value: V) -> (Handle, bool) {
        let _g = self.guard.enter();
        let hash = self.index.make_hash(&key);
        if self.policy == Policy::Unique {
            if let Some(existing) = self.index.find(&self.storage, hash, &key) {
                return (Handle::new(existing), false);
            }
        }
        // New elements always go to the list tail: insertion order.
        let k = self.storage.push_back(Pair { key, value });
        self.index.insert(&self.storage, k, hash);
        (Handle::new(k), true)
    }

    fn insert_or_assign(&mut self, key: K, value: V) -> (Handle, Option<V>) {
        let _g = self.guard.enter();
        let hash = self.index.make_hash(&key);
        if let Some(existing) = self.index.find(&self.storage, hash, &key) {
            let slot = self
                .storage
                .entry_mut(existing)
                .expect("indexed handles always resolve");
            let old = mem::replace(&mut slot.value, value);
            return (Handle::new(existing), Some(old));
        }
        let k = self.storage.push_back(Pair { key, value });
        self.index.insert(&self.storage, k, hash);
        (Handle::new(k), None)
    }

    fn find_first<Q>(&self, q: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.guard.enter();
        let hash = self.index.make_hash(q);
        self.index.find(&self.storage, hash, q).map(Handle::new)
    }

    fn count<Q>(&self, q: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.guard.enter();
        let hash = self.index.make_hash(q);
        self.index
            .bucket_handles(self.index.bucket_of(hash))
            .iter()
            .filter(|&&k| {
                self.storage
                    .entry(k)
                    .map(|e| e.key.borrow() == q)
                    .unwrap_or(false)
            })
            .count()
    }

    fn value<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let h = self.find_first(q)?;
        self.storage.entry(h.raw()).map(|e| &e.value)
    }

    fn value_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let h = self.find_first(q)?;
        self.storage.entry_mut(h.raw()).map(|e| &mut e.value)
    }

    fn remove_first<Q>(&mut self, q: &Q) -> Option<Pair<K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.guard.enter();
        let hash = self.index.make_hash(q);
        let k = self.index.find(&self.storage, hash, q)?;
        self.index.erase(k);
        Some(self.storage.unlink(k))
    }

    fn remove_all<Q>(&mut self, q: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.guard.enter();
        let hash = self.index.make_hash(q);
        let matches: Vec<DefaultKey> = self
            .index
            .bucket_handles(self.index.bucket_of(hash))
            .iter()
            .copied()
            .filter(|&k| {
                self.storage
                    .entry(k)
                    .map(|e| e.key.borrow() == q)
                    .unwrap_or(false)
            })
            .collect();
        for &k in &matches {
            self.index.erase(k);
            self.storage.unlink(k);
        }
        matches.len()
    }

    fn remove_at(&mut self, h: Handle) -> Result<Pair<K, V>, Error> {
        let _g = self.guard.enter();
        let k = h.raw();
        if !self.storage.owns(k) || k == self.storage.sentinel() {
            return Err(Error::InvalidArgument);
        }
        self.index.erase(k);
        Ok(self.storage.unlink(k))
    }

    /// Erases `[first, last)` in list order. The range is walked before
    /// anything is erased, so a bad range changes nothing.
    fn remove_range(&mut self, first: Handle, last: Handle) -> Result<usize, Error> {
        let _g = self.guard.enter();
        if !self.storage.owns(first.raw()) || !self.storage.owns(last.raw()) {
            return Err(Error::InvalidArgument);
        }
        let mut span = Vec::new();
        let mut cur = first.raw();
        while cur != last.raw() {
            if cur == self.storage.sentinel() {
                return Err(Error::InvalidArgument);
            }
            span.push(cur);
            cur = self.storage.next(cur);
        }
        for &k in &span {
            self.index.erase(k);
            self.storage.unlink(k);
        }
        Ok(span.len())
    }

    fn clear(&mut self) {
        let _g = self.guard.enter();
        self.storage.clear();
        self.index.clear();
    }

    fn rehash(&mut self, n: usize) {
        let _g = self.guard.enter();
        self.index.rehash(&self.storage, n);
    }

    fn reserve(&mut self, n: usize) {
        let _g = self.guard.enter();
        self.index.reserve(&self.storage, n);
    }

    fn set_max_load_factor(&mut self, ratio: f32) -> Result<(), Error> {
        let _g = self.guard.enter();
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(Error::InvalidArgument);
        }
        self.index.set_max_load_factor(&self.storage, ratio);
        Ok(())
    }

    fn bucket<Q>(&self, q: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash,
    {
        self.index.bucket_of(self.index.make_hash(q))
    }

    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        self.index.validate(&self.storage);
    }
}

/// Walks the handles of one bucket, yielding `(&K, &V)`. One key's
/// duplicates appear contiguously, earliest inserted first.
pub struct BucketIter<'a, K, V> {
    storage: &'a Storage<Pair<K, V>>,
    handles: core::slice::Iter<'a, DefaultKey>,
}

impl<'a, K, V> Iterator for BucketIter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let &k = self.handles.next()?;
        self.storage.entry(k).map(|e| (&e.key, &e.value))
    }
}

// Takes the node value type, since the set façades have no `V` parameter.
macro_rules! hashed_common {
    ($v:ty) => {
        pub fn len(&self) -> usize {
            self.core.len()
        }

        pub fn is_empty(&self) -> bool {
            self.core.len() == 0
        }

        /// Handle of the earliest-inserted element, or `end()`.
        pub fn begin(&self) -> Handle {
            self.core.begin()
        }

        /// The permanent past-the-end handle.
        pub fn end(&self) -> Handle {
            self.core.end()
        }

        /// Steps a handle forward in insertion order.
        pub fn next(&self, h: Handle) -> Result<Handle, Error> {
            step_next(&self.core.storage, h)
        }

        /// Steps a handle backward; `prev(end())` is the last element.
        pub fn prev(&self, h: Handle) -> Result<Handle, Error> {
            step_prev(&self.core.storage, h)
        }

        /// Removes `[first, last)` in insertion order, returning how many
        /// elements went.
        pub fn remove_range(&mut self, first: Handle, last: Handle) -> Result<usize, Error> {
            self.core.remove_range(first, last)
        }

        /// Drops every element; the bucket count and `end()` handles stay.
        pub fn clear(&mut self) {
            self.core.clear();
        }

        /// O(1) exchange of the entire contents (hasher included).
        pub fn swap(&mut self, other: &mut Self) {
            mem::swap(self, other);
        }

        /// Handle of the first element equal to `q` (earliest inserted).
        pub fn find<Q>(&self, q: &Q) -> Option<Handle>
        where
            K: Borrow<Q>,
            Q: ?Sized + Hash + Eq,
        {
            self.core.find_first(q)
        }

        /// Number of elements with key equal to `q`.
        pub fn count<Q>(&self, q: &Q) -> usize
        where
            K: Borrow<Q>,
            Q: ?Sized + Hash + Eq,
        {
            self.core.count(q)
        }

        /// Index of the bucket `q` hashes to. The query must hash the way
        /// the stored key does, hence the same borrow seam as `find`.
        pub fn bucket<Q>(&self, q: &Q) -> usize
        where
            K: Borrow<Q>,
            Q: ?Sized + Hash,
        {
            self.core.bucket(q)
        }

        pub fn bucket_count(&self) -> usize {
            self.core.index.bucket_count()
        }

        pub fn bucket_len(&self, i: usize) -> usize {
            self.core.index.bucket_len(i)
        }

        /// Iterates the elements of bucket `i`.
        pub fn bucket_iter(&self, i: usize) -> BucketIter<'_, K, $v> {
            BucketIter {
                storage: &self.core.storage,
                handles: self.core.index.bucket_handles(i).iter(),
            }
        }

        /// Current occupancy, `len() / bucket_count()`.
        pub fn load_factor(&self) -> f32 {
            self.core.index.load_factor(self.core.len())
        }

        /// The growth cap; exceeding it on insert triggers a rehash.
        pub fn max_load_factor(&self) -> f32 {
            self.core.index.max_load_factor()
        }

        /// Adjusts the growth cap, rehashing if already violated.
        /// Non-positive or non-finite ratios are `InvalidArgument`.
        pub fn set_max_load_factor(&mut self, ratio: f32) -> Result<(), Error> {
            self.core.set_max_load_factor(ratio)
        }

        /// Redistributes all elements over at least `n` buckets. Iteration
        /// order and handles are unaffected.
        pub fn rehash(&mut self, n: usize) {
            self.core.rehash(n);
        }

        /// Sizes the table for `n` elements at the current cap.
        pub fn reserve(&mut self, n: usize) {
            self.core.reserve(n);
        }

        #[cfg(test)]
        pub(crate) fn assert_invariants(&self) {
            self.core.assert_invariants();
        }
    };
}

macro_rules! hashed_set_common {
    () => {
        hashed_common!(());

        pub fn contains<Q>(&self, q: &Q) -> bool
        where
            K: Borrow<Q>,
            Q: ?Sized + Hash + Eq,
        {
            self.core.find_first(q).is_some()
        }

        /// Removes the element behind a live handle, returning its key.
        pub fn remove_at(&mut self, h: Handle) -> Result<K, Error> {
            self.core.remove_at(h).map(|p| p.key)
        }

        /// Key behind a live handle; `None` for `end()` and stale ones.
        pub fn get_at(&self, h: Handle) -> Option<&K> {
            self.core.pair_at(h).map(|(k, _)| k)
        }

        /// Iterates keys in insertion order.
        pub fn iter(&self) -> Keys<'_, K, ()> {
            Keys::new(&self.core.storage)
        }
    };
}

/// Unique-key hash map iterating in insertion order.
#[derive(Clone)]
pub struct HashedMap<K, V, S = RandomState> {
    core: HashedCore<K, V, S>,
}

impl<K, V> HashedMap<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_hasher_and_config(RandomState::new(), HashConfig::default())
    }

    pub fn with_config(config: HashConfig) -> Self {
        Self::with_hasher_and_config(RandomState::new(), config)
    }
}

impl<K, V> Default for HashedMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> HashedMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_hasher_and_config(hasher, HashConfig::default())
    }

    pub fn with_hasher_and_config(hasher: S, config: HashConfig) -> Self {
        HashedMap {
            core: HashedCore::with_config(hasher, config, Policy::Unique),
        }
    }

    hashed_common!(V);

    /// Inserts `key` unless an equal key exists. Returns the element's
    /// handle and whether a new element was created.
    pub fn insert(&mut self, key: K, value: V) -> (Handle, bool) {
        self.core.insert(key, value)
    }

    /// Inserts or overwrites, returning the previous value if any.
    pub fn insert_or_assign(&mut self, key: K, value: V) -> (Handle, Option<V>) {
        self.core.insert_or_assign(key, value)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.core.find_first(q).is_some()
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.core.value(q)
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.core.value_mut(q)
    }

    /// Like [`get`](Self::get) but a missing key is `Error::OutOfRange`.
    pub fn at<Q>(&self, q: &Q) -> Result<&V, Error>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.core.value(q).ok_or(Error::OutOfRange)
    }

    /// Removes the element with key `q`; absent keys are a `None` no-op.
    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.core.remove_first(q).map(|p| p.value)
    }

    /// Removes the element behind a live handle.
    pub fn remove_at(&mut self, h: Handle) -> Result<(K, V), Error> {
        self.core.remove_at(h).map(|p| (p.key, p.value))
    }

    pub fn get_at(&self, h: Handle) -> Option<(&K, &V)> {
        self.core.pair_at(h)
    }

    pub fn get_at_mut(&mut self, h: Handle) -> Option<&mut V> {
        self.core.value_at_mut(h)
    }

    /// Iterates `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.core.storage)
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut::new(&mut self.core.storage)
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys::new(&self.core.storage)
    }

    pub fn values(&self) -> crate::storage::Values<'_, K, V> {
        crate::storage::Values::new(&self.core.storage)
    }
}

impl<K, V, S> fmt::Debug for HashedMap<K, V, S>
where
    K: Eq + Hash + fmt::Debug,
    V: fmt::Debug,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> Extend<(K, V)> for HashedMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert_or_assign(k, v);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for HashedMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::with_hasher(S::default());
        map.extend(iter);
        map
    }
}

/// Multi-key hash map; global iteration is insertion order, while
/// [`bucket_iter`](Self::bucket_iter) shows equal keys contiguously.
#[derive(Clone)]
pub struct HashedMultiMap<K, V, S = RandomState> {
    core: HashedCore<K, V, S>,
}

impl<K, V> HashedMultiMap<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_hasher_and_config(RandomState::new(), HashConfig::default())
    }

    pub fn with_config(config: HashConfig) -> Self {
        Self::with_hasher_and_config(RandomState::new(), config)
    }
}

impl<K, V> Default for HashedMultiMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> HashedMultiMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_hasher_and_config(hasher, HashConfig::default())
    }

    pub fn with_hasher_and_config(hasher: S, config: HashConfig) -> Self {
        HashedMultiMap {
            core: HashedCore::with_config(hasher, config, Policy::Multi),
        }
    }

    hashed_common!(V);

    /// Always inserts, at the list tail.
    pub fn insert(&mut self, key: K, value: V) -> Handle {
        self.core.insert(key, value).0
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.core.find_first(q).is_some()
    }

    /// Removes every element with key `q`, returning how many went.
    pub fn remove_all<Q>(&mut self, q: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.core.remove_all(q)
    }

    /// Removes the element behind a live handle.
    pub fn remove_at(&mut self, h: Handle) -> Result<(K, V), Error> {
        self.core.remove_at(h).map(|p| (p.key, p.value))
    }

    pub fn get_at(&self, h: Handle) -> Option<(&K, &V)> {
        self.core.pair_at(h)
    }

    pub fn get_at_mut(&mut self, h: Handle) -> Option<&mut V> {
        self.core.value_at_mut(h)
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.core.storage)
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut::new(&mut self.core.storage)
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys::new(&self.core.storage)
    }
}

impl<K, V, S> fmt::Debug for HashedMultiMap<K, V, S>
where
    K: Eq + Hash + fmt::Debug,
    V: fmt::Debug,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> Extend<(K, V)> for HashedMultiMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for HashedMultiMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::with_hasher(S::default());
        map.extend(iter);
        map
    }
}

/// Unique-key hash set iterating in insertion order.
#[derive(Clone)]
pub struct HashedSet<K, S = RandomState> {
    core: HashedCore<K, (), S>,
}

impl<K> HashedSet<K>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_hasher_and_config(RandomState::new(), HashConfig::default())
    }

    pub fn with_config(config: HashConfig) -> Self {
        Self::with_hasher_and_config(RandomState::new(), config)
    }
}

impl<K> Default for HashedSet<K>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, S> HashedSet<K, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_hasher_and_config(hasher, HashConfig::default())
    }

    pub fn with_hasher_and_config(hasher: S, config: HashConfig) -> Self {
        HashedSet {
            core: HashedCore::with_config(hasher, config, Policy::Unique),
        }
    }

    hashed_set_common!();

    /// Inserts `key` unless an equal key exists.
    pub fn insert(&mut self, key: K) -> (Handle, bool) {
        self.core.insert(key, ())
    }

    /// Removes `q`, reporting whether it was present.
    pub fn remove<Q>(&mut self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.core.remove_first(q).is_some()
    }
}

impl<K, S> fmt::Debug for HashedSet<K, S>
where
    K: Eq + Hash + fmt::Debug,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K, S> Extend<K> for HashedSet<K, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for k in iter {
            self.insert(k);
        }
    }
}

impl<K, S> FromIterator<K> for HashedSet<K, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut set = Self::with_hasher(S::default());
        set.extend(iter);
        set
    }
}

/// Multi-key hash set; duplicates are contiguous per bucket.
#[derive(Clone)]
pub struct HashedMultiSet<K, S = RandomState> {
    core: HashedCore<K, (), S>,
}

impl<K> HashedMultiSet<K>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_hasher_and_config(RandomState::new(), HashConfig::default())
    }

    pub fn with_config(config: HashConfig) -> Self {
        Self::with_hasher_and_config(RandomState::new(), config)
    }
}

impl<K> Default for HashedMultiSet<K>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, S> HashedMultiSet<K, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_hasher_and_config(hasher, HashConfig::default())
    }

    pub fn with_hasher_and_config(hasher: S, config: HashConfig) -> Self {
        HashedMultiSet {
            core: HashedCore::with_config(hasher, config, Policy::Multi),
        }
    }

    hashed_set_common!();

    /// Always inserts, at the list tail.
    pub fn insert(&mut self, key: K) -> Handle {
        self.core.insert(key, ()).0
    }

    /// Removes every element equal to `q`, returning how many went.
    pub fn remove_all<Q>(&mut self, q: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.core.remove_all(q)
    }
}

impl<K, S> fmt::Debug for HashedMultiSet<K, S>
where
    K: Eq + Hash + fmt::Debug,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K, S> Extend<K> for HashedMultiSet<K, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for k in iter {
            self.insert(k);
        }
    }
}

impl<K, S> FromIterator<K> for HashedMultiSet<K, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut set = Self::with_hasher(S::default());
        set.extend(iter);
        set
    }
}
