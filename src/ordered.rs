//! Ordered containers: one storage list kept key-sorted by the red-black
//! index, behind four façades (`OrderedMap`, `OrderedSet`,
//! `OrderedMultiMap`, `OrderedMultiSet`).
//!
//! All four share `OrderedCore`: the Unique/Multi policy is a value
//! injected at construction, and the set variants store `V = ()`. Every
//! mutation performs its list splice/unlink and tree insert/erase before
//! returning, so the (list, tree) pair is never observably inconsistent.

use core::borrow::Borrow;
use core::cmp::Ordering;
use core::fmt;
use core::mem;

use slotmap::{DefaultKey, Key};

use crate::error::Error;
use crate::guard::Exclusion;
use crate::ordered_index::{Comparator, OrdComparator, Place, RbTree, Side};
use crate::storage::{step_next, step_prev, Handle, Iter, IterMut, Keys, Pair, Policy, Storage};

#[derive(Clone, Debug)]
pub(crate) struct OrderedCore<K, V, C> {
    storage: Storage<Pair<K, V>>,
    tree: RbTree,
    cmp: C,
    policy: Policy,
    guard: Exclusion,
}

// Splices before/after the attachment parent per the side reported by the
// descent, then registers the node in the tree. A free function over the
// core's fields, so callers can hold the guard token alongside it.
fn link_at<K, V>(
    storage: &mut Storage<Pair<K, V>>,
    tree: &mut RbTree,
    parent: DefaultKey,
    side: Side,
    key: K,
    value: V,
) -> DefaultKey {
    let pos = if parent.is_null() {
        storage.sentinel()
    } else {
        match side {
            Side::Left => parent,
            Side::Right => storage.next(parent),
        }
    };
    let h = storage.insert_before(pos, Pair { key, value });
    tree.link(h, parent, side);
    h
}

fn insert_inner<K, V, C>(
    storage: &mut Storage<Pair<K, V>>,
    tree: &mut RbTree,
    cmp: &C,
    policy: Policy,
    key: K,
    value: V,
) -> (DefaultKey, bool)
where
    C: Comparator<K>,
{
    let place = match policy {
        Policy::Unique => tree.locate(storage, cmp, &key),
        Policy::Multi => tree.locate_leaf(storage, cmp, &key),
    };
    match place {
        Place::Equal(h) => (h, false),
        Place::Leaf { parent, side } => {
            (link_at(storage, tree, parent, side, key, value), true)
        }
    }
}

impl<K, V, C> OrderedCore<K, V, C> {
    fn new(cmp: C, policy: Policy) -> Self {
        OrderedCore {
            storage: Storage::new(),
            tree: RbTree::new(),
            cmp,
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

    fn clear(&mut self) {
        let _g = self.guard.enter();
        self.storage.clear();
        self.tree.clear();
    }

    fn insert(&mut self, key: K, value: V) -> (Handle, bool)
    where
        C: Comparator<K>,
    {
        let _g = self.guard.enter();
        let (h, inserted) = insert_inner(
            &mut self.storage,
            &mut self.tree,
            &self.cmp,
            self.policy,
            key,
            value,
        );
        (Handle::new(h), inserted)
    }

    fn insert_or_assign(&mut self, key: K, value: V) -> (Handle, Option<V>)
    where
        C: Comparator<K>,
    {
        let _g = self.guard.enter();
        match self.tree.locate(&self.storage, &self.cmp, &key) {
            Place::Equal(h) => {
                let slot = self
                    .storage
                    .entry_mut(h)
                    .expect("located handles always resolve");
                let old = mem::replace(&mut slot.value, value);
                (Handle::new(h), Some(old))
            }
            Place::Leaf { parent, side } => {
                let h = link_at(&mut self.storage, &mut self.tree, parent, side, key, value);
                (Handle::new(h), None)
            }
        }
    }

    /// Positional insertion. The hint must be a live handle of this
    /// container whose position keeps the list sorted around `key`;
    /// anything else is `InvalidArgument` and the container is unchanged.
    fn insert_hint(&mut self, hint: Handle, key: K, value: V) -> Result<(Handle, bool), Error>
    where
        C: Comparator<K>,
    {
        let _g = self.guard.enter();
        let h = hint.raw();
        if !self.storage.owns(h) {
            return Err(Error::InvalidArgument);
        }
        let prev = self.storage.prev(h);
        let prev_ok = prev == self.storage.sentinel()
            || self
                .storage
                .entry(prev)
                .map(|e| self.cmp.cmp(&e.key, &key) != Ordering::Greater)
                .unwrap_or(false);
        let next_ok = h == self.storage.sentinel()
            || self
                .storage
                .entry(h)
                .map(|e| self.cmp.cmp(&key, &e.key) != Ordering::Greater)
                .unwrap_or(false);
        if !(prev_ok && next_ok) {
            return Err(Error::InvalidArgument);
        }
        // The hint only vouches for position validity; registration still
        // goes through the descent so the tree shape stays canonical.
        let (h, inserted) = insert_inner(
            &mut self.storage,
            &mut self.tree,
            &self.cmp,
            self.policy,
            key,
            value,
        );
        Ok((Handle::new(h), inserted))
    }

    // First node of the equal run for `q`, without the guard held.
    fn locate_first<Q>(&self, q: &Q) -> Option<DefaultKey>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        match self.policy {
            Policy::Unique => self.tree.find(&self.storage, &self.cmp, q),
            Policy::Multi => {
                let lb = self.tree.lower_bound(&self.storage, &self.cmp, q);
                let e = self.storage.entry(lb)?;
                (self.cmp.cmp(e.key.borrow(), q) == Ordering::Equal).then_some(lb)
            }
        }
    }

    fn raw_equal_range<Q>(&self, q: &Q) -> (DefaultKey, DefaultKey)
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        let lb = self.tree.lower_bound(&self.storage, &self.cmp, q);
        let start = if lb.is_null() {
            self.storage.sentinel()
        } else {
            lb
        };
        let mut end = start;
        while end != self.storage.sentinel() {
            match self.storage.entry(end) {
                Some(e) if self.cmp.cmp(e.key.borrow(), q) == Ordering::Equal => {
                    end = self.storage.next(end);
                }
                _ => break,
            }
        }
        (start, end)
    }

    fn find_first<Q>(&self, q: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        let _g = self.guard.enter();
        self.locate_first(q).map(Handle::new)
    }

    fn count<Q>(&self, q: &Q) -> usize
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        let _g = self.guard.enter();
        match self.policy {
            Policy::Unique => usize::from(self.tree.find(&self.storage, &self.cmp, q).is_some()),
            Policy::Multi => {
                let (mut cur, end) = self.raw_equal_range(q);
                let mut n = 0;
                while cur != end {
                    n += 1;
                    cur = self.storage.next(cur);
                }
                n
            }
        }
    }

    fn lower_bound<Q>(&self, q: &Q) -> Handle
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        let _g = self.guard.enter();
        let lb = self.tree.lower_bound(&self.storage, &self.cmp, q);
        Handle::new(if lb.is_null() {
            self.storage.sentinel()
        } else {
            lb
        })
    }

    fn upper_bound<Q>(&self, q: &Q) -> Handle
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        let _g = self.guard.enter();
        let ub = self.tree.upper_bound(&self.storage, &self.cmp, q);
        Handle::new(if ub.is_null() {
            self.storage.sentinel()
        } else {
            ub
        })
    }

    fn equal_range<Q>(&self, q: &Q) -> (Handle, Handle)
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        let _g = self.guard.enter();
        let (a, b) = self.raw_equal_range(q);
        (Handle::new(a), Handle::new(b))
    }

    fn value<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        let _g = self.guard.enter();
        let h = self.locate_first(q)?;
        self.storage.entry(h).map(|e| &e.value)
    }

    fn value_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        let h = {
            let _g = self.guard.enter();
            self.locate_first(q)
        }?;
        self.storage.entry_mut(h).map(|e| &mut e.value)
    }

    fn remove_first<Q>(&mut self, q: &Q) -> Option<Pair<K, V>>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        let _g = self.guard.enter();
        let h = self.locate_first(q)?;
        self.tree.erase(h);
        Some(self.storage.unlink(h))
    }

    fn remove_all<Q>(&mut self, q: &Q) -> usize
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        let _g = self.guard.enter();
        let (mut cur, end) = self.raw_equal_range(q);
        let mut n = 0;
        while cur != end {
            let next = self.storage.next(cur);
            self.tree.erase(cur);
            self.storage.unlink(cur);
            n += 1;
            cur = next;
        }
        n
    }

    fn remove_at(&mut self, h: Handle) -> Result<Pair<K, V>, Error> {
        let _g = self.guard.enter();
        let k = h.raw();
        if !self.storage.owns(k) || k == self.storage.sentinel() {
            return Err(Error::InvalidArgument);
        }
        self.tree.erase(k);
        Ok(self.storage.unlink(k))
    }

    /// Erases `[first, last)`. Both handles must belong to this container
    /// and `last` must be reachable from `first`; the range is walked
    /// before anything is erased, so a bad range changes nothing.
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
        for h in &span {
            self.tree.erase(*h);
            self.storage.unlink(*h);
        }
        Ok(span.len())
    }

    #[cfg(test)]
    pub(crate) fn assert_invariants(&self)
    where
        C: Comparator<K>,
    {
        self.tree.validate(&self.storage);
        let mut cur = self.storage.head();
        while cur != self.storage.sentinel() {
            let next = self.storage.next(cur);
            if next != self.storage.sentinel() {
                let a = &self.storage.entry(cur).unwrap().key;
                let b = &self.storage.entry(next).unwrap().key;
                assert_ne!(
                    self.cmp.cmp(b, a),
                    Ordering::Less,
                    "adjacent nodes out of comparator order"
                );
            }
            cur = next;
        }
    }
}

macro_rules! ordered_common {
    () => {
        /// Number of elements.
        pub fn len(&self) -> usize {
            self.core.len()
        }

        pub fn is_empty(&self) -> bool {
            self.core.len() == 0
        }

        /// Handle of the first element in comparator order, or `end()`.
        pub fn begin(&self) -> Handle {
            self.core.begin()
        }

        /// The permanent past-the-end handle.
        pub fn end(&self) -> Handle {
            self.core.end()
        }

        /// Steps a handle forward in comparator order.
        pub fn next(&self, h: Handle) -> Result<Handle, Error> {
            step_next(&self.core.storage, h)
        }

        /// Steps a handle backward; `prev(end())` is the last element.
        pub fn prev(&self, h: Handle) -> Result<Handle, Error> {
            step_prev(&self.core.storage, h)
        }

        /// Removes `[first, last)`, returning how many elements went.
        pub fn remove_range(&mut self, first: Handle, last: Handle) -> Result<usize, Error> {
            self.core.remove_range(first, last)
        }

        /// Drops every element; `end()` handles stay valid.
        pub fn clear(&mut self) {
            self.core.clear();
        }

        /// O(1) exchange of the entire contents (comparator included).
        pub fn swap(&mut self, other: &mut Self) {
            mem::swap(self, other);
        }

        /// First element not less than `q`, or `end()`.
        pub fn lower_bound<Q>(&self, q: &Q) -> Handle
        where
            K: Borrow<Q>,
            C: Comparator<Q>,
            Q: ?Sized,
        {
            self.core.lower_bound(q)
        }

        /// First element greater than `q`, or `end()`.
        pub fn upper_bound<Q>(&self, q: &Q) -> Handle
        where
            K: Borrow<Q>,
            C: Comparator<Q>,
            Q: ?Sized,
        {
            self.core.upper_bound(q)
        }

        /// The half-open run of elements equal to `q`.
        pub fn equal_range<Q>(&self, q: &Q) -> (Handle, Handle)
        where
            K: Borrow<Q>,
            C: Comparator<Q>,
            Q: ?Sized,
        {
            self.core.equal_range(q)
        }

        /// Handle of the first element equal to `q`.
        pub fn find<Q>(&self, q: &Q) -> Option<Handle>
        where
            K: Borrow<Q>,
            C: Comparator<Q>,
            Q: ?Sized,
        {
            self.core.find_first(q)
        }

        /// Number of elements with key equal to `q`.
        pub fn count<Q>(&self, q: &Q) -> usize
        where
            K: Borrow<Q>,
            C: Comparator<Q>,
            Q: ?Sized,
        {
            self.core.count(q)
        }

        #[cfg(test)]
        pub(crate) fn assert_invariants(&self)
        where
            C: Comparator<K>,
        {
            self.core.assert_invariants();
        }
    };
}

macro_rules! set_common {
    () => {
        ordered_common!();

        pub fn contains<Q>(&self, q: &Q) -> bool
        where
            K: Borrow<Q>,
            C: Comparator<Q>,
            Q: ?Sized,
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

        pub fn first(&self) -> Option<&K> {
            self.core.pair_at(self.core.begin()).map(|(k, _)| k)
        }

        pub fn last(&self) -> Option<&K> {
            self.core
                .pair_at(Handle::new(self.core.storage.tail()))
                .map(|(k, _)| k)
        }

        /// Iterates keys in comparator order.
        pub fn iter(&self) -> Keys<'_, K, ()> {
            Keys::new(&self.core.storage)
        }
    };
}

/// Sorted unique-key map. Iteration follows comparator order; handles
/// stay valid until their element is removed.
#[derive(Clone)]
pub struct OrderedMap<K, V, C = OrdComparator> {
    core: OrderedCore<K, V, C>,
}

impl<K, V> OrderedMap<K, V> {
    pub fn new() -> Self {
        Self::with_comparator(OrdComparator)
    }
}

impl<K, V> Default for OrderedMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, C> OrderedMap<K, V, C> {
    pub fn with_comparator(cmp: C) -> Self {
        OrderedMap {
            core: OrderedCore::new(cmp, Policy::Unique),
        }
    }

    ordered_common!();

    /// Inserts `key` unless an equal key exists. Returns the element's
    /// handle and whether a new element was created; on rejection the
    /// existing element is untouched.
    pub fn insert(&mut self, key: K, value: V) -> (Handle, bool)
    where
        C: Comparator<K>,
    {
        self.core.insert(key, value)
    }

    /// Inserts or overwrites, returning the previous value if any.
    pub fn insert_or_assign(&mut self, key: K, value: V) -> (Handle, Option<V>)
    where
        C: Comparator<K>,
    {
        self.core.insert_or_assign(key, value)
    }

    /// Inserts next to a positional hint; see [`Error::InvalidArgument`]
    /// for the hint sanity rules.
    pub fn insert_hint(&mut self, hint: Handle, key: K, value: V) -> Result<(Handle, bool), Error>
    where
        C: Comparator<K>,
    {
        self.core.insert_hint(hint, key, value)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.core.find_first(q).is_some()
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.core.value(q)
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.core.value_mut(q)
    }

    /// Like [`get`](Self::get) but a missing key is `Error::OutOfRange`.
    pub fn at<Q>(&self, q: &Q) -> Result<&V, Error>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.core.value(q).ok_or(Error::OutOfRange)
    }

    /// Removes the element with key `q`; absent keys are a `None` no-op.
    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.core.remove_first(q).map(|p| p.value)
    }

    /// Removes the element behind a live handle.
    /// Stale or foreign handles are `InvalidArgument`.
    pub fn remove_at(&mut self, h: Handle) -> Result<(K, V), Error> {
        self.core.remove_at(h).map(|p| (p.key, p.value))
    }

    pub fn first(&self) -> Option<(&K, &V)> {
        self.core.pair_at(self.core.begin())
    }

    pub fn last(&self) -> Option<(&K, &V)> {
        self.core.pair_at(Handle::new(self.core.storage.tail()))
    }

    /// Key/value behind a live handle; `None` for `end()` and stale ones.
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

    pub fn values(&self) -> crate::storage::Values<'_, K, V> {
        crate::storage::Values::new(&self.core.storage)
    }
}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for OrderedMap<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, C> Extend<(K, V)> for OrderedMap<K, V, C>
where
    C: Comparator<K>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.core.insert_or_assign(k, v);
        }
    }
}

impl<K, V, C> FromIterator<(K, V)> for OrderedMap<K, V, C>
where
    C: Comparator<K> + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::with_comparator(C::default());
        map.extend(iter);
        map
    }
}

/// Sorted multi-key map; equal keys stay contiguous in iteration order,
/// new duplicates appended at the end of their run.
#[derive(Clone)]
pub struct OrderedMultiMap<K, V, C = OrdComparator> {
    core: OrderedCore<K, V, C>,
}

impl<K, V> OrderedMultiMap<K, V> {
    pub fn new() -> Self {
        Self::with_comparator(OrdComparator)
    }
}

impl<K, V> Default for OrderedMultiMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, C> OrderedMultiMap<K, V, C> {
    pub fn with_comparator(cmp: C) -> Self {
        OrderedMultiMap {
            core: OrderedCore::new(cmp, Policy::Multi),
        }
    }

    ordered_common!();

    /// Always inserts, appending after any existing equal keys.
    pub fn insert(&mut self, key: K, value: V) -> Handle
    where
        C: Comparator<K>,
    {
        self.core.insert(key, value).0
    }

    pub fn insert_hint(&mut self, hint: Handle, key: K, value: V) -> Result<Handle, Error>
    where
        C: Comparator<K>,
    {
        self.core.insert_hint(hint, key, value).map(|(h, _)| h)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.core.find_first(q).is_some()
    }

    /// Removes the whole equal run, returning how many elements went.
    pub fn remove_all<Q>(&mut self, q: &Q) -> usize
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
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

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for OrderedMultiMap<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, C> Extend<(K, V)> for OrderedMultiMap<K, V, C>
where
    C: Comparator<K>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, C> FromIterator<(K, V)> for OrderedMultiMap<K, V, C>
where
    C: Comparator<K> + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::with_comparator(C::default());
        map.extend(iter);
        map
    }
}

/// Sorted unique-key set.
#[derive(Clone)]
pub struct OrderedSet<K, C = OrdComparator> {
    core: OrderedCore<K, (), C>,
}

impl<K> OrderedSet<K> {
    pub fn new() -> Self {
        Self::with_comparator(OrdComparator)
    }
}

impl<K> Default for OrderedSet<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, C> OrderedSet<K, C> {
    pub fn with_comparator(cmp: C) -> Self {
        OrderedSet {
            core: OrderedCore::new(cmp, Policy::Unique),
        }
    }

    set_common!();

    /// Inserts `key` unless an equal key exists.
    pub fn insert(&mut self, key: K) -> (Handle, bool)
    where
        C: Comparator<K>,
    {
        self.core.insert(key, ())
    }

    /// Removes `q`, reporting whether it was present.
    pub fn remove<Q>(&mut self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.core.remove_first(q).is_some()
    }
}

impl<K: fmt::Debug, C> fmt::Debug for OrderedSet<K, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K, C> Extend<K> for OrderedSet<K, C>
where
    C: Comparator<K>,
{
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for k in iter {
            self.insert(k);
        }
    }
}

impl<K, C> FromIterator<K> for OrderedSet<K, C>
where
    C: Comparator<K> + Default,
{
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut set = Self::with_comparator(C::default());
        set.extend(iter);
        set
    }
}

/// Sorted multi-key set; duplicates stay contiguous in iteration order.
#[derive(Clone)]
pub struct OrderedMultiSet<K, C = OrdComparator> {
    core: OrderedCore<K, (), C>,
}

impl<K> OrderedMultiSet<K> {
    pub fn new() -> Self {
        Self::with_comparator(OrdComparator)
    }
}

impl<K> Default for OrderedMultiSet<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, C> OrderedMultiSet<K, C> {
    pub fn with_comparator(cmp: C) -> Self {
        OrderedMultiSet {
            core: OrderedCore::new(cmp, Policy::Multi),
        }
    }

    set_common!();

    /// Always inserts, appending after any existing equal keys.
    pub fn insert(&mut self, key: K) -> Handle
    where
        C: Comparator<K>,
    {
        self.core.insert(key, ()).0
    }

    /// Removes the whole equal run, returning how many elements went.
    pub fn remove_all<Q>(&mut self, q: &Q) -> usize
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.core.remove_all(q)
    }
}

impl<K: fmt::Debug, C> fmt::Debug for OrderedMultiSet<K, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K, C> Extend<K> for OrderedMultiSet<K, C>
where
    C: Comparator<K>,
{
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for k in iter {
            self.insert(k);
        }
    }
}

impl<K, C> FromIterator<K> for OrderedMultiSet<K, C>
where
    C: Comparator<K> + Default,
{
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut set = Self::with_comparator(C::default());
        set.extend(iter);
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Invariant: iteration follows comparator order regardless of
    /// insertion order, and keys resolve to their own values.
    #[test]
    fn round_trip_sorted_iteration() {
        let mut m: OrderedMap<i32, String> = OrderedMap::new();
        for (k, v) in [(3, "c"), (1, "a"), (2, "b")] {
            let (_, inserted) = m.insert(k, v.to_string());
            assert!(inserted);
        }
        m.assert_invariants();
        let got: Vec<(i32, String)> = m.iter().map(|(k, v)| (*k, v.clone())).collect();
        assert_eq!(
            got,
            vec![
                (1, "a".to_string()),
                (2, "b".to_string()),
                (3, "c".to_string())
            ]
        );
        assert_eq!(m.first(), Some((&1, &"a".to_string())));
        assert_eq!(m.last(), Some((&3, &"c".to_string())));
    }

    /// Invariant: a duplicate insert is rejected, reports the existing
    /// element's handle, and leaves the container unchanged.
    #[test]
    fn unique_insert_rejected() {
        let mut m: OrderedMap<String, i32> = OrderedMap::new();
        let (h1, inserted) = m.insert("x".to_string(), 1);
        assert!(inserted);
        let (h2, inserted) = m.insert("x".to_string(), 2);
        assert!(!inserted);
        assert_eq!(h1, h2);
        assert_eq!(m.len(), 1);
        assert_eq!(m.get("x"), Some(&1));
    }

    #[test]
    fn insert_or_assign_overwrites() {
        let mut m: OrderedMap<String, i32> = OrderedMap::new();
        let (h1, old) = m.insert_or_assign("k".to_string(), 1);
        assert_eq!(old, None);
        let (h2, old) = m.insert_or_assign("k".to_string(), 2);
        assert_eq!(old, Some(1));
        assert_eq!(h1, h2, "assignment reuses the node");
        assert_eq!(m.get("k"), Some(&2));
        assert_eq!(m.len(), 1);
    }

    /// Invariant: multi variants keep equal keys contiguous, new
    /// duplicates appended at the end of their run.
    #[test]
    fn multi_duplicates_contiguous_and_stable() {
        let mut m: OrderedMultiMap<&str, i32> = OrderedMultiMap::new();
        m.insert("a", 1);
        m.insert("b", 10);
        m.insert("a", 2);
        m.insert("a", 3);
        m.assert_invariants();
        assert_eq!(m.count(&"a"), 3);
        let got: Vec<(&str, i32)> = m.iter().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(got, vec![("a", 1), ("a", 2), ("a", 3), ("b", 10)]);
    }

    #[test]
    fn multiset_count_and_adjacency() {
        let mut s: OrderedMultiSet<&str> = OrderedMultiSet::new();
        s.insert("a");
        s.insert("a");
        s.insert("b");
        assert_eq!(s.count(&"a"), 2);
        let got: Vec<&str> = s.iter().copied().collect();
        assert_eq!(got, vec!["a", "a", "b"]);
    }

    /// Invariant: removing an absent key is a no-op and never errors.
    #[test]
    fn remove_absent_is_noop() {
        let mut m: OrderedMap<i32, i32> = OrderedMap::new();
        m.insert(1, 1);
        assert_eq!(m.remove(&99), None);
        assert_eq!(m.len(), 1);

        let mut mm: OrderedMultiSet<i32> = OrderedMultiSet::new();
        mm.insert(1);
        assert_eq!(mm.remove_all(&99), 0);
        assert_eq!(mm.len(), 1);
    }

    #[test]
    fn bounds_and_equal_range() {
        let mut m: OrderedMultiSet<i32> = OrderedMultiSet::new();
        for k in [10, 20, 20, 30] {
            m.insert(k);
        }
        let lb = m.lower_bound(&20);
        assert_eq!(m.get_at(lb), Some(&20));
        let ub = m.upper_bound(&20);
        assert_eq!(m.get_at(ub), Some(&30));

        let (mut cur, end) = m.equal_range(&20);
        let mut run = 0;
        while cur != end {
            assert_eq!(m.get_at(cur), Some(&20));
            run += 1;
            cur = m.next(cur).unwrap();
        }
        assert_eq!(run, 2);

        // Past the maximum both bounds are end().
        assert_eq!(m.lower_bound(&31), m.end());
        assert_eq!(m.upper_bound(&30), m.end());
    }

    /// A well-placed hint inserts; a misplaced or foreign hint is
    /// InvalidArgument and the container is untouched.
    #[test]
    fn insert_hint_sanity_check() {
        let mut m: OrderedMap<i32, &str> = OrderedMap::new();
        m.insert(10, "a");
        m.insert(30, "c");

        // end() is a valid hint for the largest key.
        let end = m.end();
        let (_, inserted) = m.insert_hint(end, 40, "d").unwrap();
        assert!(inserted);

        // Hint before 30 is correct for 20.
        let h30 = m.find(&30).unwrap();
        let (_, inserted) = m.insert_hint(h30, 20, "b").unwrap();
        assert!(inserted);
        m.assert_invariants();

        // Hint at begin() for a large key fails the is-sorted check.
        let err = m.insert_hint(m.begin(), 99, "x").unwrap_err();
        assert_eq!(err, Error::InvalidArgument);
        assert_eq!(m.len(), 4);

        // A handle minted by another container fails the position check.
        let mut other: OrderedMap<i32, &str> = OrderedMap::new();
        other.insert(1, "z");
        let foreign = other.find(&1).unwrap();
        assert_eq!(
            m.insert_hint(foreign, 50, "e").unwrap_err(),
            Error::InvalidArgument
        );

        let keys: Vec<i32> = m.keys().copied().collect();
        assert_eq!(keys, vec![10, 20, 30, 40]);
    }

    /// Invariant: erasing the sole element makes begin() equal end().
    #[test]
    fn erase_sole_element() {
        let mut m: OrderedMap<i32, i32> = OrderedMap::new();
        let (h, _) = m.insert(7, 7);
        assert_ne!(m.begin(), m.end());
        m.remove_at(h).unwrap();
        assert_eq!(m.len(), 0);
        assert_eq!(m.begin(), m.end());

        // The handle is now stale: it neither resolves nor removes.
        assert_eq!(m.get_at(h), None);
        assert_eq!(m.remove_at(h).unwrap_err(), Error::InvalidArgument);
    }

    #[test]
    fn remove_range_walks_before_erasing() {
        let mut m: OrderedMap<i32, i32> = OrderedMap::new();
        for k in 0..6 {
            m.insert(k, k * 10);
        }
        let first = m.find(&1).unwrap();
        let last = m.find(&4).unwrap();
        assert_eq!(m.remove_range(first, last).unwrap(), 3);
        let keys: Vec<i32> = m.keys().copied().collect();
        assert_eq!(keys, vec![0, 4, 5]);
        m.assert_invariants();

        // Unreachable range: last sits before first, so the walk hits
        // the sentinel and nothing is erased.
        let f = m.find(&4).unwrap();
        let l = m.find(&0).unwrap();
        assert_eq!(m.remove_range(f, l).unwrap_err(), Error::InvalidArgument);
        assert_eq!(m.len(), 3);
    }

    #[test]
    fn swap_exchanges_contents() {
        let mut a: OrderedMap<i32, &str> = OrderedMap::new();
        let mut b: OrderedMap<i32, &str> = OrderedMap::new();
        a.insert(1, "a");
        b.insert(2, "b");
        b.insert(3, "c");
        a.swap(&mut b);
        assert_eq!(a.len(), 2);
        assert_eq!(b.len(), 1);
        assert_eq!(a.get(&2), Some(&"b"));
        assert_eq!(b.get(&1), Some(&"a"));
    }

    #[test]
    fn clear_then_reuse() {
        let mut m: OrderedMap<i32, i32> = OrderedMap::new();
        let end = m.end();
        for k in 0..10 {
            m.insert(k, k);
        }
        m.clear();
        assert!(m.is_empty());
        assert_eq!(m.end(), end, "end() survives clear");
        m.insert(5, 50);
        assert_eq!(m.get(&5), Some(&50));
        m.assert_invariants();
    }

    /// A reversing comparator flips iteration order.
    #[test]
    fn custom_comparator() {
        #[derive(Clone, Default)]
        struct Reverse;
        impl Comparator<i32> for Reverse {
            fn cmp(&self, a: &i32, b: &i32) -> Ordering {
                b.cmp(a)
            }
        }

        let mut m: OrderedMap<i32, (), Reverse> = OrderedMap::with_comparator(Reverse);
        for k in [1, 3, 2] {
            m.insert(k, ());
        }
        m.assert_invariants();
        let keys: Vec<i32> = m.keys().copied().collect();
        assert_eq!(keys, vec![3, 2, 1]);
    }

    /// Borrowed lookups: store `String`, query with `&str`.
    #[test]
    fn borrowed_lookup_with_str() {
        let mut m: OrderedMap<String, i32> = OrderedMap::new();
        m.insert("hello".to_string(), 1);
        assert!(m.contains_key("hello"));
        assert_eq!(m.get("hello"), Some(&1));
        assert_eq!(m.at("world").unwrap_err(), Error::OutOfRange);
        assert_eq!(m.remove("hello"), Some(1));
    }

    /// Handle stepping: next(end()) and prev(begin()) are OutOfRange,
    /// stale handles are InvalidArgument.
    #[test]
    fn handle_stepping_errors() {
        let mut m: OrderedMap<i32, i32> = OrderedMap::new();
        m.insert(1, 1);
        m.insert(2, 2);

        assert_eq!(m.next(m.end()).unwrap_err(), Error::OutOfRange);
        assert_eq!(m.prev(m.begin()).unwrap_err(), Error::OutOfRange);
        assert_eq!(m.prev(m.end()).unwrap(), m.find(&2).unwrap());

        let (h, _) = m.insert(3, 3);
        m.remove_at(h).unwrap();
        assert_eq!(m.next(h).unwrap_err(), Error::InvalidArgument);
    }

    /// Ordered set round trip with FromIterator and Extend.
    #[test]
    fn set_construction_adapters() {
        let s: OrderedSet<i32> = [3, 1, 2, 2].into_iter().collect();
        assert_eq!(s.len(), 3, "unique set deduplicates");
        let keys: Vec<i32> = s.iter().copied().collect();
        assert_eq!(keys, vec![1, 2, 3]);

        let mut m: OrderedMultiSet<i32> = OrderedMultiSet::new();
        m.extend([2, 1, 2]);
        assert_eq!(m.len(), 3);
        assert_eq!(m.count(&2), 2);
    }

    #[test]
    fn iter_mut_updates_values_in_order() {
        let mut m: OrderedMap<i32, i32> = OrderedMap::new();
        for k in [2, 1, 3] {
            m.insert(k, k * 10);
        }
        let mut seen = Vec::new();
        for (k, v) in m.iter_mut() {
            seen.push(*k);
            *v += 1;
        }
        assert_eq!(seen, vec![1, 2, 3]);
        assert_eq!(m.get(&2), Some(&21));
    }

    /// Clone yields an independent container with fresh handles.
    #[test]
    fn clone_is_deep() {
        let mut a: OrderedMap<i32, i32> = OrderedMap::new();
        a.insert(1, 1);
        let mut b = a.clone();
        b.insert(2, 2);
        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 2);
        b.assert_invariants();
    }
}
