//! Storage list: the canonical element sequence behind every container.
//!
//! Nodes live in a `SlotMap` arena and are chained into a circular
//! doubly-linked list through one permanent sentinel slot. Generational
//! arena keys make every `Handle` stable for the lifetime of its node and
//! detectably stale afterwards: an unlinked node's handle never resolves
//! again and never aliases a later insertion.

use slotmap::{DefaultKey, Key, SlotMap};

use crate::error::Error;

/// Stable reference to one element of a container.
///
/// A `Handle` doubles as the iteration cursor: `next`/`prev` on the owning
/// container step it through list order, and equality is node identity
/// (arena slot plus generation). Handles from an element that has been
/// removed, or from a different container, never resolve.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Handle(pub(crate) DefaultKey);

impl Handle {
    pub(crate) fn new(k: DefaultKey) -> Self {
        Handle(k)
    }

    pub(crate) fn raw(&self) -> DefaultKey {
        self.0
    }
}

/// Key/value payload of one node. Set containers use `V = ()`.
#[derive(Clone, Debug)]
pub(crate) struct Pair<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
}

/// Unique/Multi insertion policy, injected into a core at construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Policy {
    Unique,
    Multi,
}

#[derive(Clone, Debug)]
struct Slot<T> {
    prev: DefaultKey,
    next: DefaultKey,
    // `None` only for the sentinel.
    entry: Option<T>,
}

/// Circular doubly-linked list over an arena, with one permanent sentinel.
///
/// All methods here trust their arguments; handle validation against user
/// input happens in the container layer via [`Storage::owns`].
#[derive(Clone, Debug)]
pub(crate) struct Storage<T> {
    slots: SlotMap<DefaultKey, Slot<T>>,
    sentinel: DefaultKey,
    len: usize,
}

impl<T> Storage<T> {
    pub(crate) fn new() -> Self {
        let mut slots = SlotMap::with_key();
        let sentinel = slots.insert(Slot {
            prev: DefaultKey::null(),
            next: DefaultKey::null(),
            entry: None,
        });
        slots[sentinel].prev = sentinel;
        slots[sentinel].next = sentinel;
        Storage {
            slots,
            sentinel,
            len: 0,
        }
    }

    /// The permanent past-the-end node.
    pub(crate) fn sentinel(&self) -> DefaultKey {
        self.sentinel
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// First real node, or the sentinel when empty.
    pub(crate) fn head(&self) -> DefaultKey {
        self.slots[self.sentinel].next
    }

    /// Last real node, or the sentinel when empty.
    pub(crate) fn tail(&self) -> DefaultKey {
        self.slots[self.sentinel].prev
    }

    /// Whether `k` currently resolves in this arena (sentinel included).
    pub(crate) fn owns(&self, k: DefaultKey) -> bool {
        self.slots.contains_key(k)
    }

    pub(crate) fn next(&self, k: DefaultKey) -> DefaultKey {
        self.slots[k].next
    }

    pub(crate) fn prev(&self, k: DefaultKey) -> DefaultKey {
        self.slots[k].prev
    }

    /// Payload access; `None` for the sentinel and for stale handles.
    pub(crate) fn entry(&self, k: DefaultKey) -> Option<&T> {
        self.slots.get(k).and_then(|s| s.entry.as_ref())
    }

    pub(crate) fn entry_mut(&mut self, k: DefaultKey) -> Option<&mut T> {
        self.slots.get_mut(k).and_then(|s| s.entry.as_mut())
    }

    /// Splices a fresh node between `pos.prev` and `pos`. `pos` may be the
    /// sentinel, which appends.
    pub(crate) fn insert_before(&mut self, pos: DefaultKey, entry: T) -> DefaultKey {
        let prev = self.slots[pos].prev;
        let k = self.slots.insert(Slot {
            prev,
            next: pos,
            entry: Some(entry),
        });
        self.slots[prev].next = k;
        self.slots[pos].prev = k;
        self.len += 1;
        k
    }

    pub(crate) fn push_back(&mut self, entry: T) -> DefaultKey {
        self.insert_before(self.sentinel, entry)
    }

    /// Removes `k` from the chain and frees its slot, returning the
    /// payload. The caller must have removed `k` from any index already,
    /// and must never pass the sentinel.
    pub(crate) fn unlink(&mut self, k: DefaultKey) -> T {
        debug_assert_ne!(k, self.sentinel, "the sentinel is never unlinked");
        let slot = self
            .slots
            .remove(k)
            .expect("unlink of a handle foreign to this list");
        self.slots[slot.prev].next = slot.next;
        self.slots[slot.next].prev = slot.prev;
        self.len -= 1;
        slot.entry.expect("non-sentinel slots always carry an entry")
    }

    /// Frees every node. The sentinel slot is retained, so `end` handles
    /// taken before the clear stay valid.
    pub(crate) fn clear(&mut self) {
        let sentinel = self.sentinel;
        self.slots.retain(|k, _| k == sentinel);
        let s = &mut self.slots[sentinel];
        s.prev = sentinel;
        s.next = sentinel;
        self.len = 0;
    }
}

/// Steps a user-supplied handle forward. Stale and foreign handles are
/// `InvalidArgument`; stepping past the end is `OutOfRange`.
pub(crate) fn step_next<T>(s: &Storage<T>, h: Handle) -> Result<Handle, Error> {
    if !s.owns(h.raw()) {
        return Err(Error::InvalidArgument);
    }
    if h.raw() == s.sentinel() {
        return Err(Error::OutOfRange);
    }
    Ok(Handle::new(s.next(h.raw())))
}

/// Steps a user-supplied handle backward; `prev(end)` is the last
/// element, `prev(begin)` is `OutOfRange`.
pub(crate) fn step_prev<T>(s: &Storage<T>, h: Handle) -> Result<Handle, Error> {
    if !s.owns(h.raw()) {
        return Err(Error::InvalidArgument);
    }
    let p = s.prev(h.raw());
    if p == s.sentinel() {
        return Err(Error::OutOfRange);
    }
    Ok(Handle::new(p))
}

/// Immutable list-order walk, yielding `(&K, &V)`.
pub struct Iter<'a, K, V> {
    storage: &'a Storage<Pair<K, V>>,
    cur: DefaultKey,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(storage: &'a Storage<Pair<K, V>>) -> Self {
        Iter {
            storage,
            cur: storage.head(),
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cur == self.storage.sentinel {
            return None;
        }
        let e = self.storage.entry(self.cur)?;
        self.cur = self.storage.next(self.cur);
        Some((&e.key, &e.value))
    }
}

/// Mutable list-order walk, yielding `(&K, &mut V)`. Keys stay immutable;
/// mutating a key would silently break the index.
pub struct IterMut<'a, K, V> {
    storage: &'a mut Storage<Pair<K, V>>,
    cur: DefaultKey,
}

impl<'a, K, V> IterMut<'a, K, V> {
    pub(crate) fn new(storage: &'a mut Storage<Pair<K, V>>) -> Self {
        let cur = storage.head();
        IterMut { storage, cur }
    }
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cur == self.storage.sentinel {
            return None;
        }
        let cur = self.cur;
        self.cur = self.storage.next(cur);
        let entry = self.storage.entry_mut(cur)?;
        // SAFETY: the iterator exclusively borrows the storage for 'a and
        // visits each node exactly once, so at most one mutable reference
        // to any entry is ever handed out.
        let entry: &'a mut Pair<K, V> = unsafe { &mut *(entry as *mut Pair<K, V>) };
        Some((&entry.key, &mut entry.value))
    }
}

/// List-order walk over keys only; also the iterator of the set variants.
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Keys<'a, K, V> {
    pub(crate) fn new(storage: &'a Storage<Pair<K, V>>) -> Self {
        Keys {
            inner: Iter::new(storage),
        }
    }
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }
}

/// List-order walk over values only.
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Values<'a, K, V> {
    pub(crate) fn new(storage: &'a Storage<Pair<K, V>>) -> Self {
        Values {
            inner: Iter::new(storage),
        }
    }
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }
}
