//! linkmap: ordered and hashed maps and sets backed by a linked node
//! arena with stable handles.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: realize eight associative containers through one shared
//!   storage-and-indexing engine, built in safe, verifiable layers so
//!   each piece can be reasoned about independently.
//! - Layers:
//!   - Storage list: a doubly-linked sequence of nodes in a `SlotMap`
//!     arena with one permanent sentinel. Nodes double as stable
//!     `Handle`s, so iteration cursors survive unrelated mutations and
//!     stale handles are detectable instead of dangling.
//!   - Ordered index: a red-black tree over storage handles keeping the
//!     list key-sorted; O(log n) lookup, insert and erase. Tree links
//!     live in a `SecondaryMap` and never own node lifetime.
//!   - Hash index: an explicit bucket table with cached per-node hashes;
//!     the list stays in pure insertion order. Amortized O(1) insert and
//!     lookup, observable buckets, configurable load factor.
//!   - Container façades: `Ordered{Map,Set,MultiMap,MultiSet}` and
//!     `Hashed{Map,Set,MultiMap,MultiSet}` bind one list and one index
//!     with a Unique/Multi policy value; sets store `V = ()`.
//!
//! Constraints
//! - Single-threaded value types: no atomics, no internal locking;
//!   a raw-pointer marker keeps the containers `!Send`/`!Sync`.
//! - Every mutation completes its paired list splice/unlink and index
//!   insert/erase before returning; no "in progress" state is ever
//!   observable, and any `Err` leaves the container untouched.
//! - Reentrancy from user code (comparators, hashers, key equality) is
//!   disallowed while an operation is in flight; a debug-only guard
//!   panics on violation and costs nothing in release builds.
//!
//! Ordering contract
//! - Ordered containers: iteration follows the comparator; duplicate
//!   keys (multi variants) stay contiguous, new duplicates appended at
//!   the end of their equal run.
//! - Hashed containers: iteration follows insertion order; per-bucket
//!   iteration shows one key's duplicates contiguously.
//!
//! Hashing invariants
//! - Each node's hash is computed once at insertion and cached, so
//!   `K: Hash` is never invoked during a rehash and bucket membership is
//!   always `hash % bucket_count`. Growth tunables come from an explicit
//!   [`HashConfig`], letting tests run degenerate single-bucket tables.
//!
//! Non-goals
//! - No persistence or wire format, no concurrency control beyond the
//!   single-owner model, no weak handles. Sequence containers and the
//!   generic algorithms that consume the iterator protocol live outside
//!   this crate.

mod error;
mod guard;
mod hash_index;
mod hashed;
mod hashed_proptest;
mod ordered;
mod ordered_index;
mod ordered_proptest;
mod storage;

// Public surface
pub use error::Error;
pub use hash_index::HashConfig;
pub use hashed::{BucketIter, HashedMap, HashedMultiMap, HashedMultiSet, HashedSet};
pub use ordered::{OrderedMap, OrderedMultiMap, OrderedMultiSet, OrderedSet};
pub use ordered_index::{Comparator, OrdComparator};
pub use storage::{Handle, Iter, IterMut, Keys, Values};
