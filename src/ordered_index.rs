//! Ordered index: a red-black tree over storage handles.
//!
//! Each tree node wraps exactly one storage-list node. The tree owns no
//! payloads: its per-node links live in a `SecondaryMap` keyed by the
//! storage arena's own keys, so an index entry can never outlive its node.
//! In-order traversal equals storage-list order equals comparator order;
//! the containers keep that true by always splicing the list at the exact
//! neighbour position the tree descent reports.

use core::borrow::Borrow;
use core::cmp::Ordering;

use slotmap::{DefaultKey, Key, SecondaryMap};

use crate::storage::{Pair, Storage};

/// Strict ordering predicate supplied at construction of the ordered
/// containers. Implemented over `Q` rather than the key type alone so
/// borrowed lookups work (`K: Borrow<Q>`); the default [`OrdComparator`]
/// covers every `Q: Ord`.
pub trait Comparator<Q: ?Sized> {
    fn cmp(&self, a: &Q, b: &Q) -> Ordering;
}

/// Default comparator delegating to `Ord`.
#[derive(Clone, Copy, Debug, Default)]
pub struct OrdComparator;

impl<Q: Ord + ?Sized> Comparator<Q> for OrdComparator {
    fn cmp(&self, a: &Q, b: &Q) -> Ordering {
        a.cmp(b)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Color {
    Red,
    Black,
}

#[derive(Clone, Copy, Debug)]
struct RbLinks {
    parent: DefaultKey,
    left: DefaultKey,
    right: DefaultKey,
    color: Color,
}

/// Which child slot of a parent a descent ended at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Side {
    Left,
    Right,
}

/// Outcome of a tree descent for insertion.
///
/// `Leaf` doubles as the list splice instruction: attaching as a left
/// child makes the new node the parent's list predecessor, as a right
/// child its successor.
pub(crate) enum Place {
    /// An equal key already exists at this node.
    Equal(DefaultKey),
    /// Attachment point; `parent` is null when the tree is empty.
    Leaf { parent: DefaultKey, side: Side },
}

#[derive(Clone, Debug)]
pub(crate) struct RbTree {
    root: DefaultKey,
    links: SecondaryMap<DefaultKey, RbLinks>,
}

fn key_of<K, V>(s: &Storage<Pair<K, V>>, h: DefaultKey) -> &K {
    &s.entry(h)
        .expect("tree handles always resolve in the storage arena")
        .key
}

impl RbTree {
    pub(crate) fn new() -> Self {
        RbTree {
            root: DefaultKey::null(),
            links: SecondaryMap::new(),
        }
    }

    pub(crate) fn clear(&mut self) {
        self.root = DefaultKey::null();
        self.links.clear();
    }

    // Null-tolerant link accessors; null behaves as a black nil leaf.

    fn color(&self, k: DefaultKey) -> Color {
        if k.is_null() {
            Color::Black
        } else {
            self.links[k].color
        }
    }

    fn set_color(&mut self, k: DefaultKey, c: Color) {
        if !k.is_null() {
            self.links[k].color = c;
        }
    }

    fn parent(&self, k: DefaultKey) -> DefaultKey {
        if k.is_null() {
            DefaultKey::null()
        } else {
            self.links[k].parent
        }
    }

    fn left(&self, k: DefaultKey) -> DefaultKey {
        if k.is_null() {
            DefaultKey::null()
        } else {
            self.links[k].left
        }
    }

    fn right(&self, k: DefaultKey) -> DefaultKey {
        if k.is_null() {
            DefaultKey::null()
        } else {
            self.links[k].right
        }
    }

    /// Exact-match lookup, O(log n). For Multi containers this may land on
    /// any node of an equal run; callers rewind along the list.
    pub(crate) fn find<K, V, C, Q>(
        &self,
        s: &Storage<Pair<K, V>>,
        cmp: &C,
        q: &Q,
    ) -> Option<DefaultKey>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        let mut cur = self.root;
        while !cur.is_null() {
            match cmp.cmp(q, key_of(s, cur).borrow()) {
                Ordering::Less => cur = self.left(cur),
                Ordering::Greater => cur = self.right(cur),
                Ordering::Equal => return Some(cur),
            }
        }
        None
    }

    /// Descent for a Unique insertion: stops at the first equal key, or
    /// reports the leaf attachment point.
    pub(crate) fn locate<K, V, C>(&self, s: &Storage<Pair<K, V>>, cmp: &C, key: &K) -> Place
    where
        C: Comparator<K>,
    {
        let mut parent = DefaultKey::null();
        let mut side = Side::Left;
        let mut cur = self.root;
        while !cur.is_null() {
            parent = cur;
            match cmp.cmp(key, key_of(s, cur)) {
                Ordering::Less => {
                    side = Side::Left;
                    cur = self.left(cur);
                }
                Ordering::Greater => {
                    side = Side::Right;
                    cur = self.right(cur);
                }
                Ordering::Equal => return Place::Equal(cur),
            }
        }
        Place::Leaf { parent, side }
    }

    /// Descent for a Multi insertion: ties go right, so the attachment
    /// point is always after every existing equal key. New duplicates are
    /// thereby appended at the end of their equal run.
    pub(crate) fn locate_leaf<K, V, C>(&self, s: &Storage<Pair<K, V>>, cmp: &C, key: &K) -> Place
    where
        C: Comparator<K>,
    {
        let mut parent = DefaultKey::null();
        let mut side = Side::Left;
        let mut cur = self.root;
        while !cur.is_null() {
            parent = cur;
            if cmp.cmp(key, key_of(s, cur)) == Ordering::Less {
                side = Side::Left;
                cur = self.left(cur);
            } else {
                side = Side::Right;
                cur = self.right(cur);
            }
        }
        Place::Leaf { parent, side }
    }

    /// First node not less than `q`, or null.
    pub(crate) fn lower_bound<K, V, C, Q>(
        &self,
        s: &Storage<Pair<K, V>>,
        cmp: &C,
        q: &Q,
    ) -> DefaultKey
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        let mut best = DefaultKey::null();
        let mut cur = self.root;
        while !cur.is_null() {
            if cmp.cmp(key_of(s, cur).borrow(), q) == Ordering::Less {
                cur = self.right(cur);
            } else {
                best = cur;
                cur = self.left(cur);
            }
        }
        best
    }

    /// First node strictly greater than `q`, or null.
    pub(crate) fn upper_bound<K, V, C, Q>(
        &self,
        s: &Storage<Pair<K, V>>,
        cmp: &C,
        q: &Q,
    ) -> DefaultKey
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        let mut best = DefaultKey::null();
        let mut cur = self.root;
        while !cur.is_null() {
            if cmp.cmp(q, key_of(s, cur).borrow()) == Ordering::Less {
                best = cur;
                cur = self.left(cur);
            } else {
                cur = self.right(cur);
            }
        }
        best
    }

    /// Registers an already-spliced node at the attachment point reported
    /// by `locate`/`locate_leaf`, then restores the red-black shape.
    pub(crate) fn link(&mut self, h: DefaultKey, parent: DefaultKey, side: Side) {
        self.links.insert(
            h,
            RbLinks {
                parent,
                left: DefaultKey::null(),
                right: DefaultKey::null(),
                color: Color::Red,
            },
        );
        if parent.is_null() {
            self.root = h;
        } else {
            match side {
                Side::Left => self.links[parent].left = h,
                Side::Right => self.links[parent].right = h,
            }
        }
        self.insert_fixup(h);
    }

    fn insert_fixup(&mut self, mut z: DefaultKey) {
        while self.color(self.parent(z)) == Color::Red {
            let p = self.parent(z);
            // A red parent is never the root, so the grandparent exists.
            let g = self.parent(p);
            if p == self.left(g) {
                let u = self.right(g);
                if self.color(u) == Color::Red {
                    self.set_color(p, Color::Black);
                    self.set_color(u, Color::Black);
                    self.set_color(g, Color::Red);
                    z = g;
                } else {
                    if z == self.right(p) {
                        z = p;
                        self.rotate_left(z);
                    }
                    let p = self.parent(z);
                    let g = self.parent(p);
                    self.set_color(p, Color::Black);
                    self.set_color(g, Color::Red);
                    self.rotate_right(g);
                }
            } else {
                let u = self.left(g);
                if self.color(u) == Color::Red {
                    self.set_color(p, Color::Black);
                    self.set_color(u, Color::Black);
                    self.set_color(g, Color::Red);
                    z = g;
                } else {
                    if z == self.left(p) {
                        z = p;
                        self.rotate_right(z);
                    }
                    let p = self.parent(z);
                    let g = self.parent(p);
                    self.set_color(p, Color::Black);
                    self.set_color(g, Color::Red);
                    self.rotate_left(g);
                }
            }
        }
        let root = self.root;
        self.set_color(root, Color::Black);
    }

    fn rotate_left(&mut self, x: DefaultKey) {
        let y = self.links[x].right;
        let y_left = self.links[y].left;
        self.links[x].right = y_left;
        if !y_left.is_null() {
            self.links[y_left].parent = x;
        }
        let xp = self.links[x].parent;
        self.links[y].parent = xp;
        if xp.is_null() {
            self.root = y;
        } else if self.links[xp].left == x {
            self.links[xp].left = y;
        } else {
            self.links[xp].right = y;
        }
        self.links[y].left = x;
        self.links[x].parent = y;
    }

    fn rotate_right(&mut self, x: DefaultKey) {
        let y = self.links[x].left;
        let y_right = self.links[y].right;
        self.links[x].left = y_right;
        if !y_right.is_null() {
            self.links[y_right].parent = x;
        }
        let xp = self.links[x].parent;
        self.links[y].parent = xp;
        if xp.is_null() {
            self.root = y;
        } else if self.links[xp].right == x {
            self.links[xp].right = y;
        } else {
            self.links[xp].left = y;
        }
        self.links[y].right = x;
        self.links[x].parent = y;
    }

    fn minimum(&self, mut k: DefaultKey) -> DefaultKey {
        while !self.left(k).is_null() {
            k = self.left(k);
        }
        k
    }

    /// Replaces the subtree rooted at `u` with the one rooted at `v`.
    fn transplant(&mut self, u: DefaultKey, v: DefaultKey) {
        let up = self.links[u].parent;
        if up.is_null() {
            self.root = v;
        } else if self.links[up].left == u {
            self.links[up].left = v;
        } else {
            self.links[up].right = v;
        }
        if !v.is_null() {
            self.links[v].parent = up;
        }
    }

    /// Removes the tree entry for `z` and restores the red-black shape,
    /// O(log n). `z`'s payload and list links are untouched.
    pub(crate) fn erase(&mut self, z: DefaultKey) {
        let mut y_color = self.links[z].color;
        let x;
        let x_parent;
        if self.links[z].left.is_null() {
            x = self.links[z].right;
            x_parent = self.links[z].parent;
            self.transplant(z, x);
        } else if self.links[z].right.is_null() {
            x = self.links[z].left;
            x_parent = self.links[z].parent;
            self.transplant(z, x);
        } else {
            // Two children: the in-order successor y takes z's place.
            let y = self.minimum(self.links[z].right);
            y_color = self.links[y].color;
            x = self.links[y].right;
            if self.links[y].parent == z {
                x_parent = y;
            } else {
                x_parent = self.links[y].parent;
                self.transplant(y, x);
                let zr = self.links[z].right;
                self.links[y].right = zr;
                self.links[zr].parent = y;
            }
            self.transplant(z, y);
            let zl = self.links[z].left;
            self.links[y].left = zl;
            self.links[zl].parent = y;
            self.links[y].color = self.links[z].color;
        }
        self.links.remove(z);
        if y_color == Color::Black {
            self.erase_fixup(x, x_parent);
        }
    }

    // Delete fixup with the deficit node possibly nil; its parent is
    // tracked explicitly instead of storing parent links in a nil node.
    fn erase_fixup(&mut self, mut x: DefaultKey, mut parent: DefaultKey) {
        while x != self.root && self.color(x) == Color::Black {
            if x == self.left(parent) {
                let mut w = self.right(parent);
                if self.color(w) == Color::Red {
                    self.set_color(w, Color::Black);
                    self.set_color(parent, Color::Red);
                    self.rotate_left(parent);
                    w = self.right(parent);
                }
                if self.color(self.left(w)) == Color::Black
                    && self.color(self.right(w)) == Color::Black
                {
                    self.set_color(w, Color::Red);
                    x = parent;
                    parent = self.parent(x);
                } else {
                    if self.color(self.right(w)) == Color::Black {
                        let wl = self.left(w);
                        self.set_color(wl, Color::Black);
                        self.set_color(w, Color::Red);
                        self.rotate_right(w);
                        w = self.right(parent);
                    }
                    self.set_color(w, self.color(parent));
                    self.set_color(parent, Color::Black);
                    let wr = self.right(w);
                    self.set_color(wr, Color::Black);
                    self.rotate_left(parent);
                    x = self.root;
                }
            } else {
                let mut w = self.left(parent);
                if self.color(w) == Color::Red {
                    self.set_color(w, Color::Black);
                    self.set_color(parent, Color::Red);
                    self.rotate_right(parent);
                    w = self.left(parent);
                }
                if self.color(self.right(w)) == Color::Black
                    && self.color(self.left(w)) == Color::Black
                {
                    self.set_color(w, Color::Red);
                    x = parent;
                    parent = self.parent(x);
                } else {
                    if self.color(self.left(w)) == Color::Black {
                        let wr = self.right(w);
                        self.set_color(wr, Color::Black);
                        self.set_color(w, Color::Red);
                        self.rotate_left(w);
                        w = self.left(parent);
                    }
                    self.set_color(w, self.color(parent));
                    self.set_color(parent, Color::Black);
                    let wl = self.left(w);
                    self.set_color(wl, Color::Black);
                    self.rotate_right(parent);
                    x = self.root;
                }
            }
        }
        self.set_color(x, Color::Black);
    }

    /// Exhaustive structural check: red-black shape, parent consistency,
    /// and in-order traversal equal to storage-list order.
    #[cfg(test)]
    pub(crate) fn validate<K, V>(&self, s: &Storage<Pair<K, V>>) {
        assert_eq!(self.color(self.root), Color::Black, "root must be black");
        if !self.root.is_null() {
            assert!(self.links[self.root].parent.is_null());
        }

        let mut in_order = Vec::new();
        self.validate_subtree(self.root, &mut in_order);
        assert_eq!(in_order.len(), s.len(), "tree and list node counts differ");

        let mut cur = s.head();
        for &h in &in_order {
            assert_eq!(cur, h, "in-order traversal must equal list order");
            cur = s.next(cur);
        }
        assert_eq!(cur, s.sentinel());
    }

    #[cfg(test)]
    fn validate_subtree(&self, k: DefaultKey, out: &mut Vec<DefaultKey>) -> usize {
        if k.is_null() {
            return 1;
        }
        let l = self.left(k);
        let r = self.right(k);
        if self.color(k) == Color::Red {
            assert_eq!(self.color(l), Color::Black, "red node with red left child");
            assert_eq!(self.color(r), Color::Black, "red node with red right child");
        }
        if !l.is_null() {
            assert_eq!(self.links[l].parent, k, "broken parent link");
        }
        if !r.is_null() {
            assert_eq!(self.links[r].parent, k, "broken parent link");
        }
        let lh = self.validate_subtree(l, out);
        out.push(k);
        let rh = self.validate_subtree(r, out);
        assert_eq!(lh, rh, "unequal black heights");
        lh + usize::from(self.color(k) == Color::Black)
    }
}
