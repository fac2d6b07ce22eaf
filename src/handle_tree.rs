//! HandleTree: comparator-driven red-black tree with stable handles.
//!
//! Nodes live in a `SlotMap`, so a `Handle` stays valid across unrelated
//! inserts and removals and never aliases a later node that reuses the
//! slot. Handles also carry the id of the tree that minted them; a handle
//! offered to a different tree simply does not resolve.
//!
//! The tree never owns a comparator. Every ordered operation takes a
//! closure, which is the only user code the engine ever runs.

use crate::error::fatal;
use crate::reentrancy::DebugReentrancy;
use core::cmp::Ordering;
use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use slotmap::{DefaultKey, SlotMap};

static NEXT_TREE_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct TreeId(u64);

impl TreeId {
    fn fresh() -> Self {
        TreeId(NEXT_TREE_ID.fetch_add(1, AtomicOrdering::Relaxed))
    }
}

/// Stable reference to one node of one `HandleTree`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Handle {
    tree: TreeId,
    key: DefaultKey,
}

impl Handle {
    pub(crate) fn raw_key(&self) -> DefaultKey {
        self.key
    }

    #[cfg(any(test, feature = "bench_internal"))]
    pub fn value<'a, T>(&self, tree: &'a HandleTree<T>) -> Option<&'a T> {
        tree.get(*self)
    }
}

/// Rejected insert: an equal element is already stored.
#[derive(Debug)]
pub struct Duplicate<T> {
    /// The value that was offered, handed back untouched.
    pub rejected: T,
    pub existing: Handle,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Color {
    Red,
    Black,
}

type Link = Option<DefaultKey>;

#[derive(Debug)]
struct Node<T> {
    value: T,
    color: Color,
    parent: Link,
    left: Link,
    right: Link,
}

#[derive(Copy, Clone, Debug)]
enum Bound {
    Ceiling,
    Floor,
    Higher,
    Lower,
}

/// Structural half of the tree: links, colors and rebalancing. Kept apart
/// from `HandleTree` so fix-up code can borrow it mutably while the
/// reentrancy guard is held.
struct Nodes<T> {
    root: Link,
    slots: SlotMap<DefaultKey, Node<T>>,
}

pub struct HandleTree<T> {
    id: TreeId,
    nodes: Nodes<T>,
    reentrancy: DebugReentrancy,
}

impl<T> Default for HandleTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> HandleTree<T> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            id: TreeId::fresh(),
            nodes: Nodes {
                root: None,
                slots: SlotMap::with_capacity_and_key(capacity),
            },
            reentrancy: DebugReentrancy::new(),
        }
    }

    pub fn id(&self) -> TreeId {
        self.id
    }

    pub fn len(&self) -> usize {
        self.nodes.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.slots.is_empty()
    }

    fn handle(&self, key: DefaultKey) -> Handle {
        Handle { tree: self.id, key }
    }

    fn resolve(&self, h: Handle) -> Option<DefaultKey> {
        (h.tree == self.id && self.nodes.slots.contains_key(h.key)).then_some(h.key)
    }

    /// True while `h` was minted by this tree and its node is still live.
    pub fn contains(&self, h: Handle) -> bool {
        self.resolve(h).is_some()
    }

    pub fn get(&self, h: Handle) -> Option<&T> {
        let k = self.resolve(h)?;
        self.nodes.slots.get(k).map(|n| &n.value)
    }

    /// Mutable access to a stored element. Callers must not change the
    /// parts of `T` the comparator looks at.
    pub fn get_mut(&mut self, h: Handle) -> Option<&mut T> {
        let k = self.resolve(h)?;
        self.nodes.slots.get_mut(k).map(|n| &mut n.value)
    }

    /// Exact lookup. `probe(stored)` compares the query against `stored`.
    pub fn find_by<F>(&self, mut probe: F) -> Option<Handle>
    where
        F: FnMut(&T) -> Ordering,
    {
        let _g = self.reentrancy.enter();
        let mut cur = self.nodes.root;
        while let Some(k) = cur {
            let n = &self.nodes.slots[k];
            match probe(&n.value) {
                Ordering::Less => cur = n.left,
                Ordering::Greater => cur = n.right,
                Ordering::Equal => return Some(self.handle(k)),
            }
        }
        None
    }

    /// Smallest element not less than the query.
    pub fn ceiling_by<F>(&self, probe: F) -> Option<Handle>
    where
        F: FnMut(&T) -> Ordering,
    {
        self.search(probe, Bound::Ceiling)
    }

    /// Largest element not greater than the query.
    pub fn floor_by<F>(&self, probe: F) -> Option<Handle>
    where
        F: FnMut(&T) -> Ordering,
    {
        self.search(probe, Bound::Floor)
    }

    /// Smallest element strictly greater than the query.
    pub fn higher_by<F>(&self, probe: F) -> Option<Handle>
    where
        F: FnMut(&T) -> Ordering,
    {
        self.search(probe, Bound::Higher)
    }

    /// Largest element strictly less than the query.
    pub fn lower_by<F>(&self, probe: F) -> Option<Handle>
    where
        F: FnMut(&T) -> Ordering,
    {
        self.search(probe, Bound::Lower)
    }

    fn search<F>(&self, mut probe: F, bound: Bound) -> Option<Handle>
    where
        F: FnMut(&T) -> Ordering,
    {
        let _g = self.reentrancy.enter();
        let mut best = None;
        let mut cur = self.nodes.root;
        while let Some(k) = cur {
            let n = &self.nodes.slots[k];
            let ord = probe(&n.value);
            // (stored qualifies, descend left)
            let (candidate, left) = match (bound, ord) {
                (Bound::Ceiling | Bound::Floor, Ordering::Equal) => {
                    return Some(self.handle(k));
                }
                (Bound::Ceiling | Bound::Higher, Ordering::Less) => (true, true),
                (Bound::Ceiling | Bound::Higher, _) => (false, false),
                (Bound::Floor | Bound::Lower, Ordering::Greater) => (true, false),
                (Bound::Floor | Bound::Lower, _) => (false, true),
            };
            if candidate {
                best = Some(k);
            }
            cur = if left { n.left } else { n.right };
        }
        best.map(|k| self.handle(k))
    }

    pub fn first(&self) -> Option<Handle> {
        let root = self.nodes.root?;
        Some(self.handle(self.nodes.min_from(root)))
    }

    pub fn last(&self) -> Option<Handle> {
        let root = self.nodes.root?;
        Some(self.handle(self.nodes.max_from(root)))
    }

    /// In-order successor. `None` both at the end and for a dead handle;
    /// callers that must tell the two apart check `contains` first.
    pub fn next(&self, h: Handle) -> Option<Handle> {
        let k = self.resolve(h)?;
        self.nodes.successor(k).map(|k| self.handle(k))
    }

    pub fn prev(&self, h: Handle) -> Option<Handle> {
        let k = self.resolve(h)?;
        self.nodes.predecessor(k).map(|k| self.handle(k))
    }

    /// Insert `value`, ordered by `cmp(new, stored)`. An equal element
    /// rejects the insert and the value is handed back.
    pub fn insert_by<F>(&mut self, value: T, mut cmp: F) -> Result<Handle, Duplicate<T>>
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let _g = self.reentrancy.enter();
        let mut parent = None;
        let mut go_left = false;
        let mut cur = self.nodes.root;
        while let Some(k) = cur {
            let n = &self.nodes.slots[k];
            match cmp(&value, &n.value) {
                Ordering::Less => {
                    parent = Some(k);
                    go_left = true;
                    cur = n.left;
                }
                Ordering::Greater => {
                    parent = Some(k);
                    go_left = false;
                    cur = n.right;
                }
                Ordering::Equal => {
                    return Err(Duplicate {
                        rejected: value,
                        existing: Handle { tree: self.id, key: k },
                    });
                }
            }
        }

        let k = self.nodes.slots.insert(Node {
            value,
            color: Color::Red,
            parent,
            left: None,
            right: None,
        });
        match parent {
            None => self.nodes.root = Some(k),
            Some(p) if go_left => self.nodes.slots[p].left = Some(k),
            Some(p) => self.nodes.slots[p].right = Some(k),
        }
        self.nodes.insert_fixup(k);
        Ok(Handle { tree: self.id, key: k })
    }

    /// Unlink and free the node behind `h`, returning its element. The tree
    /// is fully consistent again before the element is handed out, so the
    /// caller may drop it with arbitrary side effects.
    pub fn remove(&mut self, h: Handle) -> Option<T> {
        let _g = self.reentrancy.enter();
        let k = self.resolve(h)?;
        self.nodes.unlink(k);
        match self.nodes.slots.remove(k) {
            Some(node) => Some(node.value),
            None => fatal("resolved node disappeared during remove"),
        }
    }

    /// Remove every element, returning them in order. The tree is empty
    /// before the first element is handed out.
    pub fn drain(&mut self) -> Vec<T> {
        let _g = self.reentrancy.enter();
        let mut order = Vec::with_capacity(self.len());
        let mut cur = self.nodes.root.map(|r| self.nodes.min_from(r));
        while let Some(k) = cur {
            order.push(k);
            cur = self.nodes.successor(k);
        }
        self.nodes.root = None;
        let mut out = Vec::with_capacity(order.len());
        for k in order {
            match self.nodes.slots.remove(k) {
                Some(node) => out.push(node.value),
                None => fatal("in-order walk visited a node twice"),
            }
        }
        out
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            tree: self,
            front: self.nodes.root.map(|r| self.nodes.min_from(r)),
            back: self.nodes.root.map(|r| self.nodes.max_from(r)),
            remaining: self.len(),
        }
    }

    /// Panic unless the red-black and linkage invariants hold.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        fn walk<T>(n: &Nodes<T>, at: Link, parent: Link) -> usize {
            let Some(k) = at else { return 1 };
            let node = &n.slots[k];
            assert_eq!(node.parent, parent, "parent link mismatch");
            if node.color == Color::Red {
                assert!(
                    !n.is_red(node.left) && !n.is_red(node.right),
                    "red node with red child"
                );
            }
            let lh = walk(n, node.left, Some(k));
            let rh = walk(n, node.right, Some(k));
            assert_eq!(lh, rh, "black height mismatch");
            lh + usize::from(node.color == Color::Black)
        }

        assert!(!self.nodes.is_red(self.nodes.root), "root must be black");
        walk(&self.nodes, self.nodes.root, None);

        let mut reachable = 0;
        let mut cur = self.nodes.root.map(|r| self.nodes.min_from(r));
        while let Some(k) = cur {
            reachable += 1;
            cur = self.nodes.successor(k);
        }
        assert_eq!(reachable, self.len(), "orphaned nodes in arena");
    }
}

impl<T: fmt::Debug> fmt::Debug for HandleTree<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter().map(|(_, v)| v)).finish()
    }
}

impl<T> Nodes<T> {
    fn is_red(&self, at: Link) -> bool {
        self.red(at).is_some()
    }

    fn red(&self, at: Link) -> Link {
        at.filter(|&k| self.slots[k].color == Color::Red)
    }

    fn set_color(&mut self, k: DefaultKey, color: Color) {
        self.slots[k].color = color;
    }

    fn min_from(&self, mut k: DefaultKey) -> DefaultKey {
        while let Some(l) = self.slots[k].left {
            k = l;
        }
        k
    }

    fn max_from(&self, mut k: DefaultKey) -> DefaultKey {
        while let Some(r) = self.slots[k].right {
            k = r;
        }
        k
    }

    fn successor(&self, k: DefaultKey) -> Link {
        if let Some(r) = self.slots[k].right {
            return Some(self.min_from(r));
        }
        let mut child = k;
        let mut up = self.slots[k].parent;
        while let Some(p) = up {
            if self.slots[p].right != Some(child) {
                break;
            }
            child = p;
            up = self.slots[p].parent;
        }
        up
    }

    fn predecessor(&self, k: DefaultKey) -> Link {
        if let Some(l) = self.slots[k].left {
            return Some(self.max_from(l));
        }
        let mut child = k;
        let mut up = self.slots[k].parent;
        while let Some(p) = up {
            if self.slots[p].left != Some(child) {
                break;
            }
            child = p;
            up = self.slots[p].parent;
        }
        up
    }

    /// Point `parent`'s link that referenced `old` at `new`.
    fn replace_child(&mut self, parent: Link, old: DefaultKey, new: Link) {
        match parent {
            None => self.root = new,
            Some(p) if self.slots[p].left == Some(old) => self.slots[p].left = new,
            Some(p) => self.slots[p].right = new,
        }
    }

    fn transplant(&mut self, u: DefaultKey, v: Link) {
        let up = self.slots[u].parent;
        self.replace_child(up, u, v);
        if let Some(v) = v {
            self.slots[v].parent = up;
        }
    }

    fn rotate_left(&mut self, x: DefaultKey) {
        let Some(y) = self.slots[x].right else {
            fatal("rotate_left on a node without a right child")
        };
        let y_left = self.slots[y].left;
        self.slots[x].right = y_left;
        if let Some(b) = y_left {
            self.slots[b].parent = Some(x);
        }
        let xp = self.slots[x].parent;
        self.slots[y].parent = xp;
        self.replace_child(xp, x, Some(y));
        self.slots[y].left = Some(x);
        self.slots[x].parent = Some(y);
    }

    fn rotate_right(&mut self, x: DefaultKey) {
        let Some(y) = self.slots[x].left else {
            fatal("rotate_right on a node without a left child")
        };
        let y_right = self.slots[y].right;
        self.slots[x].left = y_right;
        if let Some(b) = y_right {
            self.slots[b].parent = Some(x);
        }
        let xp = self.slots[x].parent;
        self.slots[y].parent = xp;
        self.replace_child(xp, x, Some(y));
        self.slots[y].right = Some(x);
        self.slots[x].parent = Some(y);
    }

    fn insert_fixup(&mut self, mut z: DefaultKey) {
        while let Some(p) = self.red(self.slots[z].parent) {
            // A red node is never the root, so the grandparent exists.
            let Some(g) = self.slots[p].parent else { break };
            if self.slots[g].left == Some(p) {
                if let Some(u) = self.red(self.slots[g].right) {
                    self.set_color(p, Color::Black);
                    self.set_color(u, Color::Black);
                    self.set_color(g, Color::Red);
                    z = g;
                    continue;
                }
                let mut top = p;
                if self.slots[p].right == Some(z) {
                    self.rotate_left(p);
                    top = z;
                    z = p;
                }
                self.set_color(top, Color::Black);
                self.set_color(g, Color::Red);
                self.rotate_right(g);
            } else {
                if let Some(u) = self.red(self.slots[g].left) {
                    self.set_color(p, Color::Black);
                    self.set_color(u, Color::Black);
                    self.set_color(g, Color::Red);
                    z = g;
                    continue;
                }
                let mut top = p;
                if self.slots[p].left == Some(z) {
                    self.rotate_right(p);
                    top = z;
                    z = p;
                }
                self.set_color(top, Color::Black);
                self.set_color(g, Color::Red);
                self.rotate_left(g);
            }
        }
        if let Some(r) = self.root {
            self.set_color(r, Color::Black);
        }
    }

    /// Detach `z` from the tree and rebalance. The slot itself stays
    /// allocated; the caller frees it.
    fn unlink(&mut self, z: DefaultKey) {
        let removed_color;
        let x;
        let x_parent;
        match (self.slots[z].left, self.slots[z].right) {
            (None, right) => {
                x = right;
                x_parent = self.slots[z].parent;
                removed_color = self.slots[z].color;
                self.transplant(z, right);
            }
            (left @ Some(_), None) => {
                x = left;
                x_parent = self.slots[z].parent;
                removed_color = self.slots[z].color;
                self.transplant(z, left);
            }
            (Some(zl), Some(zr)) => {
                let y = self.min_from(zr);
                removed_color = self.slots[y].color;
                x = self.slots[y].right;
                if self.slots[y].parent == Some(z) {
                    x_parent = Some(y);
                } else {
                    x_parent = self.slots[y].parent;
                    self.transplant(y, x);
                    self.slots[y].right = Some(zr);
                    self.slots[zr].parent = Some(y);
                }
                self.transplant(z, Some(y));
                self.slots[y].left = Some(zl);
                self.slots[zl].parent = Some(y);
                self.slots[y].color = self.slots[z].color;
            }
        }
        if removed_color == Color::Black {
            self.delete_fixup(x, x_parent);
        }
        let node = &mut self.slots[z];
        node.parent = None;
        node.left = None;
        node.right = None;
    }

    fn delete_fixup(&mut self, mut x: Link, mut parent: Link) {
        while x != self.root && !self.is_red(x) {
            let Some(p) = parent else { break };
            if self.slots[p].left == x {
                let mut w = self.right_sibling(p);
                if self.is_red(Some(w)) {
                    self.set_color(w, Color::Black);
                    self.set_color(p, Color::Red);
                    self.rotate_left(p);
                    w = self.right_sibling(p);
                }
                if !self.is_red(self.slots[w].left) && !self.is_red(self.slots[w].right) {
                    self.set_color(w, Color::Red);
                    x = Some(p);
                    parent = self.slots[p].parent;
                } else {
                    if !self.is_red(self.slots[w].right) {
                        if let Some(wl) = self.slots[w].left {
                            self.set_color(wl, Color::Black);
                        }
                        self.set_color(w, Color::Red);
                        self.rotate_right(w);
                        w = self.right_sibling(p);
                    }
                    self.slots[w].color = self.slots[p].color;
                    self.set_color(p, Color::Black);
                    if let Some(wr) = self.slots[w].right {
                        self.set_color(wr, Color::Black);
                    }
                    self.rotate_left(p);
                    x = self.root;
                    parent = None;
                }
            } else {
                let mut w = self.left_sibling(p);
                if self.is_red(Some(w)) {
                    self.set_color(w, Color::Black);
                    self.set_color(p, Color::Red);
                    self.rotate_right(p);
                    w = self.left_sibling(p);
                }
                if !self.is_red(self.slots[w].left) && !self.is_red(self.slots[w].right) {
                    self.set_color(w, Color::Red);
                    x = Some(p);
                    parent = self.slots[p].parent;
                } else {
                    if !self.is_red(self.slots[w].left) {
                        if let Some(wr) = self.slots[w].right {
                            self.set_color(wr, Color::Black);
                        }
                        self.set_color(w, Color::Red);
                        self.rotate_left(w);
                        w = self.left_sibling(p);
                    }
                    self.slots[w].color = self.slots[p].color;
                    self.set_color(p, Color::Black);
                    if let Some(wl) = self.slots[w].left {
                        self.set_color(wl, Color::Black);
                    }
                    self.rotate_right(p);
                    x = self.root;
                    parent = None;
                }
            }
        }
        if let Some(x) = x {
            self.set_color(x, Color::Black);
        }
    }

    // A doubly-black position always has a sibling; its absence would mean
    // the black heights were already unequal.
    fn right_sibling(&self, p: DefaultKey) -> DefaultKey {
        match self.slots[p].right {
            Some(w) => w,
            None => fatal("black height violated: missing right sibling"),
        }
    }

    fn left_sibling(&self, p: DefaultKey) -> DefaultKey {
        match self.slots[p].left {
            Some(w) => w,
            None => fatal("black height violated: missing left sibling"),
        }
    }
}

/// In-order iterator over `(Handle, &T)`.
pub struct Iter<'a, T> {
    tree: &'a HandleTree<T>,
    front: Link,
    back: Link,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (Handle, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let k = self.front?;
        self.remaining -= 1;
        self.front = self.tree.nodes.successor(k);
        Some((self.tree.handle(k), &self.tree.nodes.slots[k].value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let k = self.back?;
        self.remaining -= 1;
        self.back = self.tree.nodes.predecessor(k);
        Some((self.tree.handle(k), &self.tree.nodes.slots[k].value))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
