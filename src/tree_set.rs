//! TreeSet: ordered set of shaped elements over `HandleTree`.
//!
//! Every navigation call returns an `Item`, the handle of the stored
//! element; `value` resolves it. Holding on to an `Item` lets a caller
//! remove or step from an element without a second descent.

use crate::compare::{Compare, ShapeOrder};
use crate::error::{fatal, ErrorKind, Result};
use crate::handle_tree::{Duplicate, Handle, HandleTree};
use crate::shape::Shape;
use core::fmt;
use core::marker::PhantomData;
use slotmap::DefaultKey;

/// Stable handle to one element of one set.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Item(Handle);

impl Item {
    pub(crate) fn handle(self) -> Handle {
        self.0
    }

    pub(crate) fn raw_key(self) -> DefaultKey {
        self.0.raw_key()
    }
}

pub struct TreeSet<T: Shape, C = ShapeOrder<T>> {
    tree: HandleTree<T::Stored>,
    cmp: C,
    _shape: PhantomData<fn() -> T>,
}

impl<T: Shape> TreeSet<T> {
    pub fn new() -> Self {
        Self::with_comparator(ShapeOrder::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_comparator(capacity, ShapeOrder::new())
    }
}

impl<T: Shape> Default for TreeSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Shape, C> TreeSet<T, C> {
    pub fn with_comparator(cmp: C) -> Self {
        Self::with_capacity_and_comparator(0, cmp)
    }

    pub fn with_capacity_and_comparator(capacity: usize, cmp: C) -> Self {
        Self {
            tree: HandleTree::with_capacity(capacity),
            cmp,
            _shape: PhantomData,
        }
    }

    pub fn comparator(&self) -> &C {
        &self.cmp
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn contains_item(&self, item: Item) -> bool {
        self.tree.contains(item.0)
    }

    pub fn value(&self, item: Item) -> Result<&T::Stored> {
        self.tree.get(item.0).ok_or(ErrorKind::ItemNotFound)
    }

    pub(crate) fn value_of(&self, h: Handle) -> &T::Stored {
        match self.tree.get(h) {
            Some(v) => v,
            None => fatal("set tree returned a handle it cannot resolve"),
        }
    }

    pub fn first(&self) -> Result<Item> {
        self.tree.first().map(Item).ok_or(ErrorKind::SetIsEmpty)
    }

    pub fn last(&self) -> Result<Item> {
        self.tree.last().map(Item).ok_or(ErrorKind::SetIsEmpty)
    }

    /// Next item in comparator order.
    pub fn next(&self, item: Item) -> Result<Item> {
        if !self.tree.contains(item.0) {
            return Err(ErrorKind::ItemNotFound);
        }
        self.tree.next(item.0).map(Item).ok_or(ErrorKind::EndOfSequence)
    }

    pub fn prev(&self, item: Item) -> Result<Item> {
        if !self.tree.contains(item.0) {
            return Err(ErrorKind::ItemNotFound);
        }
        self.tree.prev(item.0).map(Item).ok_or(ErrorKind::EndOfSequence)
    }

    pub fn remove_item(&mut self, item: Item) -> Result<()> {
        let stored = self.take_item(item)?;
        T::destroy_on_evict(stored);
        Ok(())
    }

    /// Remove `item` and return the stored element instead of destroying it.
    pub fn take_item(&mut self, item: Item) -> Result<T::Stored> {
        let stored = self.tree.remove(item.0).ok_or(ErrorKind::ItemNotFound)?;
        log::trace!("tree {:?}: removed item, len {}", self.tree.id(), self.tree.len());
        Ok(stored)
    }

    pub fn clear(&mut self) {
        if self.tree.is_empty() {
            return;
        }
        let values = self.tree.drain();
        log::trace!("tree {:?}: clearing {} items", self.tree.id(), values.len());
        for v in values {
            T::destroy_on_evict(v);
        }
    }

    /// Keep only the elements for which `keep` returns true.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&T::Stored) -> bool,
    {
        let doomed: Vec<Handle> = self
            .tree
            .iter()
            .filter(|(_, v)| !keep(*v))
            .map(|(h, _)| h)
            .collect();
        for h in doomed {
            if self.remove_item(Item(h)).is_err() {
                fatal("item collected for retain went stale");
            }
        }
    }

    /// Elements in ascending order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T::Stored> + ExactSizeIterator + '_ {
        self.tree.iter().map(|(_, v)| v)
    }

    pub fn items(&self) -> impl DoubleEndedIterator<Item = Item> + ExactSizeIterator + '_ {
        self.tree.iter().map(|(h, _)| Item(h))
    }
}

impl<T: Shape, C: Compare<T::Query>> TreeSet<T, C> {
    fn locate(&self, value: &T::Query) -> Option<Handle> {
        let cmp = &self.cmp;
        self.tree.find_by(|s| cmp.compare(value, T::query(s)))
    }

    /// Store a copy of `value` (per the shape). `ValueAlreadyExists` when an
    /// equal element is present; the copy is destroyed again.
    pub fn add(&mut self, value: &T::Input) -> Result<Item> {
        self.insert(T::clone_on_insert(value))
    }

    /// Like `add` for an element already in stored form; destroyed on
    /// `ValueAlreadyExists`.
    pub fn insert(&mut self, stored: T::Stored) -> Result<Item> {
        let cmp = &self.cmp;
        match self
            .tree
            .insert_by(stored, |new, old| cmp.compare(T::query(new), T::query(old)))
        {
            Ok(h) => {
                log::trace!("tree {:?}: inserted item, len {}", self.tree.id(), self.tree.len());
                Ok(Item(h))
            }
            Err(Duplicate { rejected, .. }) => {
                T::destroy_on_evict(rejected);
                Err(ErrorKind::ValueAlreadyExists)
            }
        }
    }

    pub fn remove(&mut self, value: &T::Query) -> Result<()> {
        let h = self.locate(value).ok_or(ErrorKind::ValueNotFound)?;
        self.remove_item(Item(h))
    }

    pub fn take(&mut self, value: &T::Query) -> Result<T::Stored> {
        let h = self.locate(value).ok_or(ErrorKind::ValueNotFound)?;
        self.take_item(Item(h))
    }

    pub fn contains(&self, value: &T::Query) -> bool {
        self.locate(value).is_some()
    }

    /// Item equal to `value`.
    pub fn get(&self, value: &T::Query) -> Result<Item> {
        self.locate(value).map(Item).ok_or(ErrorKind::ValueNotFound)
    }

    /// Smallest item `>= value`.
    pub fn ceiling(&self, value: &T::Query) -> Result<Item> {
        let cmp = &self.cmp;
        self.tree
            .ceiling_by(|s| cmp.compare(value, T::query(s)))
            .map(Item)
            .ok_or(ErrorKind::ValueNotFound)
    }

    /// Largest item `<= value`.
    pub fn floor(&self, value: &T::Query) -> Result<Item> {
        let cmp = &self.cmp;
        self.tree
            .floor_by(|s| cmp.compare(value, T::query(s)))
            .map(Item)
            .ok_or(ErrorKind::ValueNotFound)
    }

    /// Smallest item `> value`.
    pub fn higher(&self, value: &T::Query) -> Result<Item> {
        let cmp = &self.cmp;
        self.tree
            .higher_by(|s| cmp.compare(value, T::query(s)))
            .map(Item)
            .ok_or(ErrorKind::ValueNotFound)
    }

    /// Largest item `< value`.
    pub fn lower(&self, value: &T::Query) -> Result<Item> {
        let cmp = &self.cmp;
        self.tree
            .lower_by(|s| cmp.compare(value, T::query(s)))
            .map(Item)
            .ok_or(ErrorKind::ValueNotFound)
    }
}

impl<T, C> Clone for TreeSet<T, C>
where
    T: Shape,
    C: Compare<T::Query> + Clone,
{
    fn clone(&self) -> Self {
        let mut copy = Self::with_capacity_and_comparator(self.len(), self.cmp.clone());
        for v in self.iter() {
            if copy.insert(T::clone_stored(v)).is_err() {
                fatal("comparator rejected an element it accepted in the source set");
            }
        }
        copy
    }
}

impl<T: Shape, C> Drop for TreeSet<T, C> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T, C> fmt::Debug for TreeSet<T, C>
where
    T: Shape,
    T::Stored: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{Owned, Scalar};

    type IntSet = TreeSet<Scalar<i32>>;

    fn set_of(values: &[i32]) -> IntSet {
        let mut s = IntSet::new();
        for v in values {
            s.add(v).unwrap();
        }
        s
    }

    /// Invariant: navigation results resolve to the expected stored values.
    #[test]
    fn navigation_returns_items() {
        let s = set_of(&[10, 30, 20]);
        let v = |r: Result<Item>| r.and_then(|i| s.value(i)).copied();
        assert_eq!(v(s.first()), Ok(10));
        assert_eq!(v(s.last()), Ok(30));
        assert_eq!(v(s.ceiling(&11)), Ok(20));
        assert_eq!(v(s.floor(&29)), Ok(20));
        assert_eq!(v(s.higher(&20)), Ok(30));
        assert_eq!(v(s.lower(&20)), Ok(10));
        assert_eq!(v(s.higher(&30)), Err(ErrorKind::ValueNotFound));
        assert_eq!(v(s.get(&15)), Err(ErrorKind::ValueNotFound));
    }

    /// Invariant: next/prev report EndOfSequence at the ends and
    /// ItemNotFound for removed items.
    #[test]
    fn stepping_past_the_ends() {
        let mut s = set_of(&[1, 2]);
        let first = s.first().unwrap();
        let last = s.last().unwrap();
        assert_eq!(s.prev(first), Err(ErrorKind::EndOfSequence));
        assert_eq!(s.next(last), Err(ErrorKind::EndOfSequence));
        assert_eq!(s.next(first), Ok(last));
        s.remove_item(first).unwrap();
        assert_eq!(s.next(first), Err(ErrorKind::ItemNotFound));
        assert_eq!(s.remove_item(first), Err(ErrorKind::ItemNotFound));
    }

    /// Invariant: an empty set reports SetIsEmpty for first/last.
    #[test]
    fn empty_set_first_last() {
        let s = IntSet::new();
        assert_eq!(s.first(), Err(ErrorKind::SetIsEmpty));
        assert_eq!(s.last(), Err(ErrorKind::SetIsEmpty));
    }

    /// Invariant: a clone is independent of its source.
    #[test]
    fn clone_is_deep_and_independent() {
        let mut a: TreeSet<Owned<str>> = TreeSet::new();
        a.add("x").unwrap();
        a.add("y").unwrap();
        let mut b = a.clone();
        b.remove("x").unwrap();
        b.add("z").unwrap();
        assert_eq!(a.iter().map(String::as_str).collect::<Vec<_>>(), ["x", "y"]);
        assert_eq!(b.iter().map(String::as_str).collect::<Vec<_>>(), ["y", "z"]);
        let item = a.first().unwrap();
        assert_eq!(b.value(item), Err(ErrorKind::ItemNotFound));
    }

    /// Invariant: retain keeps matching elements in order.
    #[test]
    fn retain_keeps_matching() {
        let mut s = set_of(&[1, 2, 3, 4, 5, 6]);
        s.retain(|v| v % 2 == 0);
        assert_eq!(s.iter().copied().collect::<Vec<_>>(), vec![2, 4, 6]);
        assert_eq!(format!("{:?}", s), "{2, 4, 6}");
    }
}
