//! LinkedTreeSet: a `TreeSet` plus an independent link order.
//!
//! Tree order comes from the comparator; link order comes from where the
//! caller placed each item (`append`, `prepend`, `insert_after`,
//! `insert_before`). Links live in a `SecondaryMap` keyed by the item's
//! arena key, so every live item has exactly one link node and removing an
//! item unlinks it before the tree node is freed. Both orders therefore
//! always cover the same items.

use crate::compare::{Compare, ShapeOrder};
use crate::error::{fatal, ErrorKind, Result};
use crate::shape::Shape;
use crate::tree_set::{Item, TreeSet};
use core::fmt;
use slotmap::{DefaultKey, SecondaryMap};

#[derive(Copy, Clone, Debug)]
struct Link {
    prev: Option<Item>,
    next: Option<Item>,
}

pub struct LinkedTreeSet<T: Shape, C = ShapeOrder<T>> {
    set: TreeSet<T, C>,
    links: SecondaryMap<DefaultKey, Link>,
    head: Option<Item>,
    tail: Option<Item>,
}

impl<T: Shape> LinkedTreeSet<T> {
    pub fn new() -> Self {
        Self::with_comparator(ShapeOrder::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_comparator(capacity, ShapeOrder::new())
    }
}

impl<T: Shape> Default for LinkedTreeSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Shape, C> LinkedTreeSet<T, C> {
    pub fn with_comparator(cmp: C) -> Self {
        Self::with_capacity_and_comparator(0, cmp)
    }

    pub fn with_capacity_and_comparator(capacity: usize, cmp: C) -> Self {
        Self {
            set: TreeSet::with_capacity_and_comparator(capacity, cmp),
            links: SecondaryMap::with_capacity(capacity),
            head: None,
            tail: None,
        }
    }

    /// Read-only view of the tree order.
    pub fn as_tree_set(&self) -> &TreeSet<T, C> {
        &self.set
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    pub fn contains_item(&self, item: Item) -> bool {
        self.set.contains_item(item)
    }

    pub fn value(&self, item: Item) -> Result<&T::Stored> {
        self.set.value(item)
    }

    pub fn first(&self) -> Result<Item> {
        self.set.first()
    }

    pub fn last(&self) -> Result<Item> {
        self.set.last()
    }

    /// Next item in tree order.
    pub fn next(&self, item: Item) -> Result<Item> {
        self.set.next(item)
    }

    /// Previous item in tree order.
    pub fn prev(&self, item: Item) -> Result<Item> {
        self.set.prev(item)
    }

    fn link(&self, item: Item) -> Link {
        match self.links.get(item.raw_key()) {
            Some(l) => *l,
            None => fatal("live item has no link node"),
        }
    }

    fn link_mut(&mut self, item: Item) -> &mut Link {
        match self.links.get_mut(item.raw_key()) {
            Some(l) => l,
            None => fatal("live item has no link node"),
        }
    }

    /// Link `item` right after `anchor`, or at the head when `anchor` is `None`.
    fn splice_after(&mut self, anchor: Option<Item>, item: Item) {
        let next = match anchor {
            Some(a) => self.link(a).next,
            None => self.head,
        };
        self.links.insert(item.raw_key(), Link { prev: anchor, next });
        match anchor {
            Some(a) => self.link_mut(a).next = Some(item),
            None => self.head = Some(item),
        }
        match next {
            Some(n) => self.link_mut(n).prev = Some(item),
            None => self.tail = Some(item),
        }
    }

    fn unlink(&mut self, item: Item) {
        let Some(Link { prev, next }) = self.links.remove(item.raw_key()) else {
            fatal("live item has no link node")
        };
        match prev {
            Some(p) => self.link_mut(p).next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.link_mut(n).prev = prev,
            None => self.tail = prev,
        }
    }

    /// First item in link order.
    pub fn link_first(&self) -> Result<Item> {
        self.head.ok_or(ErrorKind::SetIsEmpty)
    }

    /// Last item in link order.
    pub fn link_last(&self) -> Result<Item> {
        self.tail.ok_or(ErrorKind::SetIsEmpty)
    }

    pub fn link_next(&self, item: Item) -> Result<Item> {
        if !self.set.contains_item(item) {
            return Err(ErrorKind::ItemNotFound);
        }
        self.link(item).next.ok_or(ErrorKind::EndOfSequence)
    }

    pub fn link_prev(&self, item: Item) -> Result<Item> {
        if !self.set.contains_item(item) {
            return Err(ErrorKind::ItemNotFound);
        }
        self.link(item).prev.ok_or(ErrorKind::EndOfSequence)
    }

    /// Items in link order.
    pub fn link_items(&self) -> impl Iterator<Item = Item> + '_ {
        core::iter::successors(self.head, move |&i| self.link(i).next)
    }

    /// Elements in link order.
    pub fn link_iter(&self) -> impl Iterator<Item = &T::Stored> + '_ {
        self.link_items().map(move |i| self.set.value_of(i.handle()))
    }

    /// Elements in tree order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T::Stored> + ExactSizeIterator + '_ {
        self.set.iter()
    }

    pub fn items(&self) -> impl DoubleEndedIterator<Item = Item> + ExactSizeIterator + '_ {
        self.set.items()
    }

    pub fn remove_item(&mut self, item: Item) -> Result<()> {
        let stored = self.take_item(item)?;
        T::destroy_on_evict(stored);
        Ok(())
    }

    pub fn take_item(&mut self, item: Item) -> Result<T::Stored> {
        if !self.set.contains_item(item) {
            return Err(ErrorKind::ItemNotFound);
        }
        self.unlink(item);
        self.set.take_item(item)
    }

    pub fn clear(&mut self) {
        self.links.clear();
        self.head = None;
        self.tail = None;
        self.set.clear();
    }

    /// Keep only the elements for which `keep` returns true. Survivors keep
    /// their relative link order.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&T::Stored) -> bool,
    {
        let doomed: Vec<Item> = self
            .link_items()
            .filter(|&i| !keep(self.set.value_of(i.handle())))
            .collect();
        for item in doomed {
            if self.remove_item(item).is_err() {
                fatal("item collected for retain went stale");
            }
        }
    }
}

impl<T: Shape, C: Compare<T::Query>> LinkedTreeSet<T, C> {
    /// Add `value` at the tail of link order. Same as `append`.
    pub fn add(&mut self, value: &T::Input) -> Result<Item> {
        self.append(value)
    }

    pub fn append(&mut self, value: &T::Input) -> Result<Item> {
        let item = self.set.add(value)?;
        self.splice_after(self.tail, item);
        Ok(item)
    }

    pub fn prepend(&mut self, value: &T::Input) -> Result<Item> {
        let item = self.set.add(value)?;
        self.splice_after(None, item);
        Ok(item)
    }

    /// Add `value` directly after `anchor` in link order. The anchor is
    /// checked before anything is copied.
    pub fn insert_after(&mut self, anchor: Item, value: &T::Input) -> Result<Item> {
        if !self.set.contains_item(anchor) {
            return Err(ErrorKind::ItemNotFound);
        }
        let item = self.set.add(value)?;
        self.splice_after(Some(anchor), item);
        Ok(item)
    }

    pub fn insert_before(&mut self, anchor: Item, value: &T::Input) -> Result<Item> {
        if !self.set.contains_item(anchor) {
            return Err(ErrorKind::ItemNotFound);
        }
        let item = self.set.add(value)?;
        let before = self.link(anchor).prev;
        self.splice_after(before, item);
        Ok(item)
    }

    pub fn remove(&mut self, value: &T::Query) -> Result<()> {
        let item = self.set.get(value)?;
        self.remove_item(item)
    }

    pub fn take(&mut self, value: &T::Query) -> Result<T::Stored> {
        let item = self.set.get(value)?;
        self.take_item(item)
    }

    pub fn contains(&self, value: &T::Query) -> bool {
        self.set.contains(value)
    }

    pub fn get(&self, value: &T::Query) -> Result<Item> {
        self.set.get(value)
    }

    pub fn ceiling(&self, value: &T::Query) -> Result<Item> {
        self.set.ceiling(value)
    }

    pub fn floor(&self, value: &T::Query) -> Result<Item> {
        self.set.floor(value)
    }

    pub fn higher(&self, value: &T::Query) -> Result<Item> {
        self.set.higher(value)
    }

    pub fn lower(&self, value: &T::Query) -> Result<Item> {
        self.set.lower(value)
    }
}

/// Deep copy that preserves link order.
impl<T, C> Clone for LinkedTreeSet<T, C>
where
    T: Shape,
    C: Compare<T::Query> + Clone,
{
    fn clone(&self) -> Self {
        let mut copy = Self::with_capacity_and_comparator(self.len(), self.set.comparator().clone());
        for v in self.link_iter() {
            let Ok(item) = copy.set.insert(T::clone_stored(v)) else {
                fatal("comparator rejected an element it accepted in the source set")
            };
            copy.splice_after(copy.tail, item);
        }
        copy
    }
}

/// Renders in link order.
impl<T, C> fmt::Debug for LinkedTreeSet<T, C>
where
    T: Shape,
    T::Stored: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.link_iter()).finish()
    }
}
