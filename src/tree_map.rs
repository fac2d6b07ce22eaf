//! TreeMap: ordered key -> value association over `HandleTree`.
//!
//! Keys and values each follow a `Shape`, so one generic type covers every
//! ownership combination: deep-copied strings mapping to borrowed
//! pointers, scalars mapping to `Arc`s, and so on. All lookups return
//! borrows of the stored element; nothing is copied on read.

use crate::compare::{Compare, ShapeOrder};
use crate::error::{fatal, ErrorKind, Result};
use crate::handle_tree::{Duplicate, Handle, HandleTree};
use crate::shape::Shape;
use core::fmt;
use core::marker::PhantomData;

pub(crate) struct Pair<KS, VS> {
    key: KS,
    value: VS,
}

/// Stable handle to one key/value association of one `TreeMap`.
///
/// Stays valid until that association is removed or the map is cleared or
/// dropped. Offering it afterwards, or to another map, yields
/// `ErrorKind::EntryNotFound`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Entry(Handle);

pub struct TreeMap<K: Shape, V: Shape, C = ShapeOrder<K>> {
    tree: HandleTree<Pair<K::Stored, V::Stored>>,
    cmp: C,
    _shape: PhantomData<fn() -> (K, V)>,
}

impl<K: Shape, V: Shape> TreeMap<K, V> {
    pub fn new() -> Self {
        Self::with_comparator(ShapeOrder::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_comparator(capacity, ShapeOrder::new())
    }
}

impl<K: Shape, V: Shape> Default for TreeMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

// Operations that never consult the comparator.
impl<K: Shape, V: Shape, C> TreeMap<K, V, C> {
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

    fn pair(&self, h: Handle) -> &Pair<K::Stored, V::Stored> {
        match self.tree.get(h) {
            Some(p) => p,
            None => fatal("tree returned a handle it cannot resolve"),
        }
    }

    pub fn first_entry(&self) -> Result<Entry> {
        self.tree.first().map(Entry).ok_or(ErrorKind::MapIsEmpty)
    }

    pub fn last_entry(&self) -> Result<Entry> {
        self.tree.last().map(Entry).ok_or(ErrorKind::MapIsEmpty)
    }

    /// Value under the smallest key.
    pub fn first(&self) -> Result<&V::Stored> {
        let e = self.first_entry()?;
        Ok(&self.pair(e.0).value)
    }

    /// Value under the largest key.
    pub fn last(&self) -> Result<&V::Stored> {
        let e = self.last_entry()?;
        Ok(&self.pair(e.0).value)
    }

    pub fn next_entry(&self, entry: Entry) -> Result<Entry> {
        if !self.tree.contains(entry.0) {
            return Err(ErrorKind::EntryNotFound);
        }
        self.tree.next(entry.0).map(Entry).ok_or(ErrorKind::EndOfSequence)
    }

    pub fn prev_entry(&self, entry: Entry) -> Result<Entry> {
        if !self.tree.contains(entry.0) {
            return Err(ErrorKind::EntryNotFound);
        }
        self.tree.prev(entry.0).map(Entry).ok_or(ErrorKind::EndOfSequence)
    }

    pub fn contains_entry(&self, entry: Entry) -> bool {
        self.tree.contains(entry.0)
    }

    pub fn entry_key(&self, entry: Entry) -> Result<&K::Stored> {
        self.tree
            .get(entry.0)
            .map(|p| &p.key)
            .ok_or(ErrorKind::EntryNotFound)
    }

    pub fn entry_get_value(&self, entry: Entry) -> Result<&V::Stored> {
        self.tree
            .get(entry.0)
            .map(|p| &p.value)
            .ok_or(ErrorKind::EntryNotFound)
    }

    pub fn entry_value_mut(&mut self, entry: Entry) -> Result<&mut V::Stored> {
        self.tree
            .get_mut(entry.0)
            .map(|p| &mut p.value)
            .ok_or(ErrorKind::EntryNotFound)
    }

    /// Replace the value of `entry`. The new value is taken under the
    /// value shape's policy before the old one is destroyed, so replacing
    /// a reference with itself never drops the referent.
    pub fn entry_set_value(&mut self, entry: Entry, value: &V::Input) -> Result<()> {
        if !self.tree.contains(entry.0) {
            return Err(ErrorKind::EntryNotFound);
        }
        self.replace_value(entry.0, V::clone_on_insert(value));
        Ok(())
    }

    fn replace_value(&mut self, h: Handle, fresh: V::Stored) {
        let old = match self.tree.get_mut(h) {
            Some(p) => core::mem::replace(&mut p.value, fresh),
            None => fatal("value replaced through a dead handle"),
        };
        V::destroy_on_evict(old);
    }

    /// Remove `entry` and destroy its key and value. The engine frees the
    /// node first; `destroy_on_evict` runs on the detached pair afterwards.
    pub fn remove_entry(&mut self, entry: Entry) -> Result<()> {
        let (key, value) = self.take_entry(entry)?;
        V::destroy_on_evict(value);
        K::destroy_on_evict(key);
        Ok(())
    }

    /// Remove `entry` and hand its stored key and value to the caller
    /// instead of destroying them.
    pub fn take_entry(&mut self, entry: Entry) -> Result<(K::Stored, V::Stored)> {
        let Pair { key, value } = self.tree.remove(entry.0).ok_or(ErrorKind::EntryNotFound)?;
        log::trace!("tree {:?}: removed entry, len {}", self.tree.id(), self.tree.len());
        Ok((key, value))
    }

    /// Destroy every association. Entries handed out earlier stop resolving.
    pub fn clear(&mut self) {
        if self.tree.is_empty() {
            return;
        }
        let pairs = self.tree.drain();
        log::trace!("tree {:?}: clearing {} entries", self.tree.id(), pairs.len());
        for Pair { key, value } in pairs {
            V::destroy_on_evict(value);
            K::destroy_on_evict(key);
        }
    }

    /// Keep only the associations for which `keep` returns true; the rest
    /// are destroyed in key order.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&K::Stored, &mut V::Stored) -> bool,
    {
        let handles: Vec<Handle> = self.tree.iter().map(|(h, _)| h).collect();
        for h in handles {
            let keep_it = match self.tree.get_mut(h) {
                Some(p) => keep(&p.key, &mut p.value),
                None => fatal("handle collected for retain went stale"),
            };
            if !keep_it && self.remove_entry(Entry(h)).is_err() {
                fatal("handle collected for retain went stale");
            }
        }
    }

    /// Key/value pairs in ascending key order.
    pub fn iter(
        &self,
    ) -> impl DoubleEndedIterator<Item = (&K::Stored, &V::Stored)> + ExactSizeIterator + '_ {
        self.tree.iter().map(|(_, p)| (&p.key, &p.value))
    }

    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K::Stored> + ExactSizeIterator + '_ {
        self.tree.iter().map(|(_, p)| &p.key)
    }

    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V::Stored> + ExactSizeIterator + '_ {
        self.tree.iter().map(|(_, p)| &p.value)
    }

    pub fn entries(&self) -> impl DoubleEndedIterator<Item = Entry> + ExactSizeIterator + '_ {
        self.tree.iter().map(|(h, _)| Entry(h))
    }
}

impl<K: Shape, V: Shape, C: Compare<K::Query>> TreeMap<K, V, C> {
    fn locate(&self, key: &K::Query) -> Option<Handle> {
        let cmp = &self.cmp;
        self.tree.find_by(|p| cmp.compare(key, K::query(&p.key)))
    }

    fn insert_pair(&mut self, pair: Pair<K::Stored, V::Stored>) -> Result<Entry> {
        let cmp = &self.cmp;
        match self
            .tree
            .insert_by(pair, |new, old| cmp.compare(K::query(&new.key), K::query(&old.key)))
        {
            Ok(h) => {
                log::trace!("tree {:?}: inserted entry, len {}", self.tree.id(), self.tree.len());
                Ok(Entry(h))
            }
            Err(Duplicate { rejected, .. }) => {
                // Roll back the copies/retains taken for the rejected pair.
                V::destroy_on_evict(rejected.value);
                K::destroy_on_evict(rejected.key);
                Err(ErrorKind::KeyAlreadyExists)
            }
        }
    }

    /// Associate copies of `key` and `value` (per their shapes). Fails with
    /// `KeyAlreadyExists` when an equal key is present; the copies taken for
    /// the attempt are destroyed again and the map is unchanged.
    pub fn add(&mut self, key: &K::Input, value: &V::Input) -> Result<Entry> {
        self.insert_pair(Pair {
            key: K::clone_on_insert(key),
            value: V::clone_on_insert(value),
        })
    }

    /// Like `add`, but takes elements that are already in stored form.
    /// On `KeyAlreadyExists` both are destroyed.
    pub fn insert(&mut self, key: K::Stored, value: V::Stored) -> Result<Entry> {
        self.insert_pair(Pair { key, value })
    }

    /// Add `key` or, if present, replace its value. The stored key is kept.
    pub fn insert_or_set(&mut self, key: &K::Input, value: &V::Input) -> Result<Entry> {
        let pair = Pair {
            key: K::clone_on_insert(key),
            value: V::clone_on_insert(value),
        };
        let cmp = &self.cmp;
        match self
            .tree
            .insert_by(pair, |new, old| cmp.compare(K::query(&new.key), K::query(&old.key)))
        {
            Ok(h) => {
                log::trace!("tree {:?}: inserted entry, len {}", self.tree.id(), self.tree.len());
                Ok(Entry(h))
            }
            Err(Duplicate { rejected, existing }) => {
                let Pair { key, value } = rejected;
                K::destroy_on_evict(key);
                self.replace_value(existing, value);
                Ok(Entry(existing))
            }
        }
    }

    /// Replace the value under an existing key; `KeyNotFound` otherwise.
    pub fn set(&mut self, key: &K::Query, value: &V::Input) -> Result<()> {
        let h = self.locate(key).ok_or(ErrorKind::KeyNotFound)?;
        self.replace_value(h, V::clone_on_insert(value));
        Ok(())
    }

    pub fn remove(&mut self, key: &K::Query) -> Result<()> {
        let h = self.locate(key).ok_or(ErrorKind::KeyNotFound)?;
        self.remove_entry(Entry(h))
    }

    pub fn take(&mut self, key: &K::Query) -> Result<(K::Stored, V::Stored)> {
        let h = self.locate(key).ok_or(ErrorKind::KeyNotFound)?;
        self.take_entry(Entry(h))
    }

    pub fn contains_key(&self, key: &K::Query) -> bool {
        self.locate(key).is_some()
    }

    pub fn find(&self, key: &K::Query) -> Result<Entry> {
        self.locate(key).map(Entry).ok_or(ErrorKind::KeyNotFound)
    }

    pub fn get(&self, key: &K::Query) -> Result<&V::Stored> {
        let e = self.find(key)?;
        Ok(&self.pair(e.0).value)
    }

    pub fn get_mut(&mut self, key: &K::Query) -> Result<&mut V::Stored> {
        let e = self.find(key)?;
        self.entry_value_mut(e)
    }

    /// Entry with the smallest key `>= key`.
    pub fn ceiling_entry(&self, key: &K::Query) -> Result<Entry> {
        let cmp = &self.cmp;
        self.tree
            .ceiling_by(|p| cmp.compare(key, K::query(&p.key)))
            .map(Entry)
            .ok_or(ErrorKind::KeyNotFound)
    }

    /// Entry with the largest key `<= key`.
    pub fn floor_entry(&self, key: &K::Query) -> Result<Entry> {
        let cmp = &self.cmp;
        self.tree
            .floor_by(|p| cmp.compare(key, K::query(&p.key)))
            .map(Entry)
            .ok_or(ErrorKind::KeyNotFound)
    }

    /// Entry with the smallest key `> key`.
    pub fn higher_entry(&self, key: &K::Query) -> Result<Entry> {
        let cmp = &self.cmp;
        self.tree
            .higher_by(|p| cmp.compare(key, K::query(&p.key)))
            .map(Entry)
            .ok_or(ErrorKind::KeyNotFound)
    }

    /// Entry with the largest key `< key`.
    pub fn lower_entry(&self, key: &K::Query) -> Result<Entry> {
        let cmp = &self.cmp;
        self.tree
            .lower_by(|p| cmp.compare(key, K::query(&p.key)))
            .map(Entry)
            .ok_or(ErrorKind::KeyNotFound)
    }

    pub fn ceiling(&self, key: &K::Query) -> Result<&V::Stored> {
        let e = self.ceiling_entry(key)?;
        Ok(&self.pair(e.0).value)
    }

    pub fn floor(&self, key: &K::Query) -> Result<&V::Stored> {
        let e = self.floor_entry(key)?;
        Ok(&self.pair(e.0).value)
    }

    pub fn higher(&self, key: &K::Query) -> Result<&V::Stored> {
        let e = self.higher_entry(key)?;
        Ok(&self.pair(e.0).value)
    }

    pub fn lower(&self, key: &K::Query) -> Result<&V::Stored> {
        let e = self.lower_entry(key)?;
        Ok(&self.pair(e.0).value)
    }
}

/// Deep copy: every association is copied in key order under its shape's
/// policy. The copy shares no storage with the original; entries of one
/// never resolve in the other.
impl<K, V, C> Clone for TreeMap<K, V, C>
where
    K: Shape,
    V: Shape,
    C: Compare<K::Query> + Clone,
{
    fn clone(&self) -> Self {
        let mut copy = Self::with_capacity_and_comparator(self.len(), self.cmp.clone());
        for (key, value) in self.iter() {
            if copy.insert(K::clone_stored(key), V::clone_stored(value)).is_err() {
                fatal("comparator rejected a key it accepted in the source map");
            }
        }
        copy
    }
}

impl<K: Shape, V: Shape, C> Drop for TreeMap<K, V, C> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<K, V, C> fmt::Debug for TreeMap<K, V, C>
where
    K: Shape,
    V: Shape,
    K::Stored: fmt::Debug,
    V::Stored: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
