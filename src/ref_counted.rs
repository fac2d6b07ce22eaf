//! Reference-counted variants.
//!
//! Strong containers are the generic containers with a `StrongRef` shape:
//! the container holds one `Arc` per element and drops it exactly once.
//! Reads hand out `&Arc<T>`; clone it to keep the referent past the next
//! mutation.
//!
//! Weak containers hold `sync::Weak<T>` handles that may outlive their
//! referent. The methods here turn a stored handle back into an `Arc`
//! (`*IsInvalid` when the referent is gone) and evict dead handles.

use crate::compare::{Compare, ShapeOrder};
use crate::error::{ErrorKind, Result};
use crate::linked_tree_set::LinkedTreeSet;
use crate::shape::{Shape, StrongRef, WeakRef};
use crate::tree_map::{Entry, TreeMap};
use crate::tree_set::{Item, TreeSet};
use std::sync::{Arc, Weak};

pub type StrongValueMap<K, T, C = ShapeOrder<K>> = TreeMap<K, StrongRef<T>, C>;
pub type WeakValueMap<K, T, C = ShapeOrder<K>> = TreeMap<K, WeakRef<T>, C>;
pub type StrongKeyMap<T, V, C = ShapeOrder<StrongRef<T>>> = TreeMap<StrongRef<T>, V, C>;
pub type WeakKeyMap<T, V, C = ShapeOrder<WeakRef<T>>> = TreeMap<WeakRef<T>, V, C>;
pub type StrongSet<T, C = ShapeOrder<StrongRef<T>>> = TreeSet<StrongRef<T>, C>;
pub type WeakSet<T, C = ShapeOrder<WeakRef<T>>> = TreeSet<WeakRef<T>, C>;
pub type LinkedStrongSet<T, C = ShapeOrder<StrongRef<T>>> = LinkedTreeSet<StrongRef<T>, C>;
pub type LinkedWeakSet<T, C = ShapeOrder<WeakRef<T>>> = LinkedTreeSet<WeakRef<T>, C>;

fn alive<T>(w: &Weak<T>) -> bool {
    w.strong_count() > 0
}

impl<K: Shape, T, C> TreeMap<K, WeakRef<T>, C> {
    /// Strong reference to the value of `entry`.
    pub fn upgrade_entry_value(&self, entry: Entry) -> Result<Arc<T>> {
        self.entry_get_value(entry)?
            .upgrade()
            .ok_or(ErrorKind::ValueIsInvalid)
    }

    /// Remove every association whose value referent is gone. Returns how
    /// many were removed.
    pub fn purge_invalid(&mut self) -> usize {
        let before = self.len();
        self.retain(|_, v| alive(v));
        let purged = before - self.len();
        if purged > 0 {
            log::trace!("purged {} dead weak values", purged);
        }
        purged
    }
}

impl<K: Shape, T, C: Compare<K::Query>> TreeMap<K, WeakRef<T>, C> {
    /// Strong reference to the value under `key`. `KeyNotFound` when absent,
    /// `ValueIsInvalid` when the referent is gone.
    pub fn upgrade(&self, key: &K::Query) -> Result<Arc<T>> {
        self.get(key)?.upgrade().ok_or(ErrorKind::ValueIsInvalid)
    }
}

impl<T, V: Shape, C> TreeMap<WeakRef<T>, V, C> {
    pub fn upgrade_key(&self, entry: Entry) -> Result<Arc<T>> {
        self.entry_key(entry)?
            .upgrade()
            .ok_or(ErrorKind::KeyIsInvalid)
    }

    /// Remove every association whose key referent is gone.
    pub fn purge_invalid_keys(&mut self) -> usize {
        let before = self.len();
        self.retain(|k, _| alive(k));
        let purged = before - self.len();
        if purged > 0 {
            log::trace!("purged {} dead weak keys", purged);
        }
        purged
    }
}

impl<T, C> TreeSet<WeakRef<T>, C> {
    pub fn upgrade_item(&self, item: Item) -> Result<Arc<T>> {
        self.value(item)?.upgrade().ok_or(ErrorKind::ItemIsInvalid)
    }

    pub fn purge_invalid(&mut self) -> usize {
        let before = self.len();
        self.retain(alive);
        before - self.len()
    }
}

impl<T, C> LinkedTreeSet<WeakRef<T>, C> {
    pub fn upgrade_item(&self, item: Item) -> Result<Arc<T>> {
        self.value(item)?.upgrade().ok_or(ErrorKind::ItemIsInvalid)
    }

    /// Survivors keep their link order.
    pub fn purge_invalid(&mut self) -> usize {
        let before = self.len();
        self.retain(alive);
        before - self.len()
    }
}
