//! rc-treemap: ordered maps and sets with stable entry handles and
//! pluggable ownership policies for keys and values.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: one generic ordered map, one ordered set and one linked set
//!   serve every ownership discipline (deep-copied, plain scalar, borrowed,
//!   strong and weak reference-counted) without per-shape duplication.
//! - Layers:
//!   - HandleTree<T>: comparator-driven red-black tree over a generational
//!     arena. Returns stable `Handle`s and offers navigation (find,
//!     ceiling/floor/higher/lower, first/last, next/prev). Includes a
//!     debug-only reentrancy guard while the tree is being restructured.
//!   - TreeMap<K, V, C> / TreeSet<T, C>: apply a `Shape` (ownership
//!     policy) per key and value, translate engine results into
//!     `ErrorKind`s and hand out `Entry`/`Item` handles.
//!   - LinkedTreeSet<T, C>: TreeSet plus a second, caller-controlled link
//!     order over the same items.
//!   - ref_counted: aliases for the `StrongRef`/`WeakRef` family and weak
//!     handle upgrades.
//!
//! Constraints
//! - Single-threaded per container; no internal locking. Callers serialize
//!   access if a container is shared.
//! - O(log n) lookups and updates, O(1) amortized next/prev, one arena
//!   slot per element.
//! - Unique keys; a duplicate insert fails and leaves the container as it
//!   was.
//! - Reentrancy: only the comparator runs while the tree is inconsistent,
//!   and it must not call back into the same container.
//!
//! Handles
//! - `Entry` and `Item` carry the id of the container that minted them and
//!   a generational arena key. A handle from another container, or to a
//!   removed element, fails with `EntryNotFound`/`ItemNotFound`; it never
//!   resolves to a different element.
//!
//! Eviction order
//! - The engine unlinks a node before giving its element back, and the
//!   wrappers run `Shape::destroy_on_evict` only after that. Dropping a
//!   referent may therefore re-enter the container safely.
//!
//! Notes and non-goals
//! - Strong containers lend `&Arc<T>` from every read; clone the `Arc` to
//!   retain it.
//! - Weak-referenced elements are ordered by allocation address so a dead
//!   referent never changes its position.
//! - Keys are immutable after insert; there is no `key_mut`.

mod compare;
mod error;
mod handle_tree;
mod handle_tree_proptest;
mod linked_tree_set;
mod reentrancy;
mod ref_counted;
pub mod shape;
mod tree_map;
mod tree_set;

// Public surface
pub use compare::{Compare, Reverse, ShapeOrder};
pub use error::{ErrorKind, Result};
pub use linked_tree_set::LinkedTreeSet;
pub use ref_counted::{
    LinkedStrongSet, LinkedWeakSet, StrongKeyMap, StrongSet, StrongValueMap, WeakKeyMap, WeakSet,
    WeakValueMap,
};
pub use shape::{Owned, Pointer, Scalar, Shape, StrongRef, WeakRef};
pub use tree_map::{Entry, TreeMap};
pub use tree_set::{Item, TreeSet};

// Engine access for benchmarks only.
#[cfg(feature = "bench_internal")]
pub use handle_tree::{Handle, HandleTree};
