//! Ownership policies for keys, values and set items.
//!
//! A `Shape` decides three things for the containers: what is stored,
//! how a caller's argument becomes a stored element (`clone_on_insert`),
//! and what happens to a stored element when it leaves the container
//! (`destroy_on_evict`). It also exposes the view lookups and comparators
//! work on (`query`) and a default total order over that view (`compare`).
//!
//! | Shape | Stored | Insert | Evict | Default order |
//! |---|---|---|---|---|
//! | `Owned<T>` | `T::Owned` | deep copy | drop | `T: Ord` |
//! | `Scalar<T>` | `T` | copy | nothing | `T: Ord` |
//! | `Pointer<'a, T>` | `&'a T` | copy the reference | nothing | address |
//! | `StrongRef<T>` | `Arc<T>` | retain | release | `T: Ord` |
//! | `WeakRef<T>` | `sync::Weak<T>` | copy the weak handle | drop the handle | address |

use core::borrow::Borrow;
use core::cmp::Ordering;
use core::marker::PhantomData;
use std::sync::{Arc, Weak};

pub trait Shape {
    /// What a container node holds.
    type Stored;
    /// What `add`/`set` accept by reference.
    type Input: ?Sized;
    /// What lookups accept and what comparators see.
    type Query: ?Sized;

    fn clone_on_insert(input: &Self::Input) -> Self::Stored;

    /// Copy an element already held by a container, with the same
    /// ownership effect as `clone_on_insert`.
    fn clone_stored(stored: &Self::Stored) -> Self::Stored;

    fn destroy_on_evict(stored: Self::Stored) {
        drop(stored);
    }

    fn query(stored: &Self::Stored) -> &Self::Query;

    fn compare(a: &Self::Query, b: &Self::Query) -> Ordering;
}

/// Deep-copied, container-owned element (`Owned<i64>`, `Owned<str>`, ...).
pub struct Owned<T: ?Sized>(PhantomData<fn() -> Box<T>>);

impl<T> Shape for Owned<T>
where
    T: ?Sized + ToOwned + Ord,
{
    type Stored = T::Owned;
    type Input = T;
    type Query = T;

    fn clone_on_insert(input: &T) -> T::Owned {
        input.to_owned()
    }

    fn clone_stored(stored: &T::Owned) -> T::Owned {
        <T::Owned as Borrow<T>>::borrow(stored).to_owned()
    }

    fn query(stored: &T::Owned) -> &T {
        <T::Owned as Borrow<T>>::borrow(stored)
    }

    fn compare(a: &T, b: &T) -> Ordering {
        a.cmp(b)
    }
}

/// Plain value stored inline; nothing to allocate or release.
pub struct Scalar<T>(PhantomData<fn() -> T>);

impl<T: Copy + Ord> Shape for Scalar<T> {
    type Stored = T;
    type Input = T;
    type Query = T;

    fn clone_on_insert(input: &T) -> T {
        *input
    }

    fn clone_stored(stored: &T) -> T {
        *stored
    }

    fn destroy_on_evict(_stored: T) {}

    fn query(stored: &T) -> &T {
        stored
    }

    fn compare(a: &T, b: &T) -> Ordering {
        a.cmp(b)
    }
}

/// Borrowed reference; the caller keeps ownership of the referent, the
/// borrow checker keeps it alive. Identity is the referent's address.
pub struct Pointer<'a, T: ?Sized>(PhantomData<fn() -> &'a T>);

impl<'a, T: ?Sized> Shape for Pointer<'a, T> {
    type Stored = &'a T;
    type Input = &'a T;
    type Query = T;

    fn clone_on_insert(input: &&'a T) -> &'a T {
        *input
    }

    fn clone_stored(stored: &&'a T) -> &'a T {
        *stored
    }

    fn destroy_on_evict(_stored: &'a T) {}

    fn query<'s>(stored: &'s &'a T) -> &'s T {
        *stored
    }

    fn compare(a: &T, b: &T) -> Ordering {
        address(a).cmp(&address(b))
    }
}

/// Shared ownership. The container holds one strong count per element and
/// gives it back exactly once, on removal, replacement or drop.
pub struct StrongRef<T: ?Sized>(PhantomData<fn() -> Arc<T>>);

impl<T: ?Sized + Ord> Shape for StrongRef<T> {
    type Stored = Arc<T>;
    type Input = Arc<T>;
    type Query = T;

    fn clone_on_insert(input: &Arc<T>) -> Arc<T> {
        Arc::clone(input)
    }

    fn clone_stored(stored: &Arc<T>) -> Arc<T> {
        Arc::clone(stored)
    }

    fn query(stored: &Arc<T>) -> &T {
        stored
    }

    fn compare(a: &T, b: &T) -> Ordering {
        a.cmp(b)
    }
}

/// Non-owning observer. Ordered by allocation address, which stays fixed
/// for as long as the container holds the weak handle, even after the
/// referent is gone.
pub struct WeakRef<T>(PhantomData<fn() -> Weak<T>>);

impl<T> Shape for WeakRef<T> {
    type Stored = Weak<T>;
    type Input = Weak<T>;
    type Query = Weak<T>;

    fn clone_on_insert(input: &Weak<T>) -> Weak<T> {
        Weak::clone(input)
    }

    fn clone_stored(stored: &Weak<T>) -> Weak<T> {
        Weak::clone(stored)
    }

    fn query(stored: &Weak<T>) -> &Weak<T> {
        stored
    }

    fn compare(a: &Weak<T>, b: &Weak<T>) -> Ordering {
        a.as_ptr().cmp(&b.as_ptr())
    }
}

fn address<T: ?Sized>(r: &T) -> usize {
    (r as *const T).cast::<()>() as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owned_str_deep_copies() {
        let original = String::from("abc");
        let stored = <Owned<str>>::clone_on_insert(original.as_str());
        assert_eq!(stored, "abc");
        assert_ne!(stored.as_ptr(), original.as_ptr());
        assert_eq!(<Owned<str>>::query(&stored), "abc");
    }

    #[test]
    fn pointer_orders_by_address() {
        let pair = [7u32, 7u32];
        let (a, b) = (&pair[0], &pair[1]);
        assert_eq!(<Pointer<u32>>::compare(a, b), Ordering::Less);
        assert_eq!(<Pointer<u32>>::compare(a, a), Ordering::Equal);
    }

    #[test]
    fn pointer_query_returns_the_referent() {
        let target = String::from("pinned");
        let stored = <Pointer<str>>::clone_on_insert(&target.as_str());
        let viewed: &str = <Pointer<str>>::query(&stored);
        assert_eq!(viewed.as_ptr(), target.as_ptr());
        assert_eq!(<Pointer<str>>::compare(viewed, &target), Ordering::Equal);
    }

    #[test]
    fn strong_ref_retains_and_releases() {
        let rc = Arc::new(5);
        let stored = <StrongRef<i32>>::clone_on_insert(&rc);
        assert_eq!(Arc::strong_count(&rc), 2);
        <StrongRef<i32>>::destroy_on_evict(stored);
        assert_eq!(Arc::strong_count(&rc), 1);
    }

    #[test]
    fn weak_ref_copies_handle_without_retaining() {
        let rc = Arc::new(5);
        let weak = Arc::downgrade(&rc);
        let stored = <WeakRef<i32>>::clone_on_insert(&weak);
        assert_eq!(Arc::strong_count(&rc), 1);
        assert_eq!(Arc::weak_count(&rc), 2);
        drop(rc);
        // Order is still defined once the referent is gone.
        assert_eq!(<WeakRef<i32>>::compare(&stored, &weak), Ordering::Equal);
        <WeakRef<i32>>::destroy_on_evict(stored);
    }
}
