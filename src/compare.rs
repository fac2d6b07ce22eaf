//! Comparators owned by containers.

use crate::shape::Shape;
use core::cmp::Ordering;
use core::fmt;
use core::marker::PhantomData;

/// Total order over `T`. Must be consistent for the lifetime of the
/// container that owns it.
pub trait Compare<T: ?Sized> {
    fn compare(&self, a: &T, b: &T) -> Ordering;
}

impl<T: ?Sized, F> Compare<T> for F
where
    F: Fn(&T, &T) -> Ordering,
{
    fn compare(&self, a: &T, b: &T) -> Ordering {
        self(a, b)
    }
}

/// The default comparator: the shape's own `compare`.
pub struct ShapeOrder<S: ?Sized>(PhantomData<fn() -> Box<S>>);

impl<S: ?Sized> ShapeOrder<S> {
    pub const fn new() -> Self {
        ShapeOrder(PhantomData)
    }
}

impl<S: ?Sized> Default for ShapeOrder<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ?Sized> Clone for ShapeOrder<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: ?Sized> Copy for ShapeOrder<S> {}

impl<S: ?Sized> fmt::Debug for ShapeOrder<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ShapeOrder")
    }
}

impl<S: Shape> Compare<S::Query> for ShapeOrder<S> {
    fn compare(&self, a: &S::Query, b: &S::Query) -> Ordering {
        S::compare(a, b)
    }
}

/// Inverts another comparator.
#[derive(Copy, Clone, Debug, Default)]
pub struct Reverse<C>(pub C);

impl<T: ?Sized, C: Compare<T>> Compare<T> for Reverse<C> {
    fn compare(&self, a: &T, b: &T) -> Ordering {
        self.0.compare(b, a)
    }
}
