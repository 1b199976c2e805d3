//! Heap wrappers for runtime values.
//!
//! All heap allocations for values go through the factory methods on
//! `Value`; the wrappers here have no public constructors outside this
//! crate, so external code cannot build aggregate values by hand.
//!
//! Two sharing disciplines exist:
//!
//! - [`Heap<T>`]: immutable shared data (strings, closure captures).
//! - [`Shared<T>`]: mutable shared data with reference semantics
//!   (lists, arrays, instance field maps). Readers and writers take the
//!   inner lock; parallel reduce workers may read but must never write.

use std::fmt;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Immutable shared heap allocation.
#[derive(Default)]
#[repr(transparent)]
pub struct Heap<T>(Arc<T>);

impl<T> Heap<T> {
    #[inline]
    pub(crate) fn new(value: T) -> Self {
        Heap(Arc::new(value))
    }

    /// Pointer identity.
    #[inline]
    pub fn ptr_eq(&self, other: &Heap<T>) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<T> Clone for Heap<T> {
    #[inline]
    fn clone(&self) -> Self {
        Heap(Arc::clone(&self.0))
    }
}

impl<T> std::ops::Deref for Heap<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: fmt::Debug> fmt::Debug for Heap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Mutable shared heap allocation with reference semantics.
///
/// Cloning a `Shared` clones the handle, not the data: every clone
/// observes mutations made through any other clone.
#[repr(transparent)]
pub struct Shared<T>(Arc<RwLock<T>>);

impl<T> Shared<T> {
    #[inline]
    pub(crate) fn new(value: T) -> Self {
        Shared(Arc::new(RwLock::new(value)))
    }

    #[inline]
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.0.read()
    }

    #[inline]
    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.0.write()
    }

    /// Pointer identity, the basis of instance equality.
    #[inline]
    pub fn ptr_eq(&self, other: &Shared<T>) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<T> Clone for Shared<T> {
    #[inline]
    fn clone(&self) -> Self {
        Shared(Arc::clone(&self.0))
    }
}

impl<T: fmt::Debug> fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.read().fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_has_reference_semantics() {
        let a = Shared::new(vec![1, 2]);
        let b = a.clone();
        b.write().push(3);
        assert_eq!(*a.read(), vec![1, 2, 3]);
    }

    #[test]
    fn ptr_eq_distinguishes_allocations() {
        let a = Shared::new(1);
        let b = Shared::new(1);
        assert!(a.ptr_eq(&a.clone()));
        assert!(!a.ptr_eq(&b));
    }
}
