//! An abstraction over whatever thread-safe shared pointer type (i.e. Arc<T>-like)
//! the library has decided to use.
//!
//! State graphs, Decisions and Actions are shared read-only between every agent
//! that uses them, so they all travel around behind this wrapper.

extern crate alloc;
use alloc::sync::Arc;

/// The underlying 'backend' type for ThreadSafeRef
type ThreadSafeRefValue<T> = Arc<T>;

/// An abstraction over whatever thread-safe shared pointer type (i.e. [`Arc<T>`]-like)
/// the library has decided to use.
///
/// The backing library's datatype should be treated as a hidden implementation detail
/// for the overwhelming majority of possible purposes.
///
/// Note that this type does NOT provide weakrefs (e.g. [`alloc::sync::Weak`])!
/// Weak handles to host-owned objects are plain IDs (see `TargetId`).
#[derive(Debug)]
pub struct ThreadSafeRef<T: ?Sized> {
    wrapped: ThreadSafeRefValue<T>
}

impl<T> ThreadSafeRef<T> {
    #[inline]
    pub fn new(val: T) -> Self {
        Self { wrapped: Arc::new(val) }
    }
}

impl<T: ?Sized> ThreadSafeRef<T> {
    #[inline]
    pub fn new_from_ref(val: ThreadSafeRefValue<T>) -> Self {
        Self { wrapped: val }
    }

    /// Whether both refs point at the very same shared value (not merely equal values).
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.wrapped, &other.wrapped)
    }
}

impl<T: ?Sized> Clone for ThreadSafeRef<T> {
    fn clone(&self) -> Self {
        Self::new_from_ref(self.wrapped.clone())
    }
}

impl<T: ?Sized> From<Arc<T>> for ThreadSafeRef<T> {
    fn from(value: Arc<T>) -> Self {
        Self::new_from_ref(value)
    }
}

impl<T: ?Sized> core::ops::Deref for ThreadSafeRef<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.wrapped.deref()
    }
}

impl<T: ?Sized> AsRef<T> for ThreadSafeRef<T> {
    fn as_ref(&self) -> &T {
        self.wrapped.as_ref()
    }
}
