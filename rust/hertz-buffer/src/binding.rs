use std::{ptr::NonNull, sync::Arc};

use hertz_engine::Real;

use crate::root::Root;

/// A plan's reference to the memory of a buffer.
///
/// While a binding is alive, the memory it addresses is not released, even if every
/// buffer handle over it has been disposed. Dropping the binding removes the
/// reference and completes a release that was deferred because of it.
pub struct BufferBinding<T: Real> {
    root: Arc<Root<T>>,
    ptr: NonNull<T>,
    len: usize,
    engine_allocated: bool,
}

// SAFETY: the binding only hands out the address; see `Buffer`.
unsafe impl<T: Real> Send for BufferBinding<T> {}

unsafe impl<T: Real> Sync for BufferBinding<T> {}

impl<T: Real> BufferBinding<T> {
    /// Wraps a plan reference that the caller already counted on `root`.
    pub(crate) fn new(
        root: Arc<Root<T>>,
        ptr: NonNull<T>,
        len: usize,
        engine_allocated: bool,
    ) -> BufferBinding<T> {
        BufferBinding {
            root,
            ptr,
            len,
            engine_allocated,
        }
    }

    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    #[inline]
    pub fn as_mut_ptr(&self) -> *mut T {
        self.ptr.as_ptr()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_engine_allocated(&self) -> bool {
        self.engine_allocated
    }

    /// Always `false`: a live binding defers the release.
    #[inline]
    pub fn is_released(&self) -> bool {
        self.root.is_released()
    }
}

impl<T: Real> Drop for BufferBinding<T> {
    fn drop(&mut self) {
        self.root.release_plan();
    }
}

impl<T: Real> std::fmt::Debug for BufferBinding<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferBinding")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .field("engine_allocated", &self.engine_allocated)
            .finish()
    }
}
