//! `MemoryOwner`: A trait for types that pin a memory block at a fixed address.

use std::ptr::NonNull;

/// A trait for types that own a memory block which does not move while the owner
/// is alive.
///
/// A transform buffer may wrap such an owner; the memory is then released by dropping
/// the owner, once nothing references the buffer anymore.
///
/// # Safety
///
/// Implementors must guarantee that:
/// - The memory described by `memory()` stays valid, writable and at the same
///   address for the entire lifetime of the owner, including after the owner
///   itself has been moved.
/// - The pointer carries write permission: it must not be derived from a shared
///   reference.
/// - Every call to `memory()` returns the same allocation.
/// - The reported length is accurate and does not exceed the capacity.
pub unsafe trait MemoryOwner: Send + Sync {
    /// Returns information about the owned memory block.
    fn memory(&self) -> MemoryAllocation;
}

/// Represents a block of allocated memory with its size information.
#[derive(Debug, Clone)]
pub struct MemoryAllocation {
    /// Pointer to the start of the memory block.
    pub ptr: *mut u8,
    /// Usable length of the block in bytes.
    pub len: usize,
    /// Total capacity of the block in bytes.
    pub capacity: usize,
    /// Formal alignment of the block.
    pub alignment: usize,
}

impl MemoryAllocation {
    /// Returns `true` if the start of the block is aligned to `alignment`.
    #[inline]
    pub fn is_aligned(&self, alignment: usize) -> bool {
        debug_assert!(alignment.is_power_of_two());
        (self.ptr as usize) & (alignment - 1) == 0
    }
}

/// A boxed slice released from its `Box` so that its memory can be written through
/// the pointer reported by [`MemoryOwner::memory`]. The slice is freed on drop.
pub struct BoxedMemory<T> {
    data: NonNull<[T]>,
}

impl<T> BoxedMemory<T> {
    pub fn new(data: Box<[T]>) -> BoxedMemory<T> {
        BoxedMemory {
            data: NonNull::from(Box::leak(data)),
        }
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.len() == 0
    }
}

impl<T> From<Box<[T]>> for BoxedMemory<T> {
    fn from(data: Box<[T]>) -> Self {
        BoxedMemory::new(data)
    }
}

impl<T> From<Vec<T>> for BoxedMemory<T> {
    fn from(data: Vec<T>) -> Self {
        BoxedMemory::new(data.into_boxed_slice())
    }
}

impl<T> Drop for BoxedMemory<T> {
    fn drop(&mut self) {
        // SAFETY: `data` came from `Box::leak` and is dropped exactly once.
        drop(unsafe { Box::from_raw(self.data.as_ptr()) });
    }
}

// SAFETY: `BoxedMemory` owns its elements like the `Box` it was made from.
unsafe impl<T: Send> Send for BoxedMemory<T> {}

unsafe impl<T: Sync> Sync for BoxedMemory<T> {}

unsafe impl<T> MemoryOwner for BoxedMemory<T>
where
    T: Send + Sync,
{
    fn memory(&self) -> MemoryAllocation {
        let len = std::mem::size_of::<T>() * self.data.len();
        MemoryAllocation {
            ptr: self.data.as_ptr().cast::<u8>(),
            len,
            capacity: len,
            alignment: std::mem::align_of::<T>(),
        }
    }
}
