//! The lifetime record shared by a root buffer, its slices, and the plans bound to
//! any of them.

use std::{
    ptr::NonNull,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use hertz_common_traits::memory_owner::MemoryOwner;
use hertz_engine::{Allocator, Real};

/// How the memory of a buffer is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ownership {
    /// Allocated through the engine's allocator; freed through it.
    Allocated,
    /// Memory pinned by an owner object the buffer took over; released by dropping
    /// the owner.
    Pinned,
    /// A zero-copy view into another buffer's memory.
    Slice,
    /// Caller-managed memory; never released by the buffer.
    Foreign,
}

/// The memory behind a root buffer, in the form needed to release it.
pub(crate) enum Memory<T> {
    Engine {
        allocator: Arc<dyn Allocator>,
        ptr: NonNull<u8>,
        bytes: usize,
    },
    Vec(Vec<T>),
    Owner(Box<dyn MemoryOwner>),
    Foreign,
}

impl<T> Memory<T> {
    fn release(self) {
        match self {
            Memory::Engine {
                allocator,
                ptr,
                bytes,
            } => unsafe { allocator.free(ptr, bytes) },
            Memory::Vec(vec) => drop(vec),
            Memory::Owner(owner) => drop(owner),
            Memory::Foreign => (),
        }
    }
}

/// Shared lifetime record of one memory block.
///
/// Memory is released exactly once, as soon as the root handle has requested the
/// release and neither slices nor plans reference the block. The condition is
/// re-evaluated on every decrement.
pub(crate) struct Root<T> {
    ptr: NonNull<T>,
    len: usize,
    ownership: Ownership,
    memory: Mutex<Option<Memory<T>>>,
    slices: AtomicUsize,
    plans: AtomicUsize,
    release_requested: AtomicBool,
    released: AtomicBool,
}

// SAFETY: `ptr` is never dereferenced by `Root`; the memory it describes is held by
// `memory`, whose variants are all safe to release from any thread.
unsafe impl<T: Real> Send for Root<T> {}

unsafe impl<T: Real> Sync for Root<T> {}

impl<T: Real> Root<T> {
    pub(crate) fn new(
        ptr: NonNull<T>,
        len: usize,
        ownership: Ownership,
        memory: Memory<T>,
    ) -> Arc<Root<T>> {
        Arc::new(Root {
            ptr,
            len,
            ownership,
            memory: Mutex::new(Some(memory)),
            slices: AtomicUsize::new(0),
            plans: AtomicUsize::new(0),
            release_requested: AtomicBool::new(false),
            released: AtomicBool::new(false),
        })
    }

    #[inline]
    pub(crate) fn ownership(&self) -> Ownership {
        self.ownership
    }

    #[inline]
    pub(crate) fn is_engine_allocated(&self) -> bool {
        self.ownership == Ownership::Allocated
    }

    #[inline]
    pub(crate) fn slices(&self) -> usize {
        self.slices.load(Ordering::SeqCst)
    }

    #[inline]
    pub(crate) fn plans(&self) -> usize {
        self.plans.load(Ordering::SeqCst)
    }

    #[inline]
    pub(crate) fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    pub(crate) fn acquire_slice(&self) {
        self.slices.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn release_slice(&self) {
        let prev = self.slices.fetch_sub(1, Ordering::SeqCst);
        debug_assert_ne!(prev, 0);
        self.try_release();
    }

    pub(crate) fn acquire_plan(&self) {
        self.plans.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn release_plan(&self) {
        let prev = self.plans.fetch_sub(1, Ordering::SeqCst);
        debug_assert_ne!(prev, 0);
        self.try_release();
    }

    /// Records that the root handle was disposed.
    pub(crate) fn request_release(&self) {
        self.release_requested.store(true, Ordering::SeqCst);
        if !self.try_release() {
            log::trace!(
                "release of {:?} deferred: {} slices, {} plans outstanding",
                self.ptr,
                self.slices(),
                self.plans()
            );
        }
    }

    /// Releases the memory if the release was requested and nothing references it.
    /// Returns `true` if the memory is released after the call.
    fn try_release(&self) -> bool {
        if !self.release_requested.load(Ordering::SeqCst)
            || self.slices.load(Ordering::SeqCst) != 0
            || self.plans.load(Ordering::SeqCst) != 0
        {
            return self.is_released();
        }
        if self
            .released
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return true;
        }

        let memory = self
            .memory
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(memory) = memory {
            log::debug!(
                "releasing {:?} memory at {:?} ({} elements)",
                self.ownership,
                self.ptr,
                self.len
            );
            memory.release();
        }
        true
    }
}

// Handles and bindings give their counts back before their `Arc` goes, and a
// leaked handle leaks the `Arc` too. Memory is still present here only when a
// release was cut short by a panic unwinding through `dispose` or a binding drop.
impl<T> Drop for Root<T> {
    fn drop(&mut self) {
        let memory = self
            .memory
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(memory) = memory {
            log::warn!(
                "reclaiming {:?} memory at {:?} that was never disposed",
                self.ownership,
                self.ptr
            );
            memory.release();
        }
    }
}
