//! Engine and allocator doubles.

use std::{
    ptr::NonNull,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use hertz_engine::{Allocator, Engine, Flags, NativePlan, R2rKind, Real, ReferenceEngine, Sign};

/// Allocation counters shared by a [`CountingAllocator`] and its clones.
#[derive(Debug, Default)]
pub struct AllocationStats {
    allocations: AtomicUsize,
    frees: AtomicUsize,
    failures: AtomicUsize,
    outstanding_bytes: AtomicUsize,
}

impl AllocationStats {
    pub fn allocations(&self) -> usize {
        self.allocations.load(Ordering::SeqCst)
    }

    pub fn frees(&self) -> usize {
        self.frees.load(Ordering::SeqCst)
    }

    /// Requests that could not be satisfied.
    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::SeqCst)
    }

    /// Blocks allocated and not yet freed.
    pub fn outstanding(&self) -> usize {
        self.allocations() - self.frees()
    }

    pub fn outstanding_bytes(&self) -> usize {
        self.outstanding_bytes.load(Ordering::SeqCst)
    }
}

/// An allocator that forwards to another one and counts allocations and frees.
///
/// An optional byte budget caps the outstanding bytes; a request that would exceed
/// it fails as if the memory were exhausted.
pub struct CountingAllocator<A = ReferenceEngine> {
    inner: A,
    stats: Arc<AllocationStats>,
    budget: usize,
}

impl<A: Allocator> CountingAllocator<A> {
    pub fn new(inner: A) -> CountingAllocator<A> {
        Self::with_budget(inner, usize::MAX)
    }

    /// Allows at most `budget` outstanding bytes.
    pub fn with_budget(inner: A, budget: usize) -> CountingAllocator<A> {
        CountingAllocator {
            inner,
            stats: Arc::default(),
            budget,
        }
    }

    /// An allocator that refuses every request.
    pub fn exhausted(inner: A) -> CountingAllocator<A> {
        Self::with_budget(inner, 0)
    }

    pub fn stats(&self) -> Arc<AllocationStats> {
        self.stats.clone()
    }
}

impl Default for CountingAllocator {
    fn default() -> Self {
        CountingAllocator::new(ReferenceEngine::new())
    }
}

unsafe impl<A: Allocator> Allocator for CountingAllocator<A> {
    fn alignment(&self) -> usize {
        self.inner.alignment()
    }

    fn allocate(&self, bytes: usize) -> Option<NonNull<u8>> {
        let reserved = self.stats.outstanding_bytes.fetch_update(
            Ordering::SeqCst,
            Ordering::SeqCst,
            |outstanding| {
                outstanding
                    .checked_add(bytes)
                    .filter(|&total| total <= self.budget)
            },
        );
        if reserved.is_err() {
            self.stats.failures.fetch_add(1, Ordering::SeqCst);
            return None;
        }
        match self.inner.allocate(bytes) {
            Some(ptr) => {
                self.stats.allocations.fetch_add(1, Ordering::SeqCst);
                Some(ptr)
            }
            None => {
                self.stats
                    .outstanding_bytes
                    .fetch_sub(bytes, Ordering::SeqCst);
                self.stats.failures.fetch_add(1, Ordering::SeqCst);
                None
            }
        }
    }

    unsafe fn free(&self, ptr: NonNull<u8>, bytes: usize) {
        self.stats.frees.fetch_add(1, Ordering::SeqCst);
        self.stats
            .outstanding_bytes
            .fetch_sub(bytes, Ordering::SeqCst);
        unsafe { self.inner.free(ptr, bytes) }
    }

    fn alignment_of(&self, ptr: *const u8) -> usize {
        self.inner.alignment_of(ptr)
    }
}

/// An engine that forwards to another one, counting allocations and the native
/// plans it created that are still alive.
pub struct CountingEngine<E = ReferenceEngine> {
    allocator: CountingAllocator<E>,
    created: Arc<AtomicUsize>,
    live: Arc<AtomicUsize>,
}

impl<E: Allocator> CountingEngine<E> {
    pub fn new(inner: E) -> CountingEngine<E> {
        Self::with_budget(inner, usize::MAX)
    }

    /// An engine whose allocator allows at most `budget` outstanding bytes.
    pub fn with_budget(inner: E, budget: usize) -> CountingEngine<E> {
        CountingEngine {
            allocator: CountingAllocator::with_budget(inner, budget),
            created: Arc::default(),
            live: Arc::default(),
        }
    }

    pub fn allocation_stats(&self) -> Arc<AllocationStats> {
        self.allocator.stats()
    }

    /// Native plans created so far.
    pub fn plans_created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Native plans created and not yet destroyed.
    pub fn live_plans(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    fn count<T: Real>(
        &self,
        plan: Option<Box<dyn NativePlan<T>>>,
    ) -> Option<Box<dyn NativePlan<T>>> {
        let inner = plan?;
        self.created.fetch_add(1, Ordering::SeqCst);
        self.live.fetch_add(1, Ordering::SeqCst);
        Some(Box::new(CountedPlan {
            inner,
            live: self.live.clone(),
        }))
    }
}

impl Default for CountingEngine {
    fn default() -> Self {
        CountingEngine::new(ReferenceEngine::new())
    }
}

unsafe impl<E: Allocator> Allocator for CountingEngine<E> {
    fn alignment(&self) -> usize {
        self.allocator.alignment()
    }

    fn allocate(&self, bytes: usize) -> Option<NonNull<u8>> {
        self.allocator.allocate(bytes)
    }

    unsafe fn free(&self, ptr: NonNull<u8>, bytes: usize) {
        unsafe { self.allocator.free(ptr, bytes) }
    }

    fn alignment_of(&self, ptr: *const u8) -> usize {
        self.allocator.alignment_of(ptr)
    }
}

impl<T: Real, E: Engine<T>> Engine<T> for CountingEngine<E> {
    unsafe fn plan_dft(
        &self,
        dims: &[usize],
        input: *mut T,
        output: *mut T,
        sign: Sign,
        flags: Flags,
    ) -> Option<Box<dyn NativePlan<T>>> {
        self.count(unsafe { self.allocator.inner.plan_dft(dims, input, output, sign, flags) })
    }

    unsafe fn plan_split_dft(
        &self,
        dims: &[usize],
        real_in: *mut T,
        imag_in: *mut T,
        real_out: *mut T,
        imag_out: *mut T,
        flags: Flags,
    ) -> Option<Box<dyn NativePlan<T>>> {
        self.count(unsafe {
            self.allocator
                .inner
                .plan_split_dft(dims, real_in, imag_in, real_out, imag_out, flags)
        })
    }

    unsafe fn plan_dft_r2c(
        &self,
        dims: &[usize],
        input: *mut T,
        output: *mut T,
        flags: Flags,
    ) -> Option<Box<dyn NativePlan<T>>> {
        self.count(unsafe { self.allocator.inner.plan_dft_r2c(dims, input, output, flags) })
    }

    unsafe fn plan_split_dft_r2c(
        &self,
        dims: &[usize],
        input: *mut T,
        real_out: *mut T,
        imag_out: *mut T,
        flags: Flags,
    ) -> Option<Box<dyn NativePlan<T>>> {
        self.count(unsafe {
            self.allocator
                .inner
                .plan_split_dft_r2c(dims, input, real_out, imag_out, flags)
        })
    }

    unsafe fn plan_dft_c2r(
        &self,
        dims: &[usize],
        input: *mut T,
        output: *mut T,
        flags: Flags,
    ) -> Option<Box<dyn NativePlan<T>>> {
        self.count(unsafe { self.allocator.inner.plan_dft_c2r(dims, input, output, flags) })
    }

    unsafe fn plan_split_dft_c2r(
        &self,
        dims: &[usize],
        real_in: *mut T,
        imag_in: *mut T,
        output: *mut T,
        flags: Flags,
    ) -> Option<Box<dyn NativePlan<T>>> {
        self.count(unsafe {
            self.allocator
                .inner
                .plan_split_dft_c2r(dims, real_in, imag_in, output, flags)
        })
    }

    unsafe fn plan_r2r(
        &self,
        dims: &[usize],
        input: *mut T,
        output: *mut T,
        kinds: &[R2rKind],
        flags: Flags,
    ) -> Option<Box<dyn NativePlan<T>>> {
        self.count(unsafe { self.allocator.inner.plan_r2r(dims, input, output, kinds, flags) })
    }
}

struct CountedPlan<T: Real> {
    inner: Box<dyn NativePlan<T>>,
    live: Arc<AtomicUsize>,
}

impl<T: Real> Drop for CountedPlan<T> {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

impl<T: Real> NativePlan<T> for CountedPlan<T> {
    unsafe fn execute(&self) {
        unsafe { self.inner.execute() }
    }

    unsafe fn execute_dft(&self, input: *mut T, output: *mut T) {
        unsafe { self.inner.execute_dft(input, output) }
    }

    unsafe fn execute_split_dft(
        &self,
        real_in: *mut T,
        imag_in: *mut T,
        real_out: *mut T,
        imag_out: *mut T,
    ) {
        unsafe {
            self.inner
                .execute_split_dft(real_in, imag_in, real_out, imag_out)
        }
    }

    unsafe fn execute_dft_r2c(&self, input: *mut T, output: *mut T) {
        unsafe { self.inner.execute_dft_r2c(input, output) }
    }

    unsafe fn execute_split_dft_r2c(&self, input: *mut T, real_out: *mut T, imag_out: *mut T) {
        unsafe { self.inner.execute_split_dft_r2c(input, real_out, imag_out) }
    }

    unsafe fn execute_dft_c2r(&self, input: *mut T, output: *mut T) {
        unsafe { self.inner.execute_dft_c2r(input, output) }
    }

    unsafe fn execute_split_dft_c2r(&self, real_in: *mut T, imag_in: *mut T, output: *mut T) {
        unsafe { self.inner.execute_split_dft_c2r(real_in, imag_in, output) }
    }

    unsafe fn execute_r2r(&self, input: *mut T, output: *mut T) {
        unsafe { self.inner.execute_r2r(input, output) }
    }
}

/// An engine that allocates normally but never plans: every plan request yields
/// the null handle.
#[derive(Debug, Default)]
pub struct NullEngine {
    allocator: ReferenceEngine,
}

impl NullEngine {
    pub fn new() -> NullEngine {
        NullEngine::default()
    }
}

unsafe impl Allocator for NullEngine {
    fn alignment(&self) -> usize {
        self.allocator.alignment()
    }

    fn allocate(&self, bytes: usize) -> Option<NonNull<u8>> {
        self.allocator.allocate(bytes)
    }

    unsafe fn free(&self, ptr: NonNull<u8>, bytes: usize) {
        unsafe { self.allocator.free(ptr, bytes) }
    }

    fn alignment_of(&self, ptr: *const u8) -> usize {
        self.allocator.alignment_of(ptr)
    }
}

impl<T: Real> Engine<T> for NullEngine {
    unsafe fn plan_dft(
        &self,
        _dims: &[usize],
        _input: *mut T,
        _output: *mut T,
        _sign: Sign,
        _flags: Flags,
    ) -> Option<Box<dyn NativePlan<T>>> {
        None
    }

    unsafe fn plan_split_dft(
        &self,
        _dims: &[usize],
        _real_in: *mut T,
        _imag_in: *mut T,
        _real_out: *mut T,
        _imag_out: *mut T,
        _flags: Flags,
    ) -> Option<Box<dyn NativePlan<T>>> {
        None
    }

    unsafe fn plan_dft_r2c(
        &self,
        _dims: &[usize],
        _input: *mut T,
        _output: *mut T,
        _flags: Flags,
    ) -> Option<Box<dyn NativePlan<T>>> {
        None
    }

    unsafe fn plan_split_dft_r2c(
        &self,
        _dims: &[usize],
        _input: *mut T,
        _real_out: *mut T,
        _imag_out: *mut T,
        _flags: Flags,
    ) -> Option<Box<dyn NativePlan<T>>> {
        None
    }

    unsafe fn plan_dft_c2r(
        &self,
        _dims: &[usize],
        _input: *mut T,
        _output: *mut T,
        _flags: Flags,
    ) -> Option<Box<dyn NativePlan<T>>> {
        None
    }

    unsafe fn plan_split_dft_c2r(
        &self,
        _dims: &[usize],
        _real_in: *mut T,
        _imag_in: *mut T,
        _output: *mut T,
        _flags: Flags,
    ) -> Option<Box<dyn NativePlan<T>>> {
        None
    }

    unsafe fn plan_r2r(
        &self,
        _dims: &[usize],
        _input: *mut T,
        _output: *mut T,
        _kinds: &[R2rKind],
        _flags: Flags,
    ) -> Option<Box<dyn NativePlan<T>>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counting_allocator() {
        let allocator = CountingAllocator::default();
        let stats = allocator.stats();
        let p = allocator.allocate(64).unwrap();
        assert_eq!(stats.outstanding(), 1);
        assert_eq!(stats.outstanding_bytes(), 64);
        unsafe { allocator.free(p, 64) };
        assert_eq!(stats.allocations(), 1);
        assert_eq!(stats.frees(), 1);
        assert_eq!(stats.outstanding_bytes(), 0);
    }

    #[test]
    fn test_allocation_budget() {
        let allocator = CountingAllocator::with_budget(ReferenceEngine::new(), 100);
        let stats = allocator.stats();
        let a = allocator.allocate(64).unwrap();
        assert!(allocator.allocate(64).is_none());
        assert_eq!(stats.failures(), 1);
        let b = allocator.allocate(36).unwrap();
        assert_eq!(stats.outstanding_bytes(), 100);
        unsafe {
            allocator.free(a, 64);
            allocator.free(b, 36);
        }
        assert_eq!(stats.outstanding(), 0);

        let exhausted = CountingAllocator::exhausted(ReferenceEngine::new());
        assert!(exhausted.allocate(1).is_none());
        assert_eq!(exhausted.stats().allocations(), 0);
    }

    #[test]
    fn test_counting_engine_tracks_live_plans() {
        let engine = CountingEngine::default();
        let mut data = vec![0.0f64; 8];
        let p = data.as_mut_ptr();
        let plan = unsafe {
            Engine::<f64>::plan_dft(&engine, &[4], p, p, Sign::FORWARD, Flags::ESTIMATE)
        };
        assert!(plan.is_some());
        assert_eq!(engine.live_plans(), 1);
        drop(plan);
        assert_eq!(engine.live_plans(), 0);
        assert_eq!(engine.plans_created(), 1);
    }

    #[test]
    fn test_null_engine() {
        let engine = NullEngine::new();
        let mut data = vec![0.0f32; 8];
        let p = data.as_mut_ptr();
        let plan = unsafe {
            Engine::<f32>::plan_dft(&engine, &[4], p, p, Sign::FORWARD, Flags::ESTIMATE)
        };
        assert!(plan.is_none());
    }
}
