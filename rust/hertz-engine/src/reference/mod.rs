//! A pure-Rust engine implementing the native engine contract.
//!
//! Complex transforms are computed axis by axis with `rustfft` kernels planned when
//! the native plan is created. Real-to-real transforms are computed from the
//! definition of each kind. The reference engine accumulates no wisdom, so any
//! request with [`Flags::WISDOM_ONLY`] yields the null handle.

use std::{
    alloc::Layout as AllocLayout,
    ptr::NonNull,
    sync::{Arc, OnceLock},
};

use rustfft::{Fft, FftDirection, FftPlanner};

use crate::{Allocator, Engine, Flags, NativePlan, R2rKind, Real, Sign};

mod lines;
mod plan;
mod r2r;

use plan::{Layout, ReferencePlan};

/// The reference transform engine.
#[derive(Debug, Default)]
pub struct ReferenceEngine {
    _private: (),
}

impl ReferenceEngine {
    /// Alignment of every block returned by [`Allocator::allocate`].
    pub const ALIGNMENT: usize = 64;

    /// Granularity of [`Allocator::alignment_of`]: the widest SIMD load the
    /// kernels assume.
    pub const SIMD_ALIGNMENT: usize = 16;

    pub fn new() -> ReferenceEngine {
        ReferenceEngine { _private: () }
    }

    /// Returns the process-wide engine instance.
    pub fn shared() -> Arc<ReferenceEngine> {
        static SHARED: OnceLock<Arc<ReferenceEngine>> = OnceLock::new();
        SHARED.get_or_init(|| Arc::new(ReferenceEngine::new())).clone()
    }

    fn admits(dims: &[usize], flags: Flags) -> bool {
        if flags.contains(Flags::WISDOM_ONLY) {
            log::debug!("reference engine has no wisdom for {dims:?}");
            return false;
        }
        !dims.is_empty() && dims.iter().all(|&d| d != 0)
    }

    fn axes<T: Real>(dims: &[usize], direction: FftDirection) -> Vec<Arc<dyn Fft<T>>> {
        let mut planner = FftPlanner::<T>::new();
        dims.iter()
            .map(|&n| planner.plan_fft(n, direction))
            .collect()
    }

    fn complex_plan<T: Real>(
        layout: Layout,
        dims: &[usize],
        direction: FftDirection,
        arrays: &[*mut T],
        flags: Flags,
    ) -> Option<Box<dyn NativePlan<T>>> {
        if !Self::admits(dims, flags) {
            return None;
        }
        let axes = Self::axes::<T>(dims, direction);
        Some(Box::new(ReferencePlan::new(layout, dims, axes, &[], arrays)))
    }
}

unsafe impl Allocator for ReferenceEngine {
    fn alignment(&self) -> usize {
        Self::ALIGNMENT
    }

    fn allocate(&self, bytes: usize) -> Option<NonNull<u8>> {
        if bytes == 0 {
            return None;
        }
        let layout = AllocLayout::from_size_align(bytes, Self::ALIGNMENT).ok()?;
        NonNull::new(unsafe { std::alloc::alloc_zeroed(layout) })
    }

    unsafe fn free(&self, ptr: NonNull<u8>, bytes: usize) {
        if let Ok(layout) = AllocLayout::from_size_align(bytes, Self::ALIGNMENT) {
            unsafe { std::alloc::dealloc(ptr.as_ptr(), layout) };
        }
    }

    fn alignment_of(&self, ptr: *const u8) -> usize {
        (ptr as usize) % Self::SIMD_ALIGNMENT
    }
}

impl<T: Real> Engine<T> for ReferenceEngine {
    unsafe fn plan_dft(
        &self,
        dims: &[usize],
        input: *mut T,
        output: *mut T,
        sign: Sign,
        flags: Flags,
    ) -> Option<Box<dyn NativePlan<T>>> {
        let direction = match sign {
            Sign::FORWARD => FftDirection::Forward,
            Sign::BACKWARD => FftDirection::Inverse,
            _ => return None,
        };
        Self::complex_plan(Layout::Dft, dims, direction, &[input, output], flags)
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
        Self::complex_plan(
            Layout::SplitDft,
            dims,
            FftDirection::Forward,
            &[real_in, imag_in, real_out, imag_out],
            flags,
        )
    }

    unsafe fn plan_dft_r2c(
        &self,
        dims: &[usize],
        input: *mut T,
        output: *mut T,
        flags: Flags,
    ) -> Option<Box<dyn NativePlan<T>>> {
        Self::complex_plan(
            Layout::DftR2c,
            dims,
            FftDirection::Forward,
            &[input, output],
            flags,
        )
    }

    unsafe fn plan_split_dft_r2c(
        &self,
        dims: &[usize],
        input: *mut T,
        real_out: *mut T,
        imag_out: *mut T,
        flags: Flags,
    ) -> Option<Box<dyn NativePlan<T>>> {
        Self::complex_plan(
            Layout::SplitDftR2c,
            dims,
            FftDirection::Forward,
            &[input, real_out, imag_out],
            flags,
        )
    }

    unsafe fn plan_dft_c2r(
        &self,
        dims: &[usize],
        input: *mut T,
        output: *mut T,
        flags: Flags,
    ) -> Option<Box<dyn NativePlan<T>>> {
        Self::complex_plan(
            Layout::DftC2r,
            dims,
            FftDirection::Inverse,
            &[input, output],
            flags,
        )
    }

    unsafe fn plan_split_dft_c2r(
        &self,
        dims: &[usize],
        real_in: *mut T,
        imag_in: *mut T,
        output: *mut T,
        flags: Flags,
    ) -> Option<Box<dyn NativePlan<T>>> {
        Self::complex_plan(
            Layout::SplitDftC2r,
            dims,
            FftDirection::Inverse,
            &[real_in, imag_in, output],
            flags,
        )
    }

    unsafe fn plan_r2r(
        &self,
        dims: &[usize],
        input: *mut T,
        output: *mut T,
        kinds: &[R2rKind],
        flags: Flags,
    ) -> Option<Box<dyn NativePlan<T>>> {
        if !Self::admits(dims, flags) || kinds.len() != dims.len() {
            return None;
        }
        Some(Box::new(ReferencePlan::new(
            Layout::R2r,
            dims,
            Vec::new(),
            kinds,
            &[input, output],
        )))
    }
}
