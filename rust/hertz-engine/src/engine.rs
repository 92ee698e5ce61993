//! `Engine` and `NativePlan`: plan creation and execution.

use crate::{Allocator, Flags, R2rKind, Real, Sign};

/// A transform engine: plan creation over raw array addresses.
///
/// There is one plan-creation function per transform family. Each receives the
/// transform shape (row-major, rank = `dims.len()`), the array addresses, the sign
/// or per-axis kinds, and the planning flags, and returns an opaque native plan.
/// `None` is the engine's null handle: the request could not be planned, commonly
/// because of an incompatible flag combination.
///
/// The lengths the arrays must have are the caller's concern; the engine reads and
/// writes only what the shape implies.
///
/// # Safety
///
/// For every `plan_*` function, each array address must be valid for reads and
/// writes of the length the shape implies for its slot. Planning may overwrite the
/// arrays unless [`Flags::ESTIMATE`] or [`Flags::WISDOM_ONLY`] is set.
pub trait Engine<T: Real>: Allocator {
    /// Complex-to-complex transform over interleaved arrays.
    ///
    /// # Safety
    ///
    /// See the trait documentation.
    unsafe fn plan_dft(
        &self,
        dims: &[usize],
        input: *mut T,
        output: *mut T,
        sign: Sign,
        flags: Flags,
    ) -> Option<Box<dyn NativePlan<T>>>;

    /// Complex-to-complex transform over split real/imaginary arrays.
    ///
    /// Always computes the forward transform; swapping the real and imaginary
    /// arrays of both input and output yields the backward one.
    ///
    /// # Safety
    ///
    /// See the trait documentation.
    unsafe fn plan_split_dft(
        &self,
        dims: &[usize],
        real_in: *mut T,
        imag_in: *mut T,
        real_out: *mut T,
        imag_out: *mut T,
        flags: Flags,
    ) -> Option<Box<dyn NativePlan<T>>>;

    /// Real-to-complex forward transform producing the interleaved half spectrum.
    ///
    /// # Safety
    ///
    /// See the trait documentation.
    unsafe fn plan_dft_r2c(
        &self,
        dims: &[usize],
        input: *mut T,
        output: *mut T,
        flags: Flags,
    ) -> Option<Box<dyn NativePlan<T>>>;

    /// Real-to-complex forward transform producing a split half spectrum.
    ///
    /// # Safety
    ///
    /// See the trait documentation.
    unsafe fn plan_split_dft_r2c(
        &self,
        dims: &[usize],
        input: *mut T,
        real_out: *mut T,
        imag_out: *mut T,
        flags: Flags,
    ) -> Option<Box<dyn NativePlan<T>>>;

    /// Complex-to-real backward transform from the interleaved half spectrum.
    ///
    /// # Safety
    ///
    /// See the trait documentation.
    unsafe fn plan_dft_c2r(
        &self,
        dims: &[usize],
        input: *mut T,
        output: *mut T,
        flags: Flags,
    ) -> Option<Box<dyn NativePlan<T>>>;

    /// Complex-to-real backward transform from a split half spectrum.
    ///
    /// # Safety
    ///
    /// See the trait documentation.
    unsafe fn plan_split_dft_c2r(
        &self,
        dims: &[usize],
        real_in: *mut T,
        imag_in: *mut T,
        output: *mut T,
        flags: Flags,
    ) -> Option<Box<dyn NativePlan<T>>>;

    /// Real-to-real transform with one kind per axis.
    ///
    /// # Safety
    ///
    /// See the trait documentation.
    unsafe fn plan_r2r(
        &self,
        dims: &[usize],
        input: *mut T,
        output: *mut T,
        kinds: &[R2rKind],
        flags: Flags,
    ) -> Option<Box<dyn NativePlan<T>>>;
}

/// An opaque, precomputed native plan. Dropping it destroys the plan.
///
/// `execute` runs over the arrays the plan was created with. The `execute_*`
/// functions run the plan over substitute arrays; each must only be called on a plan
/// of the matching family, and the substitutes must have the lengths, aliasing and
/// (unless the plan was created with [`Flags::UNALIGNED`]) the alignment classes of
/// the original arrays. The engine does not check any of this.
///
/// All execution is blocking. Implementations must tolerate concurrent execution of
/// the same plan over disjoint arrays.
pub trait NativePlan<T: Real>: Send + Sync {
    /// Executes over the arrays bound at creation.
    ///
    /// # Safety
    ///
    /// The bound arrays must still be valid.
    unsafe fn execute(&self);

    /// # Safety
    ///
    /// See the trait documentation.
    unsafe fn execute_dft(&self, input: *mut T, output: *mut T);

    /// # Safety
    ///
    /// See the trait documentation.
    unsafe fn execute_split_dft(
        &self,
        real_in: *mut T,
        imag_in: *mut T,
        real_out: *mut T,
        imag_out: *mut T,
    );

    /// # Safety
    ///
    /// See the trait documentation.
    unsafe fn execute_dft_r2c(&self, input: *mut T, output: *mut T);

    /// # Safety
    ///
    /// See the trait documentation.
    unsafe fn execute_split_dft_r2c(&self, input: *mut T, real_out: *mut T, imag_out: *mut T);

    /// # Safety
    ///
    /// See the trait documentation.
    unsafe fn execute_dft_c2r(&self, input: *mut T, output: *mut T);

    /// # Safety
    ///
    /// See the trait documentation.
    unsafe fn execute_split_dft_c2r(&self, real_in: *mut T, imag_in: *mut T, output: *mut T);

    /// # Safety
    ///
    /// See the trait documentation.
    unsafe fn execute_r2r(&self, input: *mut T, output: *mut T);
}
