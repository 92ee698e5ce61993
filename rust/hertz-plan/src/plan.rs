use std::{
    fmt,
    sync::{
        Arc, PoisonError, RwLock,
        atomic::{AtomicBool, Ordering},
    },
};

use hertz_buffer::{Buffer, BufferBinding};
use hertz_common::{Result, error::Error};
use hertz_engine::{Allocator, Flags, NativePlan, Real};
use tinyvec::ArrayVec;

use crate::{
    contract::Contract,
    family::{MAX_SLOTS, TransformFamily},
    shape::Shape,
};

/// A precomputed transform bound to its buffers.
///
/// A plan is created by a [`crate::Planner`] factory for one transform family and
/// shape. It keeps every bound buffer's memory alive until it is disposed.
/// [`Plan::execute`] runs the transform over the bound buffers; the new-array
/// execute methods (`execute_dft`, `execute_r2r`, ...) run it over substitute
/// buffers that satisfy the constraints recorded at construction.
///
/// Execution blocks the calling thread. A plan may be executed concurrently from
/// several threads; keeping those executions from writing overlapping memory is
/// the caller's responsibility.
pub struct Plan<T: Real> {
    family: TransformFamily,
    shape: Shape,
    flags: Flags,
    contract: Contract,
    allocator: Arc<dyn Allocator>,
    owned: Vec<Buffer<T>>,
    /// Index into `owned` of every slot, for plans that own their buffers.
    slot_owner: ArrayVec<[usize; MAX_SLOTS]>,
    state: RwLock<Option<PlanState<T>>>,
    disposed: AtomicBool,
}

struct PlanState<T: Real> {
    native: Box<dyn NativePlan<T>>,
    bindings: Vec<BufferBinding<T>>,
}

pub(crate) struct PlanParts<T: Real> {
    pub(crate) family: TransformFamily,
    pub(crate) shape: Shape,
    pub(crate) flags: Flags,
    pub(crate) contract: Contract,
    pub(crate) allocator: Arc<dyn Allocator>,
    pub(crate) native: Box<dyn NativePlan<T>>,
    pub(crate) bindings: Vec<BufferBinding<T>>,
    pub(crate) owned: Vec<Buffer<T>>,
    pub(crate) slot_owner: ArrayVec<[usize; MAX_SLOTS]>,
}

impl<T: Real> Plan<T> {
    pub(crate) fn from_parts(parts: PlanParts<T>) -> Plan<T> {
        Plan {
            family: parts.family,
            shape: parts.shape,
            flags: parts.flags,
            contract: parts.contract,
            allocator: parts.allocator,
            owned: parts.owned,
            slot_owner: parts.slot_owner,
            state: RwLock::new(Some(PlanState {
                native: parts.native,
                bindings: parts.bindings,
            })),
            disposed: AtomicBool::new(false),
        }
    }

    /// Executes the transform over the bound buffers.
    ///
    /// Performs no validation besides rejecting a disposed plan.
    pub fn execute(&self) -> Result<()> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let state = state.as_ref().ok_or_else(|| self.disposed_error("execute"))?;
        unsafe { state.native.execute() };
        Ok(())
    }

    /// Executes a complex-to-complex plan over substitute interleaved buffers.
    pub fn execute_dft(&self, input: &Buffer<T>, output: &Buffer<T>) -> Result<()> {
        self.execute_with(TransformFamily::Dft, &[input, output], |native, p| unsafe {
            native.execute_dft(p[0], p[1])
        })
    }

    /// Executes a split complex-to-complex plan over substitute buffers.
    pub fn execute_split_dft(
        &self,
        real_in: &Buffer<T>,
        imag_in: &Buffer<T>,
        real_out: &Buffer<T>,
        imag_out: &Buffer<T>,
    ) -> Result<()> {
        self.execute_with(
            TransformFamily::SplitDft,
            &[real_in, imag_in, real_out, imag_out],
            |native, p| unsafe { native.execute_split_dft(p[0], p[1], p[2], p[3]) },
        )
    }

    /// Executes a real-to-complex plan over substitute buffers.
    pub fn execute_dft_r2c(&self, input: &Buffer<T>, output: &Buffer<T>) -> Result<()> {
        self.execute_with(TransformFamily::DftR2c, &[input, output], |native, p| unsafe {
            native.execute_dft_r2c(p[0], p[1])
        })
    }

    /// Executes a split real-to-complex plan over substitute buffers.
    pub fn execute_split_dft_r2c(
        &self,
        input: &Buffer<T>,
        real_out: &Buffer<T>,
        imag_out: &Buffer<T>,
    ) -> Result<()> {
        self.execute_with(
            TransformFamily::SplitDftR2c,
            &[input, real_out, imag_out],
            |native, p| unsafe { native.execute_split_dft_r2c(p[0], p[1], p[2]) },
        )
    }

    /// Executes a complex-to-real plan over substitute buffers.
    pub fn execute_dft_c2r(&self, input: &Buffer<T>, output: &Buffer<T>) -> Result<()> {
        self.execute_with(TransformFamily::DftC2r, &[input, output], |native, p| unsafe {
            native.execute_dft_c2r(p[0], p[1])
        })
    }

    /// Executes a split complex-to-real plan over substitute buffers.
    pub fn execute_split_dft_c2r(
        &self,
        real_in: &Buffer<T>,
        imag_in: &Buffer<T>,
        output: &Buffer<T>,
    ) -> Result<()> {
        self.execute_with(
            TransformFamily::SplitDftC2r,
            &[real_in, imag_in, output],
            |native, p| unsafe { native.execute_split_dft_c2r(p[0], p[1], p[2]) },
        )
    }

    /// Executes a real-to-real plan over substitute buffers.
    pub fn execute_r2r(&self, input: &Buffer<T>, output: &Buffer<T>) -> Result<()> {
        self.execute_with(TransformFamily::R2r, &[input, output], |native, p| unsafe {
            native.execute_r2r(p[0], p[1])
        })
    }

    /// Disposes the plan: destroys the native plan, releases the bound buffers and
    /// disposes the buffers the plan owns.
    ///
    /// Idempotent and safe to call concurrently. Waits for executions in flight.
    /// Never fails.
    pub fn dispose(&self) {
        if self
            .disposed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }
        let state = self
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(PlanState { native, bindings }) = state {
            drop(native);
            drop(bindings);
        }
        for buffer in &self.owned {
            buffer.dispose();
        }
        log::debug!("disposed {} plan {:?}", self.family, self.shape.dims());
    }

    #[inline]
    pub fn family(&self) -> TransformFamily {
        self.family
    }

    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    #[inline]
    pub fn dims(&self) -> &[usize] {
        self.shape.dims()
    }

    #[inline]
    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// `true` if the plan was created with its input and output sharing one buffer.
    #[inline]
    pub fn is_in_place(&self) -> bool {
        self.contract.is_in_place()
    }

    /// `true` unless the plan was created with [`Flags::UNALIGNED`].
    #[inline]
    pub fn requires_alignment(&self) -> bool {
        self.contract.requires_alignment()
    }

    /// `true` if the factory allocated the buffers; the plan disposes them.
    #[inline]
    pub fn owns_buffers(&self) -> bool {
        !self.owned.is_empty()
    }

    /// The minimum length of the buffer in `slot`, in elements.
    #[inline]
    pub fn min_length(&self, slot: usize) -> Option<usize> {
        self.contract.lengths().get(slot)
    }

    /// The buffer a plan that owns its buffers bound to `slot`. `None` for plans
    /// over caller-supplied buffers.
    pub fn owned_buffer(&self, slot: usize) -> Option<&Buffer<T>> {
        self.slot_owner
            .get(slot)
            .and_then(|&index| self.owned.get(index))
    }

    /// The owned buffer in the first input slot.
    #[inline]
    pub fn input(&self) -> Option<&Buffer<T>> {
        self.owned_buffer(0)
    }

    /// The owned buffer in the primary output slot.
    #[inline]
    pub fn output(&self) -> Option<&Buffer<T>> {
        self.owned_buffer(self.family.output_slot())
    }

    #[inline]
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}

impl<T: Real> Plan<T> {
    fn execute_with<F>(&self, family: TransformFamily, buffers: &[&Buffer<T>], run: F) -> Result<()>
    where
        F: FnOnce(&dyn NativePlan<T>, &[*mut T]),
    {
        if family != self.family {
            return Err(Error::invalid_operation(format!(
                "{} called on a {} plan, use {}",
                family.execute_method(),
                self.family,
                self.family.execute_method()
            )));
        }
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let state = state
            .as_ref()
            .ok_or_else(|| self.disposed_error(family.execute_method()))?;

        self.contract.check(buffers, self.allocator.as_ref())?;

        let pins = buffers
            .iter()
            .map(|buffer| buffer.bind())
            .collect::<Result<Vec<_>>>()?;
        let mut ptrs = [std::ptr::null_mut(); MAX_SLOTS];
        for (ptr, pin) in ptrs.iter_mut().zip(&pins) {
            *ptr = pin.as_mut_ptr();
        }
        run(state.native.as_ref(), &ptrs[..pins.len()]);
        Ok(())
    }

    fn disposed_error(&self, operation: &str) -> Error {
        Error::invalid_operation(format!("{operation} on a disposed {} plan", self.family))
    }
}

impl<T: Real> Drop for Plan<T> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<T: Real> fmt::Debug for Plan<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plan")
            .field("family", &self.family)
            .field("dims", &self.shape.dims())
            .field("flags", &self.flags)
            .field("in_place", &self.is_in_place())
            .field("owns_buffers", &self.owns_buffers())
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}
