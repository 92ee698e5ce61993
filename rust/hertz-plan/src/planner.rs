//! Plan factories.
//!
//! Every transform family has three factories:
//! - over caller-supplied buffers (`dft`, `r2r`, ...), which must be at least as long
//!   as the shape requires; the transform is in place when input and output are the
//!   same buffer;
//! - `*_allocated`, which allocates one buffer per slot;
//! - `*_in_place`, which allocates one buffer per in-place input/output pair, long
//!   enough for both sides.
//!
//! Plans created by the allocating factories own their buffers and dispose them
//! with the plan.

use std::sync::Arc;

use hertz_buffer::{Buffer, BufferBinding};
use hertz_common::{Result, error::Error};
use hertz_engine::{Allocator, Engine, Flags, NativePlan, R2rKind, Real, ReferenceEngine, Sign};
use tinyvec::ArrayVec;

use crate::{
    config::PlannerConfig,
    contract::Contract,
    family::{MAX_SLOTS, TransformFamily},
    plan::{Plan, PlanParts},
    shape::{Shape, SlotLengths},
};

/// Creates plans through a transform engine.
pub struct Planner<T: Real> {
    engine: Arc<dyn Engine<T>>,
    allocator: Arc<dyn Allocator>,
    config: PlannerConfig,
}

/// The transform parameters a factory passes to the engine.
struct Request<'a> {
    family: TransformFamily,
    shape: Shape,
    sign: Sign,
    kinds: &'a [R2rKind],
    flags: Flags,
}

impl<'a> Request<'a> {
    fn new(family: TransformFamily, shape: Shape, flags: Flags) -> Request<'a> {
        Request {
            family,
            shape,
            sign: Sign::FORWARD,
            kinds: &[],
            flags,
        }
    }

    fn with_sign(self, sign: Sign) -> Request<'a> {
        Request { sign, ..self }
    }

    fn with_kinds(self, kinds: &'a [R2rKind]) -> Request<'a> {
        Request { kinds, ..self }
    }
}

impl<T: Real> Planner<T> {
    pub fn new<E: Engine<T> + 'static>(engine: Arc<E>) -> Planner<T> {
        Self::with_config(engine, PlannerConfig::default())
    }

    pub fn with_config<E: Engine<T> + 'static>(
        engine: Arc<E>,
        config: PlannerConfig,
    ) -> Planner<T> {
        let allocator: Arc<dyn Allocator> = engine.clone();
        Planner {
            engine,
            allocator,
            config,
        }
    }

    #[inline]
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// The engine's allocator.
    #[inline]
    pub fn allocator(&self) -> &Arc<dyn Allocator> {
        &self.allocator
    }

    /// Allocates a buffer through the engine's allocator.
    pub fn allocate(&self, count: usize) -> Result<Buffer<T>> {
        Buffer::allocate_in(&self.allocator, count)
    }
}

impl<T: Real> Default for Planner<T> {
    fn default() -> Self {
        Planner::new(ReferenceEngine::shared())
    }
}

impl<T: Real> Planner<T> {
    /// Complex-to-complex transform over interleaved buffers of at least
    /// `2 * product(dims)` elements.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `sign` is not [`Sign::FORWARD`] or [`Sign::BACKWARD`],
    /// the shape is invalid, a buffer is too short, or the engine cannot plan the
    /// transform with `flags`.
    pub fn dft(
        &self,
        shape: impl Into<Shape>,
        input: &Buffer<T>,
        output: &Buffer<T>,
        sign: Sign,
        flags: Flags,
    ) -> Result<Plan<T>> {
        let request = Request::new(TransformFamily::Dft, shape.into(), flags).with_sign(sign);
        self.create(request, &[input, output])
    }

    pub fn dft_allocated(
        &self,
        shape: impl Into<Shape>,
        sign: Sign,
        flags: Flags,
    ) -> Result<Plan<T>> {
        let request = Request::new(TransformFamily::Dft, shape.into(), flags).with_sign(sign);
        self.create_owned(request, false)
    }

    pub fn dft_in_place(
        &self,
        shape: impl Into<Shape>,
        sign: Sign,
        flags: Flags,
    ) -> Result<Plan<T>> {
        let request = Request::new(TransformFamily::Dft, shape.into(), flags).with_sign(sign);
        self.create_owned(request, true)
    }

    /// Complex-to-complex transform over split buffers of at least
    /// `product(dims)` elements each.
    ///
    /// Computes the forward transform; pass the imaginary buffers as real and the
    /// real as imaginary for the backward one.
    pub fn split_dft(
        &self,
        shape: impl Into<Shape>,
        real_in: &Buffer<T>,
        imag_in: &Buffer<T>,
        real_out: &Buffer<T>,
        imag_out: &Buffer<T>,
        flags: Flags,
    ) -> Result<Plan<T>> {
        let request = Request::new(TransformFamily::SplitDft, shape.into(), flags);
        self.create(request, &[real_in, imag_in, real_out, imag_out])
    }

    pub fn split_dft_allocated(&self, shape: impl Into<Shape>, flags: Flags) -> Result<Plan<T>> {
        let request = Request::new(TransformFamily::SplitDft, shape.into(), flags);
        self.create_owned(request, false)
    }

    pub fn split_dft_in_place(&self, shape: impl Into<Shape>, flags: Flags) -> Result<Plan<T>> {
        let request = Request::new(TransformFamily::SplitDft, shape.into(), flags);
        self.create_owned(request, true)
    }

    /// Real-to-complex transform: `product(dims)` real inputs, half spectrum of
    /// `2 * product(dims[..rank - 1]) * (dims[rank - 1] / 2 + 1)` elements.
    pub fn dft_r2c(
        &self,
        shape: impl Into<Shape>,
        input: &Buffer<T>,
        output: &Buffer<T>,
        flags: Flags,
    ) -> Result<Plan<T>> {
        let request = Request::new(TransformFamily::DftR2c, shape.into(), flags);
        self.create(request, &[input, output])
    }

    pub fn dft_r2c_allocated(&self, shape: impl Into<Shape>, flags: Flags) -> Result<Plan<T>> {
        let request = Request::new(TransformFamily::DftR2c, shape.into(), flags);
        self.create_owned(request, false)
    }

    pub fn dft_r2c_in_place(&self, shape: impl Into<Shape>, flags: Flags) -> Result<Plan<T>> {
        let request = Request::new(TransformFamily::DftR2c, shape.into(), flags);
        self.create_owned(request, true)
    }

    pub fn split_dft_r2c(
        &self,
        shape: impl Into<Shape>,
        input: &Buffer<T>,
        real_out: &Buffer<T>,
        imag_out: &Buffer<T>,
        flags: Flags,
    ) -> Result<Plan<T>> {
        let request = Request::new(TransformFamily::SplitDftR2c, shape.into(), flags);
        self.create(request, &[input, real_out, imag_out])
    }

    pub fn split_dft_r2c_allocated(
        &self,
        shape: impl Into<Shape>,
        flags: Flags,
    ) -> Result<Plan<T>> {
        let request = Request::new(TransformFamily::SplitDftR2c, shape.into(), flags);
        self.create_owned(request, false)
    }

    pub fn split_dft_r2c_in_place(
        &self,
        shape: impl Into<Shape>,
        flags: Flags,
    ) -> Result<Plan<T>> {
        let request = Request::new(TransformFamily::SplitDftR2c, shape.into(), flags);
        self.create_owned(request, true)
    }

    /// Complex-to-real transform from the half spectrum; the lengths mirror
    /// [`Planner::dft_r2c`].
    pub fn dft_c2r(
        &self,
        shape: impl Into<Shape>,
        input: &Buffer<T>,
        output: &Buffer<T>,
        flags: Flags,
    ) -> Result<Plan<T>> {
        let request = Request::new(TransformFamily::DftC2r, shape.into(), flags);
        self.create(request, &[input, output])
    }

    pub fn dft_c2r_allocated(&self, shape: impl Into<Shape>, flags: Flags) -> Result<Plan<T>> {
        let request = Request::new(TransformFamily::DftC2r, shape.into(), flags);
        self.create_owned(request, false)
    }

    pub fn dft_c2r_in_place(&self, shape: impl Into<Shape>, flags: Flags) -> Result<Plan<T>> {
        let request = Request::new(TransformFamily::DftC2r, shape.into(), flags);
        self.create_owned(request, true)
    }

    pub fn split_dft_c2r(
        &self,
        shape: impl Into<Shape>,
        real_in: &Buffer<T>,
        imag_in: &Buffer<T>,
        output: &Buffer<T>,
        flags: Flags,
    ) -> Result<Plan<T>> {
        let request = Request::new(TransformFamily::SplitDftC2r, shape.into(), flags);
        self.create(request, &[real_in, imag_in, output])
    }

    pub fn split_dft_c2r_allocated(
        &self,
        shape: impl Into<Shape>,
        flags: Flags,
    ) -> Result<Plan<T>> {
        let request = Request::new(TransformFamily::SplitDftC2r, shape.into(), flags);
        self.create_owned(request, false)
    }

    pub fn split_dft_c2r_in_place(
        &self,
        shape: impl Into<Shape>,
        flags: Flags,
    ) -> Result<Plan<T>> {
        let request = Request::new(TransformFamily::SplitDftC2r, shape.into(), flags);
        self.create_owned(request, true)
    }

    /// Real-to-real transform with one kind per axis. Buffers must hold the product
    /// of the per-axis lengths given by [`crate::shape::r2r_axis_len`].
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if the number of kinds differs from the rank, in addition
    /// to the errors of the other factories.
    pub fn r2r(
        &self,
        shape: impl Into<Shape>,
        input: &Buffer<T>,
        output: &Buffer<T>,
        kinds: &[R2rKind],
        flags: Flags,
    ) -> Result<Plan<T>> {
        let request = Request::new(TransformFamily::R2r, shape.into(), flags).with_kinds(kinds);
        self.create(request, &[input, output])
    }

    pub fn r2r_allocated(
        &self,
        shape: impl Into<Shape>,
        kinds: &[R2rKind],
        flags: Flags,
    ) -> Result<Plan<T>> {
        let request = Request::new(TransformFamily::R2r, shape.into(), flags).with_kinds(kinds);
        self.create_owned(request, false)
    }

    pub fn r2r_in_place(
        &self,
        shape: impl Into<Shape>,
        kinds: &[R2rKind],
        flags: Flags,
    ) -> Result<Plan<T>> {
        let request = Request::new(TransformFamily::R2r, shape.into(), flags).with_kinds(kinds);
        self.create_owned(request, true)
    }
}

impl<T: Real> Planner<T> {
    fn validate(&self, request: &Request) -> Result<SlotLengths> {
        if request.family == TransformFamily::Dft && !request.sign.is_defined() {
            return Err(Error::invalid_arg(
                "sign",
                format!("{} is neither FORWARD (-1) nor BACKWARD (1)", request.sign.value()),
            ));
        }
        SlotLengths::for_family(request.family, &request.shape, request.kinds)
    }

    fn create(&self, request: Request, buffers: &[&Buffer<T>]) -> Result<Plan<T>> {
        let lengths = self.validate(&request)?;
        let names = request.family.slot_names();
        for (slot, buffer) in buffers.iter().enumerate() {
            let min = lengths.as_slice()[slot];
            if buffer.len() < min {
                return Err(Error::invalid_arg(
                    names[slot],
                    format!("length {} is less than the required {min}", buffer.len()),
                ));
            }
        }
        let (native, bindings, contract) = self.plan_native(&request, &lengths, buffers)?;
        Ok(self.assemble(request, contract, native, bindings, Vec::new(), ArrayVec::new()))
    }

    fn create_owned(&self, request: Request, in_place: bool) -> Result<Plan<T>> {
        let lengths = self.validate(&request)?;
        let family = request.family;

        let mut slot_owner = ArrayVec::<[usize; MAX_SLOTS]>::new();
        let mut owner_len = ArrayVec::<[usize; MAX_SLOTS]>::new();
        for slot in 0..family.slot_count() {
            let shared = in_place
                .then(|| family.in_place_pairs().iter().find(|&&(_, b)| b == slot))
                .flatten();
            match shared {
                Some(&(a, _)) => {
                    let index = slot_owner[a];
                    owner_len[index] = lengths.shared(a, slot);
                    slot_owner.push(index);
                }
                None => {
                    slot_owner.push(owner_len.len());
                    owner_len.push(lengths.as_slice()[slot]);
                }
            }
        }

        let owned = owner_len
            .iter()
            .map(|&len| Buffer::allocate_in(&self.allocator, len))
            .collect::<Result<Vec<_>>>()?;
        let buffers: Vec<&Buffer<T>> = slot_owner.iter().map(|&index| &owned[index]).collect();
        let (native, bindings, contract) = self.plan_native(&request, &lengths, &buffers)?;
        Ok(self.assemble(request, contract, native, bindings, owned, slot_owner))
    }

    /// Binds the buffers and obtains the native plan. On failure every binding is
    /// dropped again, so no plan reference is left on any buffer.
    fn plan_native(
        &self,
        request: &Request,
        lengths: &SlotLengths,
        buffers: &[&Buffer<T>],
    ) -> Result<(Box<dyn NativePlan<T>>, Vec<BufferBinding<T>>, Contract)> {
        debug_assert_eq!(buffers.len(), request.family.slot_count());
        let bindings = buffers
            .iter()
            .map(|buffer| buffer.bind())
            .collect::<Result<Vec<_>>>()?;
        let p: Vec<*mut T> = bindings.iter().map(|b| b.as_mut_ptr()).collect();
        let dims = request.shape.dims();
        let flags = request.flags;

        let native = unsafe {
            match request.family {
                TransformFamily::Dft => self.engine.plan_dft(dims, p[0], p[1], request.sign, flags),
                TransformFamily::SplitDft => {
                    self.engine.plan_split_dft(dims, p[0], p[1], p[2], p[3], flags)
                }
                TransformFamily::DftR2c => self.engine.plan_dft_r2c(dims, p[0], p[1], flags),
                TransformFamily::SplitDftR2c => {
                    self.engine.plan_split_dft_r2c(dims, p[0], p[1], p[2], flags)
                }
                TransformFamily::DftC2r => self.engine.plan_dft_c2r(dims, p[0], p[1], flags),
                TransformFamily::SplitDftC2r => {
                    self.engine.plan_split_dft_c2r(dims, p[0], p[1], p[2], flags)
                }
                TransformFamily::R2r => {
                    self.engine.plan_r2r(dims, p[0], p[1], request.kinds, flags)
                }
            }
        };
        let native = native.ok_or_else(|| {
            Error::invalid_arg(
                "flags",
                format!(
                    "engine returned a null {} plan for {dims:?} with flags {:#x}",
                    request.family,
                    flags.bits()
                ),
            )
        })?;

        let contract = Contract::record(
            request.family,
            *lengths,
            buffers,
            flags.requires_alignment(),
            self.config.verify_alignment_class,
            self.allocator.as_ref(),
        );
        Ok((native, bindings, contract))
    }

    fn assemble(
        &self,
        request: Request,
        contract: Contract,
        native: Box<dyn NativePlan<T>>,
        bindings: Vec<BufferBinding<T>>,
        owned: Vec<Buffer<T>>,
        slot_owner: ArrayVec<[usize; MAX_SLOTS]>,
    ) -> Plan<T> {
        log::debug!(
            "created {} plan {:?}: in_place={}, aligned={}, owned={}",
            request.family,
            request.shape.dims(),
            contract.is_in_place(),
            contract.requires_alignment(),
            !owned.is_empty()
        );
        Plan::from_parts(PlanParts {
            family: request.family,
            shape: request.shape,
            flags: request.flags,
            contract,
            allocator: self.allocator.clone(),
            native,
            bindings,
            owned,
            slot_owner,
        })
    }
}
