//! The contract of the external transform engine, and a pure-Rust reference
//! implementation of it.
//!
//! The engine is treated as a black box by the buffer and plan layers: it hands out
//! aligned memory, creates opaque native plans over raw array addresses, and executes
//! them. Everything it consumes besides addresses (shape, [`Sign`], [`R2rKind`],
//! [`Flags`]) is passed through without interpretation, except for
//! [`Flags::UNALIGNED`].

use std::sync::Arc;

pub mod allocator;
pub mod engine;
pub mod flags;
pub mod kind;
pub mod reference;

pub use allocator::Allocator;
pub use engine::{Engine, NativePlan};
pub use flags::{Flags, Sign};
pub use kind::R2rKind;
pub use reference::ReferenceEngine;

/// Element types the engine can transform.
///
/// Complex data is always laid out as interleaved `(re, im)` pairs of `Real`
/// values, or as separate real and imaginary arrays for the split forms.
pub trait Real: rustfft::FftNum + bytemuck::Pod + Default + PartialOrd {
    /// Converts from `f64`, rounding if the type is narrower.
    fn cast_f64(v: f64) -> Self;

    /// Widens to `f64`.
    fn as_f64(self) -> f64;
}

impl Real for f32 {
    #[inline]
    fn cast_f64(v: f64) -> Self {
        v as f32
    }

    #[inline]
    fn as_f64(self) -> f64 {
        self as f64
    }
}

impl Real for f64 {
    #[inline]
    fn cast_f64(v: f64) -> Self {
        v
    }

    #[inline]
    fn as_f64(self) -> f64 {
        self
    }
}

/// Returns the allocator of the process-wide reference engine.
pub fn default_allocator() -> Arc<dyn Allocator> {
    ReferenceEngine::shared()
}
