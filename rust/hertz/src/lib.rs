//! # Hertz: buffers and precomputed plans for frequency-domain transforms
//!
//! Hertz wraps a transform engine (a native FFT library, or the bundled pure-Rust
//! reference engine) behind two safe abstractions:
//!
//! * [`Buffer`] - a handle to numeric memory that is allocated by the engine,
//!   pinned by an owner, borrowed from the caller, or a zero-copy slice of another
//!   buffer. Memory is released exactly once, after the root handle was disposed
//!   and no slice or plan references it anymore.
//! * [`Plan`] - a transform precomputed for one shape and bound to its buffers.
//!   Plans execute over the bound buffers or over substitute buffers that keep the
//!   lengths, in-place topology and alignment of the originals.
//!
//! ## Example
//!
//! ```
//! use hertz::{Flags, Planner, Sign};
//!
//! let planner = Planner::<f64>::default();
//! let plan = planner.dft_in_place(4, Sign::FORWARD, Flags::ESTIMATE)?;
//! let data = plan.input().expect("owned buffer");
//! data.copy_from_slice(0, &[1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0])?;
//! plan.execute()?;
//! // An impulse transforms to a constant spectrum.
//! let spectrum = data.to_vec()?;
//! assert!(spectrum.chunks(2).all(|c| (c[0] - 1.0).abs() < 1e-12 && c[1].abs() < 1e-12));
//! # Ok::<(), hertz::common::error::Error>(())
//! ```
//!
//! ## Module Organization
//!
//! * [`buffer`] - Buffers, slices and plan bindings
//! * [`plan`] - Shape arithmetic, plan factories and execution
//! * [`engine`] - The engine contract and the reference engine
//! * [`common`] - Error types shared by all crates

pub use hertz_buffer as buffer;
pub use hertz_common as common;
pub use hertz_engine as engine;
pub use hertz_plan as plan;

pub use hertz_buffer::{Buffer, Ownership};
pub use hertz_common::{Result, error::Error};
pub use hertz_engine::{Flags, R2rKind, Real, Sign};
pub use hertz_plan::{Plan, Planner, PlannerConfig, TransformFamily};

pub mod support {
    pub use hertz_common_traits as common_traits;
}
