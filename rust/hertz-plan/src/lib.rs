//! Precomputed transform plans bound to reference-counted buffers.
//!
//! A [`Planner`] derives the buffer lengths a transform requires from its shape
//! ([`shape`]), validates or allocates the buffers, obtains a native plan from the
//! engine and binds the buffers to it. The resulting [`Plan`] records the
//! constraints new-array execution must preserve: per-slot minimum lengths, the
//! in-place topology, and the alignment of the original buffers.
//!
//! # Modules
//!
//! - [`shape`]: Required buffer lengths per transform family
//! - [`family`]: Transform families and their buffer slots
//! - [`planner`]: Plan factories
//! - [`plan`]: Execution and disposal

pub mod config;
mod contract;
pub mod family;
pub mod plan;
pub mod planner;
pub mod shape;

pub use config::PlannerConfig;
pub use family::TransformFamily;
pub use plan::Plan;
pub use planner::Planner;
pub use shape::{Shape, SlotLengths};
