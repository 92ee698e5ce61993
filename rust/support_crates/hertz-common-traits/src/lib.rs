//! Traits shared across the hertz crates.
//!
//! # Modules
//!
//! - [`memory_owner`]: Trait for types that keep a block of memory pinned at a
//!   fixed address for as long as they live

pub mod memory_owner;
