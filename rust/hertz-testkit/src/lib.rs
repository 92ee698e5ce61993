//! Test utilities for the hertz crates.
//!
//! This crate provides:
//! - Engine and allocator doubles that count what passes through them
//! - Deterministic data generators and tolerance checks
//!
//! It is intended for the test suites of the workspace only.

pub mod data_gen;
pub mod engines;
