//! Reference-counted handles to the numeric memory transform plans operate on.
//!
//! A [`Buffer`] is a root (engine-allocated, pinned, or foreign memory) or a
//! zero-copy slice of a root. Roots, slices and the plans bound to either share one
//! lifetime record; the memory is released exactly once, when the root has been
//! disposed and no slice or plan references it anymore.

pub mod binding;
pub mod buffer;
mod root;

pub use binding::BufferBinding;
pub use buffer::Buffer;
pub use root::Ownership;
