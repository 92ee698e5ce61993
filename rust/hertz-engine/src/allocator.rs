//! `Allocator`: the engine's own memory allocator.

use std::ptr::NonNull;

/// The memory allocator of a transform engine.
///
/// Memory obtained through `allocate` satisfies the alignment the engine's
/// vectorized code paths expect. Plans created over such memory may assume that
/// alignment; memory from any other source carries no such guarantee.
///
/// # Safety
///
/// Implementors must guarantee that:
/// - A non-null pointer returned by `allocate(bytes)` addresses at least `bytes`
///   writable bytes, aligned to `alignment()`, that remain valid until passed to
///   `free` with the same byte count.
/// - `alignment()` is a power of two and never changes.
/// - `alignment_of` is a pure function of the address.
pub unsafe trait Allocator: Send + Sync {
    /// The alignment, in bytes, of every block returned by `allocate`.
    fn alignment(&self) -> usize;

    /// Allocates `bytes` bytes. Returns `None` if the request cannot be satisfied.
    fn allocate(&self, bytes: usize) -> Option<NonNull<u8>>;

    /// Releases a block obtained from `allocate`.
    ///
    /// # Safety
    ///
    /// `ptr` must come from `allocate(bytes)` on this allocator, with the same
    /// `bytes`, and must not be used after this call.
    unsafe fn free(&self, ptr: NonNull<u8>, bytes: usize);

    /// Returns the alignment class of an address.
    ///
    /// Two arrays with the same alignment class may be substituted for one another
    /// when executing a plan that was created without [`Flags::UNALIGNED`].
    ///
    /// [`Flags::UNALIGNED`]: crate::Flags::UNALIGNED
    fn alignment_of(&self, ptr: *const u8) -> usize;
}
