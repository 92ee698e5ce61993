use std::{
    fmt,
    ptr::NonNull,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use hertz_common::{Result, error::Error, verify_arg};
use hertz_common_traits::memory_owner::MemoryOwner;
use hertz_engine::{Allocator, Real};

use crate::{
    binding::BufferBinding,
    root::{Memory, Ownership, Root},
};

/// A handle to a contiguous block of numeric memory used by transform plans.
///
/// A `Buffer` is either a root, which holds memory directly (allocated through the
/// engine, pinned by an owner object, or foreign), or a slice: a zero-copy view into
/// the memory of a root. Slices of slices refer to the ultimate root.
///
/// The memory of a root stays valid while any slice or plan references it. Disposing
/// the root handle, explicitly with [`Buffer::dispose`] or by dropping it, requests the
/// release; the release happens once the outstanding slices and plans are gone.
///
/// # Shared memory
///
/// Slices alias the root's memory and plans read and write it during execution. The
/// buffer serializes only its lifetime bookkeeping, never access to the data; callers
/// must not execute plans over memory they are concurrently reading or writing.
pub struct Buffer<T: Real> {
    ptr: NonNull<T>,
    len: usize,
    root: Arc<Root<T>>,
    is_slice: bool,
    disposed: AtomicBool,
}

// SAFETY: the memory is kept alive by `root`; data access goes through raw copies
// under the shared-memory policy documented on `Buffer`.
unsafe impl<T: Real> Send for Buffer<T> {}

unsafe impl<T: Real> Sync for Buffer<T> {}

impl<T: Real> Buffer<T> {
    /// Allocates a buffer of `count` zeroed elements through the default engine's
    /// allocator.
    pub fn allocate(count: usize) -> Result<Buffer<T>> {
        Self::allocate_in(&hertz_engine::default_allocator(), count)
    }

    /// Allocates a buffer of `count` elements through `allocator`.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if `count` is zero
    /// - `Overflow` if the byte size does not fit the address space
    /// - `OutOfMemory` if the allocator cannot satisfy the request
    pub fn allocate_in(allocator: &Arc<dyn Allocator>, count: usize) -> Result<Buffer<T>> {
        verify_arg!(count, count >= 1);
        let bytes = count
            .checked_mul(std::mem::size_of::<T>())
            .filter(|&bytes| bytes <= isize::MAX as usize)
            .ok_or_else(|| Error::overflow(format!("byte size of {count} elements")))?;

        let raw = allocator
            .allocate(bytes)
            .ok_or_else(|| Error::out_of_memory(bytes))?;
        if !is_aligned(raw.as_ptr(), std::mem::align_of::<T>()) {
            unsafe { allocator.free(raw, bytes) };
            return Err(Error::invalid_operation(
                "allocator returned memory misaligned for the element type",
            ));
        }

        let ptr = raw.cast::<T>();
        let memory = Memory::Engine {
            allocator: allocator.clone(),
            ptr: raw,
            bytes,
        };
        Ok(Self::new_root(ptr, count, Ownership::Allocated, memory))
    }

    /// Takes over a vector and pins its memory for the lifetime of the buffer.
    pub fn from_vec(mut vec: Vec<T>) -> Result<Buffer<T>> {
        let count = vec.len();
        verify_arg!(vec, count >= 1);
        let ptr = NonNull::new(vec.as_mut_ptr())
            .ok_or_else(|| Error::invalid_arg("vec", "null data pointer"))?;
        Ok(Self::new_root(ptr, count, Ownership::Pinned, Memory::Vec(vec)))
    }

    /// Wraps the memory pinned by `owner`. The owner is dropped when the memory is
    /// released.
    ///
    /// The buffer covers `len / size_of::<T>()` elements of the owner's memory.
    pub fn from_owner(owner: Box<dyn MemoryOwner>) -> Result<Buffer<T>> {
        let allocation = owner.memory();
        let count = allocation.len / std::mem::size_of::<T>();
        verify_arg!(owner, count >= 1);
        verify_arg!(owner, allocation.is_aligned(std::mem::align_of::<T>()));
        let ptr = NonNull::new(allocation.ptr.cast::<T>())
            .ok_or_else(|| Error::invalid_arg("owner", "null data pointer"))?;
        Ok(Self::new_root(
            ptr,
            count,
            Ownership::Pinned,
            Memory::Owner(owner),
        ))
    }

    /// Wraps caller-managed memory. The buffer never releases it.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for reads and writes of `count` elements for as long as
    /// the buffer, any slice of it, or any plan bound to either is alive.
    pub unsafe fn from_raw_parts(ptr: *mut T, count: usize) -> Result<Buffer<T>> {
        verify_arg!(count, count >= 1);
        let ptr = NonNull::new(ptr).ok_or_else(|| Error::invalid_arg("ptr", "null pointer"))?;
        verify_arg!(ptr, is_aligned(ptr.as_ptr(), std::mem::align_of::<T>()));
        Ok(Self::new_root(ptr, count, Ownership::Foreign, Memory::Foreign))
    }

    /// Creates a zero-copy view of `length` elements starting at element `start`.
    ///
    /// The slice keeps the root's memory alive until it is disposed.
    ///
    /// # Errors
    ///
    /// - `OutOfRange` if `length` is zero or `start + length` exceeds `self.len()`
    /// - `Overflow` if the bounds or the slice address cannot be computed
    /// - `InvalidOperation` if this handle was disposed
    pub fn slice(&self, start: usize, length: usize) -> Result<Buffer<T>> {
        self.ensure_live("slice")?;
        if length < 1 {
            return Err(Error::out_of_range("slice", "length < 1"));
        }
        let end = start
            .checked_add(length)
            .ok_or_else(|| Error::overflow("slice end"))?;
        if end > self.len {
            return Err(Error::out_of_range(
                "slice",
                format!("start {start} + length {length} > len {}", self.len),
            ));
        }
        start
            .checked_mul(std::mem::size_of::<T>())
            .and_then(|offset| (self.ptr.as_ptr() as usize).checked_add(offset))
            .ok_or_else(|| Error::overflow("slice address"))?;

        self.root.acquire_slice();
        if self.disposed.load(Ordering::SeqCst) {
            self.root.release_slice();
            return Err(Error::invalid_operation("slice of a disposed buffer"));
        }

        let ptr = unsafe { self.ptr.add(start) };
        log::trace!("slice [{start}, {end}) of {:?}", self.ptr);
        Ok(Buffer {
            ptr,
            len: length,
            root: self.root.clone(),
            is_slice: true,
            disposed: AtomicBool::new(false),
        })
    }

    /// Binds the buffer to a plan. The memory stays valid while the binding lives.
    ///
    /// # Errors
    ///
    /// `InvalidOperation` if this handle was disposed.
    pub fn bind(&self) -> Result<BufferBinding<T>> {
        self.root.acquire_plan();
        if self.disposed.load(Ordering::SeqCst) {
            self.root.release_plan();
            return Err(Error::invalid_operation("bind a disposed buffer"));
        }
        Ok(BufferBinding::new(
            self.root.clone(),
            self.ptr,
            self.len,
            self.is_engine_allocated(),
        ))
    }

    /// Disposes the handle.
    ///
    /// Idempotent and safe to call concurrently; the first call wins. Disposing a
    /// slice only drops its reference to the root. Disposing a root requests the
    /// release of the memory, which is deferred while slices or plans reference it.
    /// Never fails.
    pub fn dispose(&self) {
        if self
            .disposed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }
        if self.is_slice {
            self.root.release_slice();
        } else {
            self.root.request_release();
        }
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always `false` for a live buffer; buffers hold at least one element.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The address of the first element.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    /// The address of the first element, for interop with native code.
    #[inline]
    pub fn as_mut_ptr(&self) -> *mut T {
        self.ptr.as_ptr()
    }

    pub fn ownership(&self) -> Ownership {
        if self.is_slice {
            Ownership::Slice
        } else {
            self.root.ownership()
        }
    }

    /// `true` if the memory was obtained through the engine's allocator, directly or
    /// as a slice of such memory.
    #[inline]
    pub fn is_engine_allocated(&self) -> bool {
        self.root.is_engine_allocated()
    }

    #[inline]
    pub fn is_slice(&self) -> bool {
        self.is_slice
    }

    #[inline]
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// `true` once the underlying memory has been released.
    #[inline]
    pub fn is_released(&self) -> bool {
        self.root.is_released()
    }

    /// Number of live slices of the root this buffer belongs to.
    #[inline]
    pub fn outstanding_slices(&self) -> usize {
        self.root.slices()
    }

    /// Number of live plan bindings to the root this buffer belongs to.
    #[inline]
    pub fn outstanding_plans(&self) -> usize {
        self.root.plans()
    }

    /// Returns `true` if `self` and `other` start at the same address.
    #[inline]
    pub fn same_address(&self, other: &Buffer<T>) -> bool {
        self.ptr == other.ptr
    }
}

/// Element copies. These keep the memory alive for the duration of the call but do
/// not synchronize with other writers: two threads writing overlapping elements
/// through handles of the same root, or a write racing a plan execution over the
/// same memory, is a data race the caller must rule out. `T` is plain old data, so
/// a race yields unspecified values in the buffer.
impl<T: Real> Buffer<T> {
    /// Copies `src` into the buffer starting at element `offset`.
    ///
    /// The caller must not write to, or execute a plan over, the same elements from
    /// another thread during the call.
    pub fn copy_from_slice(&self, offset: usize, src: &[T]) -> Result<()> {
        let pin = self.pin("copy_from_slice")?;
        self.check_range(offset, src.len())?;
        unsafe { std::ptr::copy(src.as_ptr(), pin.as_mut_ptr().add(offset), src.len()) };
        Ok(())
    }

    /// Copies elements starting at `offset` into `dst`.
    pub fn copy_to_slice(&self, offset: usize, dst: &mut [T]) -> Result<()> {
        let pin = self.pin("copy_to_slice")?;
        self.check_range(offset, dst.len())?;
        unsafe { std::ptr::copy(pin.as_ptr().add(offset), dst.as_mut_ptr(), dst.len()) };
        Ok(())
    }

    /// Returns a copy of the buffer contents.
    pub fn to_vec(&self) -> Result<Vec<T>> {
        let _pin = self.pin("to_vec")?;
        Ok(unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }.to_vec())
    }

    /// Sets every element to `value`.
    ///
    /// The same exclusivity rule as for [`Buffer::copy_from_slice`] applies.
    pub fn fill(&self, value: T) -> Result<()> {
        let _pin = self.pin("fill")?;
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }.fill(value);
        Ok(())
    }

    /// Borrows the contents.
    ///
    /// # Safety
    ///
    /// The handle must not be disposed while the slice is alive, and no plan,
    /// overlapping slice, or other thread may write to the memory meanwhile.
    #[inline]
    pub unsafe fn as_slice(&self) -> &[T] {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// Mutably borrows the contents.
    ///
    /// # Safety
    ///
    /// The handle must not be disposed while the slice is alive, and no other
    /// reference to the memory (through this handle, an overlapping slice, a plan, or
    /// another thread) may be used meanwhile.
    #[inline]
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn as_mut_slice(&self) -> &mut [T] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl<T: Real> Buffer<T> {
    fn new_root(ptr: NonNull<T>, len: usize, ownership: Ownership, memory: Memory<T>) -> Self {
        Buffer {
            ptr,
            len,
            root: Root::new(ptr, len, ownership, memory),
            is_slice: false,
            disposed: AtomicBool::new(false),
        }
    }

    fn ensure_live(&self, operation: &str) -> Result<()> {
        if self.is_disposed() {
            return Err(Error::invalid_operation(format!(
                "{operation} on a disposed buffer"
            )));
        }
        Ok(())
    }

    /// Holds the memory alive for the duration of a data access.
    fn pin(&self, operation: &str) -> Result<BufferBinding<T>> {
        self.bind()
            .map_err(|_| Error::invalid_operation(format!("{operation} on a disposed buffer")))
    }

    fn check_range(&self, offset: usize, count: usize) -> Result<()> {
        let end = offset
            .checked_add(count)
            .ok_or_else(|| Error::overflow("buffer range end"))?;
        if end > self.len {
            return Err(Error::out_of_range(
                "range",
                format!("offset {offset} + count {count} > len {}", self.len),
            ));
        }
        Ok(())
    }
}

impl<T: Real> Drop for Buffer<T> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<T: Real> fmt::Debug for Buffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .field("ownership", &self.ownership())
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}

#[inline]
fn is_aligned<P>(ptr: *const P, alignment: usize) -> bool {
    (ptr as usize) & (alignment - 1) == 0
}

#[cfg(test)]
mod tests {
    use hertz_common_traits::memory_owner::BoxedMemory;

    use super::*;

    #[test]
    fn test_allocate_zeroed() {
        let buf = Buffer::<f64>::allocate(10).unwrap();
        assert_eq!(buf.len(), 10);
        assert_eq!(buf.ownership(), Ownership::Allocated);
        assert!(buf.is_engine_allocated());
        assert_eq!(buf.to_vec().unwrap(), vec![0.0; 10]);
    }

    #[test]
    fn test_allocate_invalid_count() {
        let e = Buffer::<f32>::allocate(0).unwrap_err();
        assert!(e.is_invalid_argument());
    }

    #[test]
    fn test_allocate_overflow() {
        let e = Buffer::<f64>::allocate(usize::MAX / 4).unwrap_err();
        assert!(e.is_overflow());
    }

    #[test]
    fn test_from_vec_pins_memory() {
        let data = vec![1.0f32, 2.0, 3.0];
        let addr = data.as_ptr();
        let buf = Buffer::from_vec(data).unwrap();
        assert_eq!(buf.as_ptr(), addr);
        assert_eq!(buf.ownership(), Ownership::Pinned);
        assert!(!buf.is_engine_allocated());
        assert_eq!(buf.to_vec().unwrap(), vec![1.0, 2.0, 3.0]);

        assert!(Buffer::<f32>::from_vec(Vec::new()).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_from_owner() {
        let owner = BoxedMemory::from(vec![4.0f64; 6]);
        let buf = Buffer::<f64>::from_owner(Box::new(owner)).unwrap();
        assert_eq!(buf.len(), 6);
        assert_eq!(buf.ownership(), Ownership::Pinned);
        assert_eq!(buf.to_vec().unwrap(), vec![4.0; 6]);
    }

    #[test]
    fn test_from_owner_writes() {
        let owner = BoxedMemory::from(vec![0.0f32; 8]);
        let buf = Buffer::<f32>::from_owner(Box::new(owner)).unwrap();
        buf.fill(1.5).unwrap();
        buf.copy_from_slice(6, &[7.0, 8.0]).unwrap();
        let tail = buf.slice(4, 4).unwrap();
        tail.copy_from_slice(0, &[-2.0]).unwrap();
        assert_eq!(
            buf.to_vec().unwrap(),
            vec![1.5, 1.5, 1.5, 1.5, -2.0, 1.5, 7.0, 8.0]
        );
    }

    #[test]
    fn test_from_raw_parts_is_foreign() {
        let mut storage = vec![0.0f64; 4];
        let buf = unsafe { Buffer::from_raw_parts(storage.as_mut_ptr(), 4) }.unwrap();
        assert_eq!(buf.ownership(), Ownership::Foreign);
        buf.copy_from_slice(1, &[7.0, 8.0]).unwrap();
        buf.dispose();
        assert!(buf.is_released());
        drop(buf);
        assert_eq!(storage, vec![0.0, 7.0, 8.0, 0.0]);

        let e = unsafe { Buffer::<f64>::from_raw_parts(std::ptr::null_mut(), 4) }.unwrap_err();
        assert!(e.is_invalid_argument());
    }

    #[test]
    fn test_slice_aliases_root() {
        let root = Buffer::from_vec((0..10).map(|i| i as f64).collect()).unwrap();
        let slice = root.slice(3, 4).unwrap();
        assert_eq!(slice.len(), 4);
        assert!(slice.is_slice());
        assert_eq!(slice.ownership(), Ownership::Slice);
        assert_eq!(slice.as_ptr(), unsafe { root.as_ptr().add(3) });
        assert_eq!(slice.to_vec().unwrap(), vec![3.0, 4.0, 5.0, 6.0]);

        slice.copy_from_slice(0, &[-1.0]).unwrap();
        assert_eq!(root.to_vec().unwrap()[3], -1.0);
        assert_eq!(root.outstanding_slices(), 1);
    }

    #[test]
    fn test_slice_of_slice_refers_to_root() {
        let root = Buffer::<f64>::allocate(10).unwrap();
        let outer = root.slice(2, 6).unwrap();
        let inner = outer.slice(1, 2).unwrap();
        assert_eq!(inner.as_ptr(), unsafe { root.as_ptr().add(3) });
        assert_eq!(root.outstanding_slices(), 2);
        assert!(inner.is_engine_allocated());

        outer.dispose();
        assert_eq!(root.outstanding_slices(), 1);
        inner.dispose();
        assert_eq!(root.outstanding_slices(), 0);
    }

    #[test]
    fn test_slice_bounds() {
        let root = Buffer::<f32>::allocate(10).unwrap();
        assert!(root.slice(0, 0).unwrap_err().is_out_of_range());
        assert!(root.slice(7, 4).unwrap_err().is_out_of_range());
        assert!(root.slice(10, 1).unwrap_err().is_out_of_range());
        assert!(root.slice(usize::MAX, 2).unwrap_err().is_overflow());
        assert!(root.slice(0, 10).is_ok());
        assert_eq!(root.outstanding_slices(), 0);
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let buf = Buffer::<f64>::allocate(4).unwrap();
        buf.dispose();
        buf.dispose();
        assert!(buf.is_disposed());
        assert!(buf.is_released());
    }

    #[test]
    fn test_disposed_handle_rejects_use() {
        let buf = Buffer::<f64>::allocate(4).unwrap();
        buf.dispose();
        assert!(buf.slice(0, 1).unwrap_err().is_invalid_operation());
        assert!(buf.bind().unwrap_err().is_invalid_operation());
        assert!(buf.to_vec().unwrap_err().is_invalid_operation());
        assert!(buf.fill(1.0).unwrap_err().is_invalid_operation());
    }

    #[test]
    fn test_root_release_deferred_by_slice() {
        let root = Buffer::<f64>::allocate(10).unwrap();
        let slice = root.slice(3, 4).unwrap();
        root.dispose();
        assert!(root.is_disposed());
        assert!(!root.is_released());

        slice.fill(2.0).unwrap();
        assert_eq!(slice.to_vec().unwrap(), vec![2.0; 4]);

        slice.dispose();
        assert!(root.is_released());
    }

    #[test]
    fn test_root_release_deferred_by_binding() {
        let root = Buffer::<f32>::allocate(8).unwrap();
        let binding = root.bind().unwrap();
        assert_eq!(root.outstanding_plans(), 1);
        drop(root);
        assert!(!binding.is_released());
        drop(binding);
    }

    #[test]
    fn test_copy_range_checks() {
        let buf = Buffer::<f64>::allocate(4).unwrap();
        assert!(buf.copy_from_slice(3, &[1.0, 2.0]).unwrap_err().is_out_of_range());
        let mut dst = [0.0; 2];
        assert!(buf.copy_to_slice(3, &mut dst).unwrap_err().is_out_of_range());
        buf.copy_from_slice(2, &[1.0, 2.0]).unwrap();
        buf.copy_to_slice(2, &mut dst).unwrap();
        assert_eq!(dst, [1.0, 2.0]);
    }
}
