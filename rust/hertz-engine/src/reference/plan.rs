use std::sync::Arc;

use rustfft::{Fft, num_complex::Complex};

use crate::{NativePlan, R2rKind, Real};

use super::{lines, r2r};

/// The array layout a reference plan reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Layout {
    Dft,
    SplitDft,
    DftR2c,
    SplitDftR2c,
    DftC2r,
    SplitDftC2r,
    R2r,
}

/// A raw array address held by a native plan.
#[derive(Clone, Copy)]
pub(crate) struct RawArray<T>(pub(crate) *mut T);

// SAFETY: the address is only dereferenced inside `execute`, whose contract makes
// the caller responsible for the validity of the memory.
unsafe impl<T: Send> Send for RawArray<T> {}

unsafe impl<T: Sync> Sync for RawArray<T> {}

/// A reference-engine plan: per-axis FFT kernels (or r2r kinds) planned for the
/// shape, and the arrays bound at creation.
pub(crate) struct ReferencePlan<T: Real> {
    layout: Layout,
    dims: Vec<usize>,
    axes: Vec<Arc<dyn Fft<T>>>,
    kinds: Vec<R2rKind>,
    bound: Vec<RawArray<T>>,
}

impl<T: Real> ReferencePlan<T> {
    pub(crate) fn new(
        layout: Layout,
        dims: &[usize],
        axes: Vec<Arc<dyn Fft<T>>>,
        kinds: &[R2rKind],
        bound: &[*mut T],
    ) -> ReferencePlan<T> {
        ReferencePlan {
            layout,
            dims: dims.to_vec(),
            axes,
            kinds: kinds.to_vec(),
            bound: bound.iter().copied().map(RawArray).collect(),
        }
    }

    /// Total number of (real or complex) points of the logical transform.
    fn points(&self) -> usize {
        self.dims.iter().product()
    }

    /// Number of complex values in the half spectrum of a real transform.
    fn half_points(&self) -> usize {
        match self.dims.split_last() {
            Some((last, prefix)) => prefix.iter().product::<usize>() * lines::half_len(*last),
            None => 0,
        }
    }

    fn transform(&self, data: &mut [Complex<T>]) {
        for (axis, fft) in self.axes.iter().enumerate() {
            lines::for_each_line(data, &self.dims, axis, |line| fft.process(line));
        }
    }

    /// Reads every input array in full before writing any output, so arrays may
    /// alias.
    ///
    /// # Safety
    ///
    /// `arrays` must hold valid addresses for this plan's layout and shape.
    unsafe fn run(&self, arrays: &[*mut T]) {
        let n = self.points();
        unsafe {
            match self.layout {
                Layout::Dft => {
                    let mut data = read_interleaved(arrays[0], n);
                    self.transform(&mut data);
                    write_interleaved(arrays[1], &data);
                }
                Layout::SplitDft => {
                    let mut data = read_split(arrays[0], arrays[1], n);
                    self.transform(&mut data);
                    write_split(arrays[2], arrays[3], &data);
                }
                Layout::DftR2c => {
                    let mut data = read_real(arrays[0], n);
                    self.transform(&mut data);
                    write_interleaved(arrays[1], &lines::truncate_half(&data, &self.dims));
                }
                Layout::SplitDftR2c => {
                    let mut data = read_real(arrays[0], n);
                    self.transform(&mut data);
                    let half = lines::truncate_half(&data, &self.dims);
                    write_split(arrays[1], arrays[2], &half);
                }
                Layout::DftC2r => {
                    let half = read_interleaved(arrays[0], self.half_points());
                    let mut data = lines::complete_hermitian(&half, &self.dims, |c| c.conj());
                    self.transform(&mut data);
                    write_real(arrays[1], &data);
                }
                Layout::SplitDftC2r => {
                    let half = read_split(arrays[0], arrays[1], self.half_points());
                    let mut data = lines::complete_hermitian(&half, &self.dims, |c| c.conj());
                    self.transform(&mut data);
                    write_real(arrays[2], &data);
                }
                Layout::R2r => {
                    let mut data: Vec<f64> = std::slice::from_raw_parts(arrays[0], n)
                        .iter()
                        .map(|v| v.as_f64())
                        .collect();
                    for (axis, &kind) in self.kinds.iter().enumerate() {
                        lines::for_each_line(&mut data, &self.dims, axis, |line| {
                            let out = r2r::apply(kind, line);
                            line.copy_from_slice(&out);
                        });
                    }
                    let out: Vec<T> = data.into_iter().map(T::cast_f64).collect();
                    std::ptr::copy_nonoverlapping(out.as_ptr(), arrays[1], n);
                }
            }
        }
    }

    unsafe fn run_with(&self, layout: Layout, arrays: &[*mut T]) {
        debug_assert_eq!(layout, self.layout, "new-array execute of a different family");
        unsafe { self.run(arrays) }
    }
}

impl<T: Real> NativePlan<T> for ReferencePlan<T> {
    unsafe fn execute(&self) {
        let arrays: Vec<*mut T> = self.bound.iter().map(|a| a.0).collect();
        unsafe { self.run(&arrays) }
    }

    unsafe fn execute_dft(&self, input: *mut T, output: *mut T) {
        unsafe { self.run_with(Layout::Dft, &[input, output]) }
    }

    unsafe fn execute_split_dft(
        &self,
        real_in: *mut T,
        imag_in: *mut T,
        real_out: *mut T,
        imag_out: *mut T,
    ) {
        unsafe { self.run_with(Layout::SplitDft, &[real_in, imag_in, real_out, imag_out]) }
    }

    unsafe fn execute_dft_r2c(&self, input: *mut T, output: *mut T) {
        unsafe { self.run_with(Layout::DftR2c, &[input, output]) }
    }

    unsafe fn execute_split_dft_r2c(&self, input: *mut T, real_out: *mut T, imag_out: *mut T) {
        unsafe { self.run_with(Layout::SplitDftR2c, &[input, real_out, imag_out]) }
    }

    unsafe fn execute_dft_c2r(&self, input: *mut T, output: *mut T) {
        unsafe { self.run_with(Layout::DftC2r, &[input, output]) }
    }

    unsafe fn execute_split_dft_c2r(&self, real_in: *mut T, imag_in: *mut T, output: *mut T) {
        unsafe { self.run_with(Layout::SplitDftC2r, &[real_in, imag_in, output]) }
    }

    unsafe fn execute_r2r(&self, input: *mut T, output: *mut T) {
        unsafe { self.run_with(Layout::R2r, &[input, output]) }
    }
}

unsafe fn read_interleaved<T: Real>(ptr: *const T, count: usize) -> Vec<Complex<T>> {
    let values = unsafe { std::slice::from_raw_parts(ptr, 2 * count) };
    values
        .chunks_exact(2)
        .map(|pair| Complex::new(pair[0], pair[1]))
        .collect()
}

unsafe fn read_split<T: Real>(re: *const T, im: *const T, count: usize) -> Vec<Complex<T>> {
    let re = unsafe { std::slice::from_raw_parts(re, count) }.to_vec();
    let im = unsafe { std::slice::from_raw_parts(im, count) };
    re.into_iter()
        .zip(im.iter().copied())
        .map(|(re, im)| Complex::new(re, im))
        .collect()
}

unsafe fn read_real<T: Real>(ptr: *const T, count: usize) -> Vec<Complex<T>> {
    let values = unsafe { std::slice::from_raw_parts(ptr, count) };
    values
        .iter()
        .map(|&re| Complex::new(re, T::default()))
        .collect()
}

unsafe fn write_interleaved<T: Real>(ptr: *mut T, data: &[Complex<T>]) {
    let values: Vec<T> = data.iter().flat_map(|c| [c.re, c.im]).collect();
    unsafe { std::ptr::copy_nonoverlapping(values.as_ptr(), ptr, values.len()) };
}

unsafe fn write_split<T: Real>(re: *mut T, im: *mut T, data: &[Complex<T>]) {
    let real: Vec<T> = data.iter().map(|c| c.re).collect();
    let imag: Vec<T> = data.iter().map(|c| c.im).collect();
    unsafe {
        std::ptr::copy_nonoverlapping(real.as_ptr(), re, real.len());
        std::ptr::copy_nonoverlapping(imag.as_ptr(), im, imag.len());
    }
}

unsafe fn write_real<T: Real>(ptr: *mut T, data: &[Complex<T>]) {
    let values: Vec<T> = data.iter().map(|c| c.re).collect();
    unsafe { std::ptr::copy_nonoverlapping(values.as_ptr(), ptr, values.len()) };
}
