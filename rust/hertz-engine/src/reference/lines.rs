//! Index arithmetic over row-major multi-dimensional arrays.

/// Calls `f` on every one-dimensional line of `data` along `axis`.
///
/// `data` is a row-major array of shape `dims`. Each line is gathered into `scratch`,
/// transformed by `f` in place, and scattered back.
pub(crate) fn for_each_line<V, F>(data: &mut [V], dims: &[usize], axis: usize, mut f: F)
where
    V: Copy + Default,
    F: FnMut(&mut [V]),
{
    let n = dims[axis];
    let stride: usize = dims[axis + 1..].iter().product();
    let outer: usize = dims[..axis].iter().product();
    debug_assert_eq!(data.len(), outer * n * stride);

    let mut scratch = vec![V::default(); n];
    for o in 0..outer {
        let block = o * n * stride;
        for i in 0..stride {
            let base = block + i;
            for (j, slot) in scratch.iter_mut().enumerate() {
                *slot = data[base + j * stride];
            }
            f(&mut scratch);
            for (j, value) in scratch.iter().enumerate() {
                data[base + j * stride] = *value;
            }
        }
    }
}

/// Number of complex values kept along the last axis of a real transform.
#[inline]
pub(crate) fn half_len(last: usize) -> usize {
    last / 2 + 1
}

/// Keeps the non-redundant half of a full spectrum of a real signal: the first
/// `last / 2 + 1` values of every row along the last axis.
pub(crate) fn truncate_half<V: Copy>(full: &[V], dims: &[usize]) -> Vec<V> {
    let (prefix, last) = split_last(dims);
    let h = half_len(last);
    let mut half = Vec::with_capacity(prefix * h);
    for p in 0..prefix {
        half.extend_from_slice(&full[p * last..p * last + h]);
    }
    half
}

/// Rebuilds the full spectrum of a real signal from its non-redundant half using
/// Hermitian symmetry: `X[-p, -k] = conj(X[p, k])`.
pub(crate) fn complete_hermitian<V, C>(half: &[V], dims: &[usize], conj: C) -> Vec<V>
where
    V: Copy,
    C: Fn(V) -> V,
{
    let (prefix, last) = split_last(dims);
    let prefix_dims = &dims[..dims.len() - 1];
    let h = half_len(last);
    let mut full = Vec::with_capacity(prefix * last);
    for p in 0..prefix {
        let mirrored = mirror_index(p, prefix_dims);
        for k in 0..last {
            if k < h {
                full.push(half[p * h + k]);
            } else {
                full.push(conj(half[mirrored * h + (last - k)]));
            }
        }
    }
    full
}

/// Maps a flattened row-major index to the index of its negated coordinates,
/// each taken modulo its extent.
pub(crate) fn mirror_index(index: usize, dims: &[usize]) -> usize {
    let mut rest = index;
    let mut mirrored = 0;
    let mut scale = 1;
    for &d in dims.iter().rev() {
        let c = rest % d;
        rest /= d;
        mirrored += ((d - c) % d) * scale;
        scale *= d;
    }
    mirrored
}

fn split_last(dims: &[usize]) -> (usize, usize) {
    let last = dims[dims.len() - 1];
    let prefix = dims[..dims.len() - 1].iter().product();
    (prefix, last)
}
