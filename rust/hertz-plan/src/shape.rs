//! Shape arithmetic: the buffer lengths a transform requires.
//!
//! All lengths are counts of `Real` elements. Interleaved complex arrays hold two
//! elements per complex value; each array of a split pair holds one.

use hertz_common::{Result, error::Error};
use hertz_engine::R2rKind;
use tinyvec::{ArrayVec, TinyVec};

use crate::family::{MAX_SLOTS, TransformFamily};

/// The extents of a transform, row-major. The rank is the number of extents.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape {
    dims: TinyVec<[usize; 4]>,
}

impl Shape {
    pub fn new(dims: &[usize]) -> Shape {
        Shape {
            dims: dims.iter().copied().collect(),
        }
    }

    #[inline]
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Checks that the shape has rank >= 1 and no zero extent, and returns the
    /// number of points.
    pub fn points(&self) -> Result<usize> {
        if self.dims.is_empty() {
            return Err(Error::invalid_arg("shape", "rank must be >= 1"));
        }
        if let Some(axis) = self.dims.iter().position(|&d| d == 0) {
            return Err(Error::invalid_arg(
                "shape",
                format!("extent of axis {axis} must be >= 1"),
            ));
        }
        product(&self.dims, "shape size")
    }

    /// The extent of the last axis and the number of points in all other axes.
    fn split_last(&self) -> Result<(usize, usize)> {
        self.points()?;
        match self.dims.split_last() {
            Some((&last, prefix)) => Ok((last, product(prefix, "shape size")?)),
            None => Err(Error::invalid_arg("shape", "rank must be >= 1")),
        }
    }
}

impl From<usize> for Shape {
    fn from(n: usize) -> Self {
        Shape::new(&[n])
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(dims: [usize; N]) -> Self {
        Shape::new(&dims)
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Shape::new(dims)
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Shape::new(&dims)
    }
}

impl From<&Shape> for Shape {
    fn from(shape: &Shape) -> Self {
        shape.clone()
    }
}

/// Length of an interleaved complex array: `2 * product(dims)`.
pub fn complex_len(shape: &Shape) -> Result<usize> {
    double(shape.points()?)
}

/// Length of one array of a split complex pair: `product(dims)`.
pub fn split_complex_len(shape: &Shape) -> Result<usize> {
    shape.points()
}

/// Length of the real side of a real/complex transform: `product(dims)`.
pub fn real_len(shape: &Shape) -> Result<usize> {
    shape.points()
}

/// Length of the interleaved half spectrum of a real/complex transform:
/// `2 * product(dims[..rank - 1]) * (dims[rank - 1] / 2 + 1)`.
pub fn half_complex_len(shape: &Shape) -> Result<usize> {
    double(split_half_complex_len(shape)?)
}

/// Length of one array of a split half spectrum:
/// `product(dims[..rank - 1]) * (dims[rank - 1] / 2 + 1)`.
pub fn split_half_complex_len(shape: &Shape) -> Result<usize> {
    let (last, prefix) = shape.split_last()?;
    prefix
        .checked_mul(last / 2 + 1)
        .ok_or_else(|| Error::overflow("half spectrum length"))
}

/// Length required along one axis of a real-to-real transform of extent `n`:
///
/// - `n` for the halfcomplex and Hartley kinds
/// - `2 * (n - 1)` for REDFT00
/// - `2 * (n + 1)` for RODFT00
/// - `2 * n` for the other cosine and sine kinds
pub fn r2r_axis_len(kind: R2rKind, n: usize) -> Result<usize> {
    if n == 0 {
        return Err(Error::invalid_arg("shape", "extent must be >= 1"));
    }
    let len = match kind {
        kind if kind.is_harmonic() => Some(n),
        R2rKind::Redft00 => {
            if n < 2 {
                return Err(Error::invalid_arg(
                    "shape",
                    "REDFT00 requires an extent >= 2",
                ));
            }
            (n - 1).checked_mul(2)
        }
        R2rKind::Rodft00 => n.checked_add(1).and_then(|m| m.checked_mul(2)),
        _ => n.checked_mul(2),
    };
    len.ok_or_else(|| Error::overflow("r2r axis length"))
}

/// Length of a real-to-real array: the product of the per-axis lengths.
///
/// `kinds` must hold one kind per axis.
pub fn r2r_len(shape: &Shape, kinds: &[R2rKind]) -> Result<usize> {
    shape.points()?;
    if kinds.len() != shape.rank() {
        return Err(Error::invalid_arg(
            "kinds",
            format!(
                "{} kinds given for a rank {} transform",
                kinds.len(),
                shape.rank()
            ),
        ));
    }
    shape
        .dims()
        .iter()
        .zip(kinds)
        .try_fold(1usize, |acc, (&n, &kind)| {
            acc.checked_mul(r2r_axis_len(kind, n)?)
                .ok_or_else(|| Error::overflow("r2r length"))
        })
}

/// Converts raw kind values, rejecting unrecognized ones.
pub fn r2r_kinds(values: &[i32]) -> Result<Vec<R2rKind>> {
    values.iter().map(|&v| R2rKind::try_from(v)).collect()
}

/// The minimum length of every buffer slot of a transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotLengths {
    lengths: ArrayVec<[usize; MAX_SLOTS]>,
}

impl SlotLengths {
    /// Computes the slot lengths of `family` for `shape`. `kinds` is only used by
    /// [`TransformFamily::R2r`].
    pub fn for_family(
        family: TransformFamily,
        shape: &Shape,
        kinds: &[R2rKind],
    ) -> Result<SlotLengths> {
        let lengths: ArrayVec<[usize; MAX_SLOTS]> = match family {
            TransformFamily::Dft => {
                let len = complex_len(shape)?;
                [len, len].into_iter().collect()
            }
            TransformFamily::SplitDft => {
                let len = split_complex_len(shape)?;
                [len; 4].into_iter().collect()
            }
            TransformFamily::DftR2c => [real_len(shape)?, half_complex_len(shape)?]
                .into_iter()
                .collect(),
            TransformFamily::SplitDftR2c => {
                let half = split_half_complex_len(shape)?;
                [real_len(shape)?, half, half].into_iter().collect()
            }
            TransformFamily::DftC2r => [half_complex_len(shape)?, real_len(shape)?]
                .into_iter()
                .collect(),
            TransformFamily::SplitDftC2r => {
                let half = split_half_complex_len(shape)?;
                [half, half, real_len(shape)?].into_iter().collect()
            }
            TransformFamily::R2r => {
                let len = r2r_len(shape, kinds)?;
                [len, len].into_iter().collect()
            }
        };
        debug_assert_eq!(lengths.len(), family.slot_count());
        Ok(SlotLengths { lengths })
    }

    #[inline]
    pub fn get(&self, slot: usize) -> Option<usize> {
        self.lengths.get(slot).copied()
    }

    #[inline]
    pub fn as_slice(&self) -> &[usize] {
        &self.lengths
    }

    /// The length of a buffer shared by slots `a` and `b` in place.
    pub fn shared(&self, a: usize, b: usize) -> usize {
        self.lengths[a].max(self.lengths[b])
    }
}

fn product(dims: &[usize], context: &str) -> Result<usize> {
    dims.iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| Error::overflow(context))
}

#[inline]
fn double(n: usize) -> Result<usize> {
    n.checked_mul(2)
        .ok_or_else(|| Error::overflow("complex array length"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_dimensional_lengths() {
        let shape = Shape::from(4);
        assert_eq!(complex_len(&shape).unwrap(), 8);
        assert_eq!(real_len(&shape).unwrap(), 4);
        assert_eq!(half_complex_len(&shape).unwrap(), 6);
        assert_eq!(split_complex_len(&shape).unwrap(), 4);
        assert_eq!(split_half_complex_len(&shape).unwrap(), 3);

        assert_eq!(half_complex_len(&Shape::from(5)).unwrap(), 6);
    }

    #[test]
    fn test_multi_dimensional_lengths() {
        let shape = Shape::from([3, 4, 6]);
        assert_eq!(shape.rank(), 3);
        assert_eq!(complex_len(&shape).unwrap(), 2 * 72);
        assert_eq!(real_len(&shape).unwrap(), 72);
        assert_eq!(half_complex_len(&shape).unwrap(), 2 * 12 * 4);
    }

    #[test]
    fn test_high_rank_shape() {
        let dims = [2, 3, 2, 2, 3, 2];
        let shape = Shape::from(dims);
        assert_eq!(shape.rank(), 6);
        assert_eq!(shape.dims(), &dims);
        assert_eq!(shape, Shape::from(dims.to_vec()));
        assert_eq!(complex_len(&shape).unwrap(), 2 * 144);
        assert_eq!(half_complex_len(&shape).unwrap(), 2 * 72 * 2);
    }

    #[test]
    fn test_invalid_shapes() {
        assert!(complex_len(&Shape::new(&[])).unwrap_err().is_invalid_argument());
        assert!(complex_len(&Shape::from([4, 0])).unwrap_err().is_invalid_argument());
        assert!(complex_len(&Shape::from([usize::MAX, 2])).unwrap_err().is_overflow());
        assert!(complex_len(&Shape::from(usize::MAX)).unwrap_err().is_overflow());
    }

    #[test]
    fn test_r2r_axis_lengths() {
        assert_eq!(r2r_axis_len(R2rKind::Redft00, 5).unwrap(), 8);
        assert_eq!(r2r_axis_len(R2rKind::Rodft00, 5).unwrap(), 12);
        assert_eq!(r2r_axis_len(R2rKind::Redft10, 5).unwrap(), 10);
        assert_eq!(r2r_axis_len(R2rKind::Redft01, 5).unwrap(), 10);
        assert_eq!(r2r_axis_len(R2rKind::Rodft11, 5).unwrap(), 10);
        assert_eq!(r2r_axis_len(R2rKind::R2hc, 5).unwrap(), 5);
        assert_eq!(r2r_axis_len(R2rKind::Hc2r, 5).unwrap(), 5);
        assert_eq!(r2r_axis_len(R2rKind::Dht, 5).unwrap(), 5);
        assert!(r2r_axis_len(R2rKind::Redft00, 1).unwrap_err().is_invalid_argument());
        assert!(r2r_axis_len(R2rKind::Rodft00, usize::MAX).unwrap_err().is_overflow());
    }

    #[test]
    fn test_r2r_multi_axis() {
        let shape = Shape::from([5, 3]);
        let len = r2r_len(&shape, &[R2rKind::Redft00, R2rKind::Dht]).unwrap();
        assert_eq!(len, 8 * 3);
        assert!(r2r_len(&shape, &[R2rKind::Dht]).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_r2r_kind_values() {
        assert_eq!(
            r2r_kinds(&[3, 2]).unwrap(),
            vec![R2rKind::Redft00, R2rKind::Dht]
        );
        assert!(r2r_kinds(&[3, 42]).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_slot_lengths() {
        let shape = Shape::from(4);
        let slots = SlotLengths::for_family(TransformFamily::DftR2c, &shape, &[]).unwrap();
        assert_eq!(slots.as_slice(), &[4, 6]);
        assert_eq!(slots.shared(0, 1), 6);

        let slots = SlotLengths::for_family(TransformFamily::SplitDftC2r, &shape, &[]).unwrap();
        assert_eq!(slots.as_slice(), &[3, 3, 4]);

        let slots = SlotLengths::for_family(TransformFamily::SplitDft, &shape, &[]).unwrap();
        assert_eq!(slots.as_slice(), &[4, 4, 4, 4]);
        assert_eq!(slots.get(4), None);

        let slots =
            SlotLengths::for_family(TransformFamily::R2r, &Shape::from(5), &[R2rKind::Redft00])
                .unwrap();
        assert_eq!(slots.as_slice(), &[8, 8]);
    }
}
