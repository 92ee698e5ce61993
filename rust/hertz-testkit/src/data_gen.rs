//! Data generation utilities for testing.

use hertz_engine::Real;

/// Generates `count` values uniformly distributed in `[-1, 1)`, reproducibly for a
/// given `seed`.
pub fn random_values<T: Real>(count: usize, seed: u64) -> Vec<T> {
    let mut rng = fastrand::Rng::with_seed(seed);
    (0..count)
        .map(|_| T::cast_f64(rng.f64() * 2.0 - 1.0))
        .collect()
}

/// Generates `points` complex values as interleaved `(re, im)` pairs.
pub fn random_interleaved<T: Real>(points: usize, seed: u64) -> Vec<T> {
    random_values(2 * points, seed)
}

/// Splits interleaved complex values into separate real and imaginary parts.
pub fn deinterleave<T: Real>(interleaved: &[T]) -> (Vec<T>, Vec<T>) {
    assert_eq!(interleaved.len() % 2, 0);
    interleaved
        .chunks_exact(2)
        .map(|pair| (pair[0], pair[1]))
        .unzip()
}

/// Merges separate real and imaginary parts into interleaved pairs.
pub fn interleave<T: Real>(re: &[T], im: &[T]) -> Vec<T> {
    assert_eq!(re.len(), im.len());
    re.iter().zip(im).flat_map(|(&r, &i)| [r, i]).collect()
}

/// A ramp `0, 1, 2, ...` of `count` values.
pub fn ramp<T: Real>(count: usize) -> Vec<T> {
    (0..count).map(|i| T::cast_f64(i as f64)).collect()
}

/// Asserts that `actual` equals `expected` scaled by `scale`, element-wise, within
/// `tolerance` relative to the largest expected magnitude.
#[track_caller]
pub fn assert_scaled_eq<T: Real>(actual: &[T], expected: &[T], scale: f64, tolerance: f64) {
    assert_eq!(actual.len(), expected.len(), "length mismatch");
    let magnitude = expected
        .iter()
        .map(|v| (v.as_f64() * scale).abs())
        .fold(1.0, f64::max);
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        let diff = (a.as_f64() - e.as_f64() * scale).abs();
        assert!(
            diff <= tolerance * magnitude,
            "element {i}: {} != {} * {scale}",
            a.as_f64(),
            e.as_f64()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_values_reproducible() {
        let a = random_values::<f64>(16, 7);
        let b = random_values::<f64>(16, 7);
        assert_eq!(a, b);
        assert!(a.iter().all(|v| (-1.0..1.0).contains(v)));
    }

    #[test]
    fn test_interleave() {
        let data = ramp::<f32>(6);
        let (re, im) = deinterleave(&data);
        assert_eq!(re, vec![0.0, 2.0, 4.0]);
        assert_eq!(im, vec![1.0, 3.0, 5.0]);
        assert_eq!(interleave(&re, &im), data);
    }
}
