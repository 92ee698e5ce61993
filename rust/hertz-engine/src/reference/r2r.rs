//! One-dimensional real-to-real transforms, computed from their definitions.
//!
//! All transforms are unnormalized. Composing a kind with its inverse kind scales
//! the data by the logical size `N` of the transform: `n` for the halfcomplex and
//! Hartley kinds, `2(n - 1)` for REDFT00, `2(n + 1)` for RODFT00, `2n` otherwise.

use std::f64::consts::PI;

use crate::R2rKind;

/// Applies `kind` to `x`, returning the transformed values.
pub(crate) fn apply(kind: R2rKind, x: &[f64]) -> Vec<f64> {
    let n = x.len();
    let nf = n as f64;
    match kind {
        R2rKind::R2hc => r2hc(x),
        R2rKind::Hc2r => hc2r(x),
        R2rKind::Dht => (0..n)
            .map(|k| {
                sum(n, |j| {
                    let t = 2.0 * PI * (j * k) as f64 / nf;
                    x[j] * (t.cos() + t.sin())
                })
            })
            .collect(),
        R2rKind::Redft00 => {
            if n < 2 {
                return x.to_vec();
            }
            let m = (n - 1) as f64;
            (0..n)
                .map(|k| {
                    let edge = x[0] + sign(k) * x[n - 1];
                    edge + 2.0
                        * (1..n - 1)
                            .map(|j| x[j] * (PI * (j * k) as f64 / m).cos())
                            .sum::<f64>()
                })
                .collect()
        }
        R2rKind::Redft10 => (0..n)
            .map(|k| 2.0 * sum(n, |j| x[j] * (PI * (j as f64 + 0.5) * k as f64 / nf).cos()))
            .collect(),
        R2rKind::Redft01 => (0..n)
            .map(|k| {
                x[0] + 2.0
                    * (1..n)
                        .map(|j| x[j] * (PI * j as f64 * (k as f64 + 0.5) / nf).cos())
                        .sum::<f64>()
            })
            .collect(),
        R2rKind::Redft11 => (0..n)
            .map(|k| {
                2.0 * sum(n, |j| {
                    x[j] * (PI * (j as f64 + 0.5) * (k as f64 + 0.5) / nf).cos()
                })
            })
            .collect(),
        R2rKind::Rodft00 => {
            let m = (n + 1) as f64;
            (0..n)
                .map(|k| 2.0 * sum(n, |j| x[j] * (PI * ((j + 1) * (k + 1)) as f64 / m).sin()))
                .collect()
        }
        R2rKind::Rodft10 => (0..n)
            .map(|k| {
                2.0 * sum(n, |j| {
                    x[j] * (PI * (j as f64 + 0.5) * (k + 1) as f64 / nf).sin()
                })
            })
            .collect(),
        R2rKind::Rodft01 => (0..n)
            .map(|k| {
                sign(k) * x[n - 1]
                    + 2.0
                        * (0..n - 1)
                            .map(|j| x[j] * (PI * (j + 1) as f64 * (k as f64 + 0.5) / nf).sin())
                            .sum::<f64>()
            })
            .collect(),
        R2rKind::Rodft11 => (0..n)
            .map(|k| {
                2.0 * sum(n, |j| {
                    x[j] * (PI * (j as f64 + 0.5) * (k as f64 + 0.5) / nf).sin()
                })
            })
            .collect(),
    }
}

/// Halfcomplex layout: `r0, r1, ..., r(n/2), i((n+1)/2 - 1), ..., i1`.
fn r2hc(x: &[f64]) -> Vec<f64> {
    let n = x.len();
    let nf = n as f64;
    let mut out = vec![0.0; n];
    for k in 0..=n / 2 {
        let mut re = 0.0;
        let mut im = 0.0;
        for (j, &v) in x.iter().enumerate() {
            let t = 2.0 * PI * (j * k) as f64 / nf;
            re += v * t.cos();
            im -= v * t.sin();
        }
        out[k] = re;
        if k > 0 && k < n - k {
            out[n - k] = im;
        }
    }
    out
}

fn hc2r(x: &[f64]) -> Vec<f64> {
    let n = x.len();
    let nf = n as f64;
    (0..n)
        .map(|j| {
            let mut y = x[0];
            for k in 1..n.div_ceil(2) {
                let t = 2.0 * PI * (j * k) as f64 / nf;
                y += 2.0 * (x[k] * t.cos() - x[n - k] * t.sin());
            }
            if n % 2 == 0 {
                y += x[n / 2] * sign(j);
            }
            y
        })
        .collect()
}

#[inline]
fn sum(n: usize, f: impl Fn(usize) -> f64) -> f64 {
    (0..n).map(f).sum()
}

/// `(-1)^k`.
#[inline]
fn sign(k: usize) -> f64 {
    if k % 2 == 0 { 1.0 } else { -1.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-9, "{actual:?} != {expected:?}");
        }
    }

    fn scaled(x: &[f64], factor: f64) -> Vec<f64> {
        x.iter().map(|v| v * factor).collect()
    }

    #[test]
    fn test_inverse_pairs() {
        let x = [0.5, -1.25, 2.0, 3.5, -0.75];
        let n = x.len() as f64;

        let pairs = [
            (R2rKind::R2hc, R2rKind::Hc2r, n),
            (R2rKind::Dht, R2rKind::Dht, n),
            (R2rKind::Redft00, R2rKind::Redft00, 2.0 * (n - 1.0)),
            (R2rKind::Redft10, R2rKind::Redft01, 2.0 * n),
            (R2rKind::Redft11, R2rKind::Redft11, 2.0 * n),
            (R2rKind::Rodft00, R2rKind::Rodft00, 2.0 * (n + 1.0)),
            (R2rKind::Rodft10, R2rKind::Rodft01, 2.0 * n),
            (R2rKind::Rodft11, R2rKind::Rodft11, 2.0 * n),
        ];
        for (forward, backward, factor) in pairs {
            let y = apply(backward, &apply(forward, &x));
            assert_close(&y, &scaled(&x, factor));
        }
    }

    #[test]
    fn test_r2hc_even_length_layout() {
        // x = [1, 2, 3, 4]: X0 = 10, X1 = -2 + 2i, X2 = -2.
        let y = apply(R2rKind::R2hc, &[1.0, 2.0, 3.0, 4.0]);
        assert_close(&y, &[10.0, -2.0, -2.0, 2.0]);
        let back = apply(R2rKind::Hc2r, &y);
        assert_close(&back, &[4.0, 8.0, 12.0, 16.0]);
    }

    #[test]
    fn test_redft10_constant_input() {
        let y = apply(R2rKind::Redft10, &[1.0; 4]);
        assert_close(&y, &[8.0, 0.0, 0.0, 0.0]);
    }
}
