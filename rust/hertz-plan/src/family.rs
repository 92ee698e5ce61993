//! Transform families and their buffer slots.

use std::fmt;

/// Maximum number of buffers a plan binds.
pub const MAX_SLOTS: usize = 4;

/// The family of a transform: the data layout of its arrays.
///
/// Every family has a fixed list of buffer slots (input slots first) and a fixed
/// set of input/output slot pairs whose aliasing decides whether the transform is
/// computed in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformFamily {
    /// Complex-to-complex over interleaved arrays.
    Dft,
    /// Complex-to-complex over split real/imaginary arrays.
    SplitDft,
    /// Real-to-complex with an interleaved half spectrum.
    DftR2c,
    /// Real-to-complex with a split half spectrum.
    SplitDftR2c,
    /// Complex-to-real from an interleaved half spectrum.
    DftC2r,
    /// Complex-to-real from a split half spectrum.
    SplitDftC2r,
    /// Real-to-real with one kind per axis.
    R2r,
}

impl TransformFamily {
    pub const ALL: [TransformFamily; 7] = [
        TransformFamily::Dft,
        TransformFamily::SplitDft,
        TransformFamily::DftR2c,
        TransformFamily::SplitDftR2c,
        TransformFamily::DftC2r,
        TransformFamily::SplitDftC2r,
        TransformFamily::R2r,
    ];

    /// Names of the buffer slots, in binding order.
    pub fn slot_names(self) -> &'static [&'static str] {
        match self {
            TransformFamily::Dft
            | TransformFamily::DftR2c
            | TransformFamily::DftC2r
            | TransformFamily::R2r => &["input", "output"],
            TransformFamily::SplitDft => &["real_in", "imag_in", "real_out", "imag_out"],
            TransformFamily::SplitDftR2c => &["input", "real_out", "imag_out"],
            TransformFamily::SplitDftC2r => &["real_in", "imag_in", "output"],
        }
    }

    #[inline]
    pub fn slot_count(self) -> usize {
        self.slot_names().len()
    }

    /// Input/output slot pairs that share one buffer when the transform is in place.
    /// The first pair decides [`crate::Plan::is_in_place`].
    pub fn in_place_pairs(self) -> &'static [(usize, usize)] {
        match self {
            TransformFamily::SplitDft => &[(0, 2), (1, 3)],
            TransformFamily::SplitDftC2r => &[(0, 2)],
            _ => &[(0, 1)],
        }
    }

    /// The slot holding the primary output.
    pub fn output_slot(self) -> usize {
        match self {
            TransformFamily::SplitDft => 2,
            TransformFamily::SplitDftC2r => 2,
            _ => 1,
        }
    }

    /// Name of the new-array execute method for this family.
    pub fn execute_method(self) -> &'static str {
        match self {
            TransformFamily::Dft => "execute_dft",
            TransformFamily::SplitDft => "execute_split_dft",
            TransformFamily::DftR2c => "execute_dft_r2c",
            TransformFamily::SplitDftR2c => "execute_split_dft_r2c",
            TransformFamily::DftC2r => "execute_dft_c2r",
            TransformFamily::SplitDftC2r => "execute_split_dft_c2r",
            TransformFamily::R2r => "execute_r2r",
        }
    }
}

impl fmt::Display for TransformFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransformFamily::Dft => "dft",
            TransformFamily::SplitDft => "split_dft",
            TransformFamily::DftR2c => "dft_r2c",
            TransformFamily::SplitDftR2c => "split_dft_r2c",
            TransformFamily::DftC2r => "dft_c2r",
            TransformFamily::SplitDftC2r => "split_dft_c2r",
            TransformFamily::R2r => "r2r",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_layout() {
        for family in TransformFamily::ALL {
            let count = family.slot_count();
            assert!((2..=MAX_SLOTS).contains(&count), "{family}");
            assert!(family.output_slot() < count);
            for &(input, output) in family.in_place_pairs() {
                assert!(input < output && output < count, "{family}");
            }
            assert!(family.execute_method().ends_with(&family.to_string()));
        }
    }
}
