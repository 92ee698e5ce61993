//! Planning flags and transform direction, passed to the engine unmodified.

bitflags::bitflags! {
    /// Planning flags.
    ///
    /// The numeric values follow the widely used FFTW convention, so the raw bits can
    /// be forwarded to a native engine as they are. Bits this type does not name are
    /// retained by [`Flags::from_bits_retain`] and passed through as well.
    ///
    /// The only flag interpreted outside the engine is [`Flags::UNALIGNED`]: a plan
    /// created without it only accepts engine-allocated substitute arrays in
    /// new-array execution.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Flags: u32 {
        /// The input array may be overwritten during execution.
        const DESTROY_INPUT = 1 << 0;
        /// Do not assume any alignment of the arrays.
        const UNALIGNED = 1 << 1;
        /// Prefer plans with a smaller memory footprint.
        const CONSERVE_MEMORY = 1 << 2;
        /// Exhaustive planning, slowest.
        const EXHAUSTIVE = 1 << 3;
        /// The input array must not be overwritten during execution.
        const PRESERVE_INPUT = 1 << 4;
        /// Patient planning.
        const PATIENT = 1 << 5;
        /// Heuristic planning without measurement; arrays are not touched.
        const ESTIMATE = 1 << 6;
        /// Only succeed if the plan can be built from accumulated wisdom.
        const WISDOM_ONLY = 1 << 21;
    }
}

impl Flags {
    /// Measured planning; the engine's default effort.
    pub const MEASURE: Flags = Flags::empty();

    /// Returns `true` unless the caller opted into unaligned execution.
    #[inline]
    pub fn requires_alignment(self) -> bool {
        !self.contains(Flags::UNALIGNED)
    }
}

/// Transform direction of a complex-to-complex transform: the sign of the exponent.
///
/// The value is carried as the raw integer the engine expects. Only
/// [`Sign::FORWARD`] and [`Sign::BACKWARD`] are defined; plan factories reject any
/// other value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sign(pub i32);

impl Sign {
    pub const FORWARD: Sign = Sign(-1);
    pub const BACKWARD: Sign = Sign(1);

    /// Returns `true` for one of the two defined directions.
    #[inline]
    pub fn is_defined(self) -> bool {
        self == Sign::FORWARD || self == Sign::BACKWARD
    }

    #[inline]
    pub fn value(self) -> i32 {
        self.0
    }
}

impl From<i32> for Sign {
    fn from(value: i32) -> Self {
        Sign(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_values() {
        assert_eq!(Flags::MEASURE.bits(), 0);
        assert_eq!(Flags::UNALIGNED.bits(), 2);
        assert_eq!(Flags::ESTIMATE.bits(), 64);
        assert_eq!(Flags::WISDOM_ONLY.bits(), 1 << 21);
    }

    #[test]
    fn test_unknown_bits_pass_through() {
        let flags = Flags::from_bits_retain((1 << 12) | Flags::ESTIMATE.bits());
        assert_eq!(flags.bits(), (1 << 12) | 64);
        assert!(flags.requires_alignment());
        assert!(!(flags | Flags::UNALIGNED).requires_alignment());
    }

    #[test]
    fn test_sign() {
        assert!(Sign::FORWARD.is_defined());
        assert!(Sign::from(1).is_defined());
        assert!(!Sign::from(0).is_defined());
        assert!(!Sign(-2).is_defined());
    }
}
