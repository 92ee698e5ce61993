//! Real-to-real transform kinds.

use hertz_common::error::Error;

/// The kind of a real-to-real transform along one axis.
///
/// Discriminants are the engine's numeric values. `Redft*` kinds are the
/// even-symmetry (cosine) transforms, `Rodft*` the odd-symmetry (sine) ones; the
/// two digits give the half-sample shift of the input and output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum R2rKind {
    /// Real to halfcomplex.
    R2hc = 0,
    /// Halfcomplex to real.
    Hc2r = 1,
    /// Discrete Hartley transform.
    Dht = 2,
    Redft00 = 3,
    Redft01 = 4,
    Redft10 = 5,
    Redft11 = 6,
    Rodft00 = 7,
    Rodft01 = 8,
    Rodft10 = 9,
    Rodft11 = 10,
}

impl R2rKind {
    pub const ALL: [R2rKind; 11] = [
        R2rKind::R2hc,
        R2rKind::Hc2r,
        R2rKind::Dht,
        R2rKind::Redft00,
        R2rKind::Redft01,
        R2rKind::Redft10,
        R2rKind::Redft11,
        R2rKind::Rodft00,
        R2rKind::Rodft01,
        R2rKind::Rodft10,
        R2rKind::Rodft11,
    ];

    #[inline]
    pub fn value(self) -> i32 {
        self as i32
    }

    /// Halfcomplex and Hartley kinds: the ones that are not a cosine or sine
    /// transform.
    #[inline]
    pub fn is_harmonic(self) -> bool {
        matches!(self, R2rKind::R2hc | R2rKind::Hc2r | R2rKind::Dht)
    }
}

impl TryFrom<i32> for R2rKind {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        R2rKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.value() == value)
            .ok_or_else(|| Error::invalid_arg("kind", format!("unrecognized r2r kind {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip_values() {
        for (i, kind) in R2rKind::ALL.iter().enumerate() {
            assert_eq!(kind.value(), i as i32);
            assert_eq!(R2rKind::try_from(i as i32).unwrap(), *kind);
        }
    }

    #[test]
    fn test_unrecognized_kind() {
        assert!(R2rKind::try_from(11).unwrap_err().is_invalid_argument());
        assert!(R2rKind::try_from(-1).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_harmonic_kinds() {
        let harmonic: Vec<_> = R2rKind::ALL.into_iter().filter(|k| k.is_harmonic()).collect();
        assert_eq!(harmonic, [R2rKind::R2hc, R2rKind::Hc2r, R2rKind::Dht]);
    }
}
