use half::f16;

/// The floating point width an engine evaluates in. Values are carried as `f64` and
/// rounded to the engine's width at every kernel boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Precision {
    Half,
    /// Single precision with the low mantissa bits dropped, standing in for fast-math.
    Fast,
    Single,
    Double,
}

impl Precision {
    /// Rounds `x` to this precision.
    pub fn round(self, x: f64) -> f64 {
        match self {
            Precision::Half => f16::from_f64(x).to_f64(),
            Precision::Fast => f32::from_bits((x as f32).to_bits() & !0xF) as f64,
            Precision::Single => x as f32 as f64,
            Precision::Double => x,
        }
    }

    /// The suffix used in engine tags.
    pub fn tag(self) -> &'static str {
        match self {
            Precision::Half => "16",
            Precision::Fast => "fast",
            Precision::Single => "32",
            Precision::Double => "64",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_loses_digits() {
        let x = 1.0 / 3.0;

        assert_eq!(Precision::Double.round(x), x);
        assert_eq!(Precision::Single.round(x), (x as f32) as f64);
        assert!((Precision::Half.round(x) - x).abs() < 1e-3);
        assert!((Precision::Half.round(x) - x).abs() > 1e-6);
        assert!((Precision::Fast.round(x) - x).abs() >= (Precision::Single.round(x) - x).abs());
    }

    #[test]
    fn half_overflows_to_infinity() {
        assert!(Precision::Half.round(1e6).is_infinite());
        assert!(Precision::Single.round(1e6).is_finite());
    }

    #[test]
    fn tags() {
        let tags: Vec<_> = [Precision::Half, Precision::Fast, Precision::Single, Precision::Double]
            .iter()
            .map(|p| p.tag())
            .collect();
        assert_eq!(tags, ["16", "fast", "32", "64"]);
    }
}
