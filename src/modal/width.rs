//! Modal width specifications.
//!
//! Widths are resolved against the current column count every render,
//! never cached, since the terminal can be resized between frames.

/// How wide a modal box should be.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WidthSpec {
    /// An exact column count, capped at the terminal width.
    Fixed(u16),
    /// A fraction of the terminal width.
    Ratio(f32),
    /// A fraction of the terminal width, clamped to `[min, max]`.
    Clamped {
        /// Fraction of the terminal width.
        ratio: f32,
        /// Lower bound in columns.
        min: u16,
        /// Upper bound in columns.
        max: u16,
    },
}

impl WidthSpec {
    /// Width used when a modal does not specify one.
    pub const DEFAULT: Self = Self::Clamped {
        ratio: 0.6,
        min: 30,
        max: 100,
    };

    /// Resolve to a concrete column count for a terminal `cols` wide.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn resolve(self, cols: u16) -> u16 {
        let scaled = |ratio: f32| {
            let w = (f64::from(cols) * f64::from(ratio)).round();
            w.clamp(0.0, f64::from(u16::MAX)) as u16
        };
        match self {
            Self::Fixed(n) => n.min(cols),
            Self::Ratio(r) => scaled(r),
            Self::Clamped { ratio, min, max } => scaled(ratio).clamp(min, max.max(min)),
        }
    }
}

impl Default for WidthSpec {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_fixed_caps_at_cols() {
        assert_eq!(WidthSpec::Fixed(40).resolve(100), 40);
        assert_eq!(WidthSpec::Fixed(140).resolve(100), 100);
    }

    #[test]
    fn test_ratio_rounds() {
        assert_eq!(WidthSpec::Ratio(0.5).resolve(81), 41);
        assert_eq!(WidthSpec::Ratio(0.25).resolve(100), 25);
    }

    #[test]
    fn test_clamped() {
        let spec = WidthSpec::Clamped {
            ratio: 0.5,
            min: 30,
            max: 60,
        };
        assert_eq!(spec.resolve(40), 30);
        assert_eq!(spec.resolve(100), 50);
        assert_eq!(spec.resolve(200), 60);
    }

    #[test]
    fn test_resolves_fresh_each_time() {
        let spec = WidthSpec::Ratio(0.5);
        assert_eq!(spec.resolve(100), 50);
        assert_eq!(spec.resolve(60), 30);
    }

    proptest! {
        #[test]
        fn prop_clamped_stays_in_bounds(
            ratio in 0.0f32..2.0,
            min in 0u16..100,
            span in 0u16..100,
            cols in 1u16..500,
        ) {
            let max = min + span;
            let w = WidthSpec::Clamped { ratio, min, max }.resolve(cols);
            prop_assert!(w >= min && w <= max);
        }

        #[test]
        fn prop_fixed_never_exceeds_cols(n in any::<u16>(), cols in 1u16..500) {
            prop_assert!(WidthSpec::Fixed(n).resolve(cols) <= cols);
        }
    }
}
