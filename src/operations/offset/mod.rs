mod polyline_offset_2d;
mod variable_offset;

pub use polyline_offset_2d::PolyLineOffset2d;
pub use variable_offset::VariableOffset2d;
pub(crate) use variable_offset::validate_stops;

use crate::error::{GeometryError, Result};

/// Tuning knobs for offset curves.
///
/// The defaults suit lines measured in metres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffsetParams {
    /// Largest allowed sagitta when a convex corner is replaced by an arc fan.
    pub circle_precision: f64,
    /// Noise below this is always filtered from the reference line.
    pub offset_minimum_filter_value: f64,
    /// Noise above this is never filtered from the reference line.
    pub offset_maximum_filter_value: f64,
    /// `|offset| / offset_filter_ratio` is the noise level, clamped to the two values above.
    pub offset_filter_ratio: f64,
    /// Offsets smaller than this return the reference line unchanged.
    pub minimum_offset: f64,
}

impl Default for OffsetParams {
    fn default() -> Self {
        Self {
            circle_precision: 0.001,
            offset_minimum_filter_value: 0.001,
            offset_maximum_filter_value: 0.1,
            offset_filter_ratio: 10.0,
            minimum_offset: 0.000_01,
        }
    }
}

impl OffsetParams {
    /// Checks that every value is a positive number and the filter range is not empty.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::InvalidParameter` naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("circle_precision", self.circle_precision),
            ("offset_minimum_filter_value", self.offset_minimum_filter_value),
            ("offset_maximum_filter_value", self.offset_maximum_filter_value),
            ("offset_filter_ratio", self.offset_filter_ratio),
            ("minimum_offset", self.minimum_offset),
        ];
        for (parameter, value) in fields {
            if value.is_nan() || value <= 0.0 {
                return Err(GeometryError::InvalidParameter {
                    parameter,
                    reason: format!("must be positive, got {value}"),
                }
                .into());
            }
        }
        if self.offset_minimum_filter_value >= self.offset_maximum_filter_value {
            return Err(GeometryError::InvalidParameter {
                parameter: "offset_minimum_filter_value",
                reason: format!(
                    "must be below offset_maximum_filter_value ({} >= {})",
                    self.offset_minimum_filter_value, self.offset_maximum_filter_value
                ),
            }
            .into());
        }
        Ok(())
    }

    /// True when `offset` is too small to move the line at all.
    #[must_use]
    pub fn is_negligible(&self, offset: f64) -> bool {
        offset.abs() < self.minimum_offset
    }

    /// Noise level used to pre-filter the reference line for an offset of `|offset|`.
    #[must_use]
    pub fn noise_level(&self, offset: f64) -> f64 {
        (offset.abs() / self.offset_filter_ratio)
            .min(self.offset_maximum_filter_value)
            .max(self.offset_minimum_filter_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(OffsetParams::default().validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_and_nan() {
        let params = OffsetParams {
            circle_precision: 0.0,
            ..OffsetParams::default()
        };
        assert!(params.validate().is_err());
        let params = OffsetParams {
            offset_filter_ratio: f64::NAN,
            ..OffsetParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn rejects_inverted_filter_range() {
        let params = OffsetParams {
            offset_minimum_filter_value: 0.2,
            ..OffsetParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn negligible_offsets() {
        let params = OffsetParams::default();
        assert!(params.is_negligible(0.0));
        assert!(params.is_negligible(-0.000_001));
        assert!(!params.is_negligible(0.000_01));
    }

    #[test]
    fn noise_level_is_clamped() {
        let params = OffsetParams::default();
        assert!((params.noise_level(0.000_1) - 0.001).abs() < 1e-15);
        assert!((params.noise_level(0.5) - 0.05).abs() < 1e-15);
        assert!((params.noise_level(-50.0) - 0.1).abs() < 1e-15);
    }
}
