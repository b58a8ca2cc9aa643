mod polyline_2d;
mod polyline_3d;
pub(crate) mod sequence;

pub use polyline_2d::PolyLine2d;
pub use polyline_3d::PolyLine3d;

use crate::error::{GeometryError, Result};
use crate::operations::offset::OffsetParams;

/// How projections that fall outside the line are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectionMode {
    /// Projections beyond the first or last point yield no result.
    #[default]
    Reject,
    /// Projections may extend the first and last segments.
    Extend,
    /// Projections beyond the ends snap to the nearest end point.
    Clamp,
}

/// Adjacent-duplicate handling applied before a line is validated.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DuplicateFilter {
    /// Points are taken as given; coincident neighbours make construction fail.
    #[default]
    Disabled,
    /// Adjacent points closer than this distance are merged.
    /// `Epsilon(0.0)` removes exact duplicates only.
    Epsilon(f64),
}

/// Whether a line is a regular point sequence or a single point with a heading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineKind<R> {
    Regular,
    /// Zero-length line at one point; `heading` answers direction queries at position 0.
    Degenerate { heading: R },
}

/// Shared surface of [`PolyLine2d`] and [`PolyLine3d`].
///
/// Positions are arc lengths measured from the first point; fractions are
/// positions divided by the total length.
pub trait PolyLine: Sized + Clone {
    type Point: Copy;
    type Ray;
    type Segment;
    type Bounds;

    /// All points in order.
    fn points(&self) -> &[Self::Point];

    /// Regular or degenerate.
    fn kind(&self) -> &LineKind<Self::Ray>;

    /// Total arc length.
    fn length(&self) -> f64;

    /// Cumulative arc length at each point.
    fn lengths(&self) -> &[f64];

    /// Axis-aligned box around all points.
    fn bounds(&self) -> &Self::Bounds;

    /// Segment `index`, from point `index` to point `index + 1`.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::IndexOutOfRange` past the last segment.
    fn segment(&self, index: usize) -> Result<Self::Segment>;

    /// Point and heading at `position`, extrapolating before the start and beyond the end.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::NotFinite` for NaN or infinite positions and
    /// `OperationError::ExtrapolationOverflow` when no segment gives a finite result.
    fn location_extended(&self, position: f64) -> Result<Self::Ray>;

    /// Point and heading at `position` in `[0, length]`.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::ParameterOutOfRange` outside `[0, length]`.
    fn location(&self, position: f64) -> Result<Self::Ray>;

    /// Fractional position of the orthogonal projection of `point`, or `None`
    /// when `mode` rejects it.
    fn project_orthogonal_fractional(&self, point: &Self::Point, mode: ProjectionMode) -> Option<f64>;

    /// Orthogonal projection of `point` onto the line.
    fn project_orthogonal(&self, point: &Self::Point, mode: ProjectionMode) -> Option<Self::Point>;

    /// Closest point of the line to `point`, considering every segment.
    fn closest_point_on_polyline(&self, point: &Self::Point) -> Self::Point;

    /// Sub-line covering `[start, end]`.
    ///
    /// # Errors
    ///
    /// Fails when `start >= end`, `start < 0` or `end > length`.
    fn extract(&self, start: f64, end: f64) -> Result<Self>;

    /// Sub-line covering `[0, position]`.
    ///
    /// # Errors
    ///
    /// Fails when `position` is not in `(0, length]`.
    fn truncate(&self, position: f64) -> Result<Self>;

    /// Copy without interior points closer than `noise_level` to their kept predecessor.
    #[must_use]
    fn noise_filtered_line(&self, noise_level: f64) -> Self;

    /// Same points in reverse order.
    ///
    /// Cumulative lengths are mirrored from the forward ones rather than
    /// re-measured, so `length()` is unchanged to the last bit while interior
    /// values may differ by an ulp from a freshly built line.
    #[must_use]
    fn reverse(&self) -> Self;

    /// Blend from `self` (transition value 0) to `end_line` (transition value 1).
    ///
    /// # Errors
    ///
    /// Fails when either line is degenerate.
    fn transition_line<F: Fn(f64) -> f64>(&self, end_line: &Self, transition: F) -> Result<Self>;

    /// Parallel line at `offset` (positive to the left) with explicit parameters.
    ///
    /// # Errors
    ///
    /// Fails for non-finite offsets, invalid parameters, or when the offset collapses.
    fn offset_line_with(&self, offset: f64, params: &OffsetParams) -> Result<Self>;

    /// Offset that changes linearly with fractional position.
    ///
    /// # Errors
    ///
    /// See [`Self::offset_line_with`].
    fn offset_line_blended_with(
        &self,
        offset_at_start: f64,
        offset_at_end: f64,
        params: &OffsetParams,
    ) -> Result<Self>;

    /// Piecewise linear offset through `(fraction, offset)` pairs.
    ///
    /// # Errors
    ///
    /// Fails unless `fractions` is strictly ascending from `0.0` to `1.0` and
    /// `offsets` has the same number of entries.
    fn offset_line_fractions_with(&self, fractions: &[f64], offsets: &[f64], params: &OffsetParams) -> Result<Self>;

    /// Number of points.
    fn size(&self) -> usize {
        self.points().len()
    }

    /// True for a single-point line carrying only a heading.
    fn is_degenerate(&self) -> bool {
        matches!(self.kind(), LineKind::Degenerate { .. })
    }

    /// Point `index`.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::IndexOutOfRange` for `index >= size()`.
    fn get(&self, index: usize) -> Result<Self::Point> {
        self.points().get(index).copied().ok_or_else(|| {
            GeometryError::IndexOutOfRange {
                index,
                size: self.size(),
            }
            .into()
        })
    }

    /// Start point.
    fn first(&self) -> Self::Point {
        self.points()[0]
    }

    /// End point.
    fn last(&self) -> Self::Point {
        self.points()[self.size() - 1]
    }

    /// Cumulative arc length at point `index`.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::IndexOutOfRange` for `index >= size()`.
    fn length_at_index(&self, index: usize) -> Result<f64> {
        self.lengths().get(index).copied().ok_or_else(|| {
            GeometryError::IndexOutOfRange {
                index,
                size: self.size(),
            }
            .into()
        })
    }

    /// Index of the segment holding `position`.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::ParameterOutOfRange` outside `[0, length]`.
    fn find(&self, position: f64) -> Result<usize> {
        check_fraction_or_position("position", position, self.length())?;
        sequence::find(self.lengths(), position)
    }

    /// [`Self::location`] at `fraction * length`.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::ParameterOutOfRange` outside `[0, 1]`.
    fn location_fraction(&self, fraction: f64) -> Result<Self::Ray> {
        check_fraction_or_position("fraction", fraction, 1.0)?;
        self.location(fraction * self.length())
    }

    /// [`Self::location_extended`] at `fraction * length`.
    ///
    /// # Errors
    ///
    /// See [`Self::location_extended`].
    fn location_fraction_extended(&self, fraction: f64) -> Result<Self::Ray> {
        self.location_extended(fraction * self.length())
    }

    /// [`Self::extract`] with fractional bounds.
    ///
    /// # Errors
    ///
    /// See [`Self::extract`].
    fn extract_fractional(&self, start: f64, end: f64) -> Result<Self> {
        let length = self.length();
        self.extract(start * length, end * length)
    }

    /// Parallel line at `offset` with default [`OffsetParams`].
    ///
    /// # Errors
    ///
    /// See [`Self::offset_line_with`].
    fn offset_line(&self, offset: f64) -> Result<Self> {
        self.offset_line_with(offset, &OffsetParams::default())
    }

    /// Linearly varying offset with default [`OffsetParams`].
    ///
    /// # Errors
    ///
    /// See [`Self::offset_line_blended_with`].
    fn offset_line_blended(&self, offset_at_start: f64, offset_at_end: f64) -> Result<Self> {
        self.offset_line_blended_with(offset_at_start, offset_at_end, &OffsetParams::default())
    }

    /// Piecewise linear offset with default [`OffsetParams`].
    ///
    /// # Errors
    ///
    /// See [`Self::offset_line_fractions_with`].
    fn offset_line_fractions(&self, fractions: &[f64], offsets: &[f64]) -> Result<Self> {
        self.offset_line_fractions_with(fractions, offsets, &OffsetParams::default())
    }
}

fn check_fraction_or_position(parameter: &'static str, value: f64, max: f64) -> Result<()> {
    if value.is_nan() || value < 0.0 || value > max {
        return Err(GeometryError::ParameterOutOfRange {
            parameter,
            value,
            min: 0.0,
            max,
        }
        .into());
    }
    Ok(())
}
