use std::fmt;

use tracing::warn;

use crate::error::{GeometryError, Result};
use crate::geometry::bounds::{write_coords, Bounds2d};
use crate::geometry::ray::Ray2d;
use crate::geometry::segment::LineSegment2d;
use crate::math::distance::closest_point_on_segment;
use crate::math::{check_finite, is_finite_point, Point2};
use crate::operations::offset::{OffsetParams, PolyLineOffset2d, VariableOffset2d};

use super::{check_fraction_or_position, sequence, DuplicateFilter, LineKind, PolyLine, ProjectionMode};

/// An immutable line through two or more points in the plane.
///
/// Consecutive points never coincide. Cumulative lengths and bounds are
/// computed once at construction.
#[derive(Debug, Clone)]
pub struct PolyLine2d {
    points: Vec<Point2>,
    lengths: Vec<f64>,
    bounds: Bounds2d,
    kind: LineKind<Ray2d>,
}

impl PolyLine2d {
    /// Creates a line from `points` as given.
    ///
    /// # Errors
    ///
    /// Fails with fewer than 2 points, non-finite coordinates, or two equal
    /// consecutive points.
    pub fn new(points: Vec<Point2>) -> Result<Self> {
        Self::with_filter(points, DuplicateFilter::Disabled)
    }

    /// Creates a line after merging adjacent points according to `filter`.
    ///
    /// # Errors
    ///
    /// See [`Self::new`]; the checks run on the filtered points.
    pub fn with_filter(points: Vec<Point2>, filter: DuplicateFilter) -> Result<Self> {
        let points = sequence::filter_points(points, filter)?;
        let (lengths, bounds) = sequence::measure(&points)?;
        Ok(Self {
            points,
            lengths,
            bounds,
            kind: LineKind::Regular,
        })
    }

    /// Creates a line from parallel coordinate slices.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::LengthMismatch` when the slices differ in length,
    /// otherwise see [`Self::new`].
    pub fn from_coords(x: &[f64], y: &[f64]) -> Result<Self> {
        if x.len() != y.len() {
            return Err(GeometryError::LengthMismatch {
                parameter: "y",
                expected: x.len(),
                actual: y.len(),
            }
            .into());
        }
        Self::new(x.iter().zip(y).map(|(&x, &y)| Point2::new(x, y)).collect())
    }

    /// Zero-length line at `point` whose direction is `heading`.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::NotFinite` for non-finite input.
    pub fn degenerate(point: Point2, heading: f64) -> Result<Self> {
        let heading = Ray2d::new(point, heading)?;
        Ok(Self {
            points: vec![point],
            lengths: vec![0.0],
            bounds: Bounds2d::from_corners(&point, &point),
            kind: LineKind::Degenerate { heading },
        })
    }

    /// Joins lines whose end and start points coincide exactly.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::Disconnected` when consecutive lines do not touch
    /// and `OperationError::MissingArgument` for an empty list.
    pub fn concatenate(lines: &[&Self]) -> Result<Self> {
        Self::concatenate_with_tolerance(0.0, lines)
    }

    /// Joins lines whose end and start points lie within `tolerance`.
    ///
    /// The joint is taken from the earlier line.
    ///
    /// # Errors
    ///
    /// See [`Self::concatenate`].
    pub fn concatenate_with_tolerance(tolerance: f64, lines: &[&Self]) -> Result<Self> {
        if let [line] = lines {
            return Ok((*line).clone());
        }
        let slices: Vec<&[Point2]> = lines.iter().map(|line| line.points.as_slice()).collect();
        Self::with_filter(sequence::concatenate(&slices, tolerance)?, DuplicateFilter::Epsilon(0.0))
    }

    fn heading(&self) -> Option<&Ray2d> {
        match &self.kind {
            LineKind::Regular => None,
            LineKind::Degenerate { heading } => Some(heading),
        }
    }

    fn degenerate_error(operation: &str) -> crate::error::PolycurveError {
        GeometryError::Degenerate(format!("cannot {operation} a degenerate line")).into()
    }
}

impl PolyLine for PolyLine2d {
    type Point = Point2;
    type Ray = Ray2d;
    type Segment = LineSegment2d;
    type Bounds = Bounds2d;

    fn points(&self) -> &[Point2] {
        &self.points
    }

    fn kind(&self) -> &LineKind<Ray2d> {
        &self.kind
    }

    fn length(&self) -> f64 {
        self.lengths[self.lengths.len() - 1]
    }

    fn lengths(&self) -> &[f64] {
        &self.lengths
    }

    fn bounds(&self) -> &Bounds2d {
        &self.bounds
    }

    fn segment(&self, index: usize) -> Result<LineSegment2d> {
        let segments = self.points.len() - 1;
        if index >= segments {
            return Err(GeometryError::IndexOutOfRange { index, size: segments }.into());
        }
        LineSegment2d::new(self.points[index], self.points[index + 1])
    }

    fn location_extended(&self, position: f64) -> Result<Ray2d> {
        check_finite("position", position)?;
        if let Some(heading) = self.heading() {
            return heading.location_extended(position);
        }
        let (point, direction) = sequence::location_extended(&self.points, &self.lengths, position)?;
        Ok(Ray2d::along(point, direction))
    }

    fn location(&self, position: f64) -> Result<Ray2d> {
        check_fraction_or_position("position", position, self.length())?;
        if let Some(heading) = self.heading() {
            return Ok(*heading);
        }
        let (point, direction) = sequence::location(&self.points, &self.lengths, position)?;
        Ok(Ray2d::along(point, direction))
    }

    fn project_orthogonal_fractional(&self, point: &Point2, mode: ProjectionMode) -> Option<f64> {
        if !is_finite_point(point) {
            return None;
        }
        match self.heading() {
            Some(heading) => {
                let on_point = heading.project_orthogonal_fractional_extended(point) == 0.0;
                (on_point || mode == ProjectionMode::Clamp).then_some(0.0)
            }
            None => sequence::project_fractional(&self.points, &self.lengths, point, mode),
        }
    }

    fn project_orthogonal(&self, point: &Point2, mode: ProjectionMode) -> Option<Point2> {
        if let Some(heading) = self.heading() {
            if mode == ProjectionMode::Extend && is_finite_point(point) {
                return Some(heading.project_orthogonal_extended(point));
            }
            return self.project_orthogonal_fractional(point, mode).map(|_| self.points[0]);
        }
        let fraction = self.project_orthogonal_fractional(point, mode)?;
        self.location_fraction_extended(fraction).ok().map(|ray| ray.point())
    }

    fn closest_point_on_polyline(&self, point: &Point2) -> Point2 {
        let mut best = self.points[0];
        let mut best_distance = f64::INFINITY;
        for pair in self.points.windows(2) {
            let candidate = closest_point_on_segment(point, &pair[0], &pair[1]);
            let distance = nalgebra::distance(point, &candidate);
            if distance < best_distance {
                best_distance = distance;
                best = candidate;
            }
        }
        best
    }

    fn extract(&self, start: f64, end: f64) -> Result<Self> {
        if self.is_degenerate() {
            return Err(Self::degenerate_error("extract from"));
        }
        Self::new(sequence::extract(&self.points, &self.lengths, start, end)?)
    }

    fn truncate(&self, position: f64) -> Result<Self> {
        if self.is_degenerate() {
            return Err(Self::degenerate_error("truncate"));
        }
        Self::new(sequence::truncate(&self.points, &self.lengths, position)?)
    }

    fn noise_filtered_line(&self, noise_level: f64) -> Self {
        let Some(points) = sequence::noise_filter(&self.points, noise_level) else {
            return self.clone();
        };
        match Self::new(points) {
            Ok(line) => line,
            Err(err) => {
                warn!(%err, noise_level, "noise filter produced an invalid line; keeping the original");
                self.clone()
            }
        }
    }

    fn reverse(&self) -> Self {
        if let Some(heading) = self.heading() {
            return Self {
                kind: LineKind::Degenerate {
                    heading: heading.flip(),
                },
                ..self.clone()
            };
        }
        let length = self.length();
        Self {
            points: self.points.iter().rev().copied().collect(),
            // mirrored, so the total length is exactly preserved
            lengths: self.lengths.iter().rev().map(|l| length - l).collect(),
            bounds: self.bounds,
            kind: LineKind::Regular,
        }
    }

    fn transition_line<F: Fn(f64) -> f64>(&self, end_line: &Self, transition: F) -> Result<Self> {
        if self.is_degenerate() || end_line.is_degenerate() {
            return Err(Self::degenerate_error("transition"));
        }
        let points = sequence::transition(
            (&self.points, &self.lengths),
            (&end_line.points, &end_line.lengths),
            transition,
        )?;
        Self::with_filter(points, DuplicateFilter::Epsilon(0.0))
    }

    fn offset_line_with(&self, offset: f64, params: &OffsetParams) -> Result<Self> {
        PolyLineOffset2d::new(self, offset).with_params(*params).execute()
    }

    fn offset_line_blended_with(&self, offset_at_start: f64, offset_at_end: f64, params: &OffsetParams) -> Result<Self> {
        VariableOffset2d::new(self, vec![0.0, 1.0], vec![offset_at_start, offset_at_end])
            .with_params(*params)
            .execute()
    }

    fn offset_line_fractions_with(&self, fractions: &[f64], offsets: &[f64], params: &OffsetParams) -> Result<Self> {
        VariableOffset2d::new(self, fractions.to_vec(), offsets.to_vec())
            .with_params(*params)
            .execute()
    }
}

/// Lines are equal when their points and kind are equal.
impl PartialEq for PolyLine2d {
    fn eq(&self, other: &Self) -> bool {
        self.points == other.points && self.kind == other.kind
    }
}

impl TryFrom<Vec<Point2>> for PolyLine2d {
    type Error = crate::error::PolycurveError;

    fn try_from(points: Vec<Point2>) -> Result<Self> {
        Self::new(points)
    }
}

impl TryFrom<&[Point2]> for PolyLine2d {
    type Error = crate::error::PolycurveError;

    fn try_from(points: &[Point2]) -> Result<Self> {
        Self::new(points.to_vec())
    }
}

impl From<LineSegment2d> for PolyLine2d {
    fn from(segment: LineSegment2d) -> Self {
        let (start, end) = (segment.start(), segment.end());
        Self {
            points: vec![start, end],
            lengths: vec![0.0, segment.length()],
            bounds: segment.bounds(),
            kind: LineKind::Regular,
        }
    }
}

impl fmt::Display for PolyLine2d {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PolyLine2d [")?;
        for (i, p) in self.points.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "(")?;
            write_coords(f, p)?;
            write!(f, ")")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::error::{OperationError, PolycurveError};

    fn line(coords: &[(f64, f64)]) -> PolyLine2d {
        PolyLine2d::new(coords.iter().map(|&(x, y)| Point2::new(x, y)).collect()).unwrap()
    }

    #[test]
    fn straight_line_length_and_midpoint() {
        let l = line(&[(0.0, 0.0), (10.0, 0.0)]);
        assert_abs_diff_eq!(l.length(), 10.0);
        let mid = l.location(5.0).unwrap();
        assert_eq!(mid.point(), Point2::new(5.0, 0.0));
        assert_abs_diff_eq!(mid.phi(), 0.0);
    }

    #[test]
    fn identical_points_are_degenerate() {
        let err = PolyLine2d::new(vec![Point2::new(1.0, 1.0), Point2::new(1.0, 1.0)]).unwrap_err();
        assert!(matches!(err, PolycurveError::Geometry(GeometryError::Degenerate(_))));
    }

    #[test]
    fn filter_rescues_duplicates() {
        let l = PolyLine2d::with_filter(
            vec![Point2::new(0.0, 0.0), Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)],
            DuplicateFilter::Epsilon(0.0),
        )
        .unwrap();
        assert_eq!(l.size(), 2);
    }

    #[test]
    fn from_coords_checks_lengths() {
        assert!(PolyLine2d::from_coords(&[0.0, 1.0], &[0.0]).is_err());
        let l = PolyLine2d::from_coords(&[0.0, 3.0], &[0.0, 4.0]).unwrap();
        assert_abs_diff_eq!(l.length(), 5.0);
    }

    #[test]
    fn cumulative_lengths_end_at_length() {
        let l = line(&[(0.0, 0.0), (3.0, 4.0), (3.0, 10.0), (0.0, 10.0)]);
        assert!(l.lengths().windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(l.length_at_index(3).unwrap(), l.length());
        assert_abs_diff_eq!(l.length(), 14.0);
        assert!(l.length_at_index(4).is_err());
    }

    #[test]
    fn location_at_both_ends() {
        let l = line(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]);
        let start = l.location(0.0).unwrap();
        let end = l.location(l.length()).unwrap();
        assert_eq!(start.point(), Point2::new(0.0, 0.0));
        assert_eq!(end.point(), Point2::new(1.0, 1.0));
        assert_abs_diff_eq!(end.phi(), FRAC_PI_2);
        assert!(l.location(2.5).is_err());
        assert!(l.location(-0.1).is_err());
    }

    #[test]
    fn extended_location_beyond_end() {
        let l = line(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]);
        let beyond = l.location_extended(4.0).unwrap();
        assert_abs_diff_eq!(beyond.point(), Point2::new(1.0, 3.0), epsilon = 1e-12);
        assert!(l.location_extended(f64::NAN).is_err());
    }

    #[test]
    fn location_fraction_scales_by_length() {
        let l = line(&[(0.0, 0.0), (4.0, 0.0)]);
        assert_eq!(l.location_fraction(0.25).unwrap().point(), Point2::new(1.0, 0.0));
        assert!(l.location_fraction(1.5).is_err());
        assert_eq!(l.location_fraction_extended(1.5).unwrap().point(), Point2::new(6.0, 0.0));
    }

    #[test]
    fn projection_modes_differ_beyond_end() {
        let l = line(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]);
        let inside = Point2::new(5.0, 1.0);
        assert_abs_diff_eq!(
            l.project_orthogonal_fractional(&inside, ProjectionMode::Reject).unwrap(),
            0.25
        );
        let behind = Point2::new(-2.0, 0.5);
        assert!(l.project_orthogonal_fractional(&behind, ProjectionMode::Reject).is_none());
        assert_abs_diff_eq!(
            l.project_orthogonal_fractional(&behind, ProjectionMode::Extend).unwrap(),
            -0.1
        );
        assert_abs_diff_eq!(
            l.project_orthogonal_fractional(&behind, ProjectionMode::Clamp).unwrap(),
            0.0
        );
        let p = l.project_orthogonal(&behind, ProjectionMode::Extend).unwrap();
        assert_abs_diff_eq!(p, Point2::new(-2.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn projection_near_end_does_not_jump_to_interior_segment() {
        // (9, 3) lies in the band of the first segment but is closer to the
        // extension of the last one.
        let l = line(&[(0.0, 0.0), (10.0, 0.0), (10.0, 2.0)]);
        let beyond = Point2::new(9.0, 3.0);
        assert!(l.project_orthogonal_fractional(&beyond, ProjectionMode::Reject).is_none());
        let f = l.project_orthogonal_fractional(&beyond, ProjectionMode::Extend).unwrap();
        assert_abs_diff_eq!(f * l.length(), 13.0, epsilon = 1e-12);
    }

    #[test]
    fn closest_point_considers_all_segments() {
        let l = line(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]);
        assert_eq!(l.closest_point_on_polyline(&Point2::new(12.0, 5.0)), Point2::new(10.0, 5.0));
        assert_eq!(l.closest_point_on_polyline(&Point2::new(-3.0, -3.0)), Point2::new(0.0, 0.0));
    }

    #[test]
    fn extract_whole_line_reproduces_points() {
        let l = line(&[(0.0, 0.0), (1.0, 0.0), (1.0, 2.0), (3.0, 2.0)]);
        let e = l.extract(0.0, l.length()).unwrap();
        assert_eq!(e.points(), l.points());
    }

    #[test]
    fn extract_cuts_inside_segments() {
        let l = line(&[(0.0, 0.0), (1.0, 0.0), (1.0, 2.0), (3.0, 2.0)]);
        let e = l.extract(0.5, 4.0).unwrap();
        assert_eq!(
            e.points(),
            &[Point2::new(0.5, 0.0), Point2::new(1.0, 0.0), Point2::new(1.0, 2.0), Point2::new(2.0, 2.0)]
        );
        assert!(l.extract(2.0, 1.0).is_err());
        assert!(l.extract(-1.0, 1.0).is_err());
        assert!(l.extract(0.0, 6.0).is_err());
        let f = l.extract_fractional(0.0, 0.2).unwrap();
        assert_eq!(f.points(), &[Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)]);
    }

    #[test]
    fn truncate_on_vertex_has_no_extra_point() {
        let l = line(&[(0.0, 0.0), (1.0, 0.0), (1.0, 2.0)]);
        let t = l.truncate(1.0).unwrap();
        assert_eq!(t.points(), &[Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)]);
        let t = l.truncate(2.0).unwrap();
        assert_eq!(t.last(), Point2::new(1.0, 1.0));
        assert!(l.truncate(0.0).is_err());
    }

    #[test]
    fn reverse_twice_is_identity() {
        let l = line(&[(0.0, 0.0), (1.0, 0.3), (1.7, 2.0), (3.0, 2.1)]);
        let r = l.reverse();
        assert_eq!(r.first(), l.last());
        assert_abs_diff_eq!(r.length(), l.length(), epsilon = 1e-12);
        assert_eq!(r.reverse(), l);
    }

    #[test]
    fn noise_filter_on_two_points_is_identity() {
        let l = line(&[(0.0, 0.0), (0.001, 0.0)]);
        assert_eq!(l.noise_filtered_line(1.0), l);
    }

    #[test]
    fn noise_filter_keeps_first_and_last() {
        let l = line(&[(0.0, 0.0), (0.1, 0.0), (5.0, 0.0), (5.05, 0.1)]);
        let n = l.noise_filtered_line(0.5);
        assert_eq!(n.first(), l.first());
        assert_eq!(n.last(), l.last());
        assert_eq!(n.points(), &[Point2::new(0.0, 0.0), Point2::new(5.05, 0.1)]);
    }

    #[test]
    fn concatenate_joins_shared_point_once() {
        let a = line(&[(0.0, 0.0), (1.0, 0.0)]);
        let b = line(&[(1.0, 0.0), (2.0, 1.0)]);
        let c = PolyLine2d::concatenate(&[&a, &b]).unwrap();
        assert_eq!(c.size(), 3);
        assert!(PolyLine2d::concatenate(&[]).is_err());
    }

    #[test]
    fn concatenate_with_gap_is_disconnected() {
        let a = line(&[(0.0, 0.0), (1.0, 0.0)]);
        let b = line(&[(2.0, 0.0), (3.0, 0.0)]);
        let err = PolyLine2d::concatenate_with_tolerance(0.0, &[&a, &b]).unwrap_err();
        assert!(matches!(
            err,
            PolycurveError::Operation(OperationError::Disconnected { index: 1, .. })
        ));
        assert!(PolyLine2d::concatenate_with_tolerance(1.5, &[&a, &b]).is_ok());
    }

    #[test]
    fn degenerate_line_uses_heading() {
        let d = PolyLine2d::degenerate(Point2::new(1.0, 1.0), FRAC_PI_2).unwrap();
        assert!(d.is_degenerate());
        assert_abs_diff_eq!(d.length(), 0.0);
        assert_abs_diff_eq!(d.location(0.0).unwrap().phi(), FRAC_PI_2);
        let ahead = d.location_extended(2.0).unwrap();
        assert_abs_diff_eq!(ahead.point(), Point2::new(1.0, 3.0), epsilon = 1e-12);
        assert!(d.segment(0).is_err());
        assert!(d.extract(0.0, 0.0).is_err());
        assert_abs_diff_eq!(d.reverse().location(0.0).unwrap().phi(), -FRAC_PI_2);
        let projected = d.project_orthogonal(&Point2::new(5.0, 4.0), ProjectionMode::Extend).unwrap();
        assert_abs_diff_eq!(projected, Point2::new(1.0, 4.0), epsilon = 1e-12);
    }

    #[test]
    fn transition_blends_between_lines() {
        let a = line(&[(0.0, 0.0), (10.0, 0.0)]);
        let b = line(&[(0.0, 4.0), (10.0, 4.0)]);
        let t = a.transition_line(&b, |f| f).unwrap();
        assert_eq!(t.first(), Point2::new(0.0, 0.0));
        assert_eq!(t.last(), Point2::new(10.0, 4.0));
    }

    #[test]
    fn transition_beyond_unit_range_extrapolates() {
        let a = line(&[(0.0, 0.0), (10.0, 0.0)]);
        let b = line(&[(0.0, 4.0), (10.0, 4.0)]);
        let beyond = a.transition_line(&b, |_| 2.0).unwrap();
        assert_eq!(beyond.points(), &[Point2::new(0.0, 8.0), Point2::new(10.0, 8.0)]);
        let before = a.transition_line(&b, |f| -f).unwrap();
        assert_eq!(before.points(), &[Point2::new(0.0, 0.0), Point2::new(10.0, -4.0)]);
    }

    #[test]
    fn reverse_mirrors_cumulative_lengths() {
        let l = line(&[(0.0, 0.0), (0.1, 0.0), (0.1, 0.3), (1.7, 0.3)]);
        let r = l.reverse();
        assert_eq!(r.length(), l.length());
        assert_eq!(r.lengths()[0], 0.0);
        assert_eq!(r.first(), l.last());
        let rebuilt = PolyLine2d::new(r.points().to_vec()).unwrap();
        for (mirrored, measured) in r.lengths().iter().zip(rebuilt.lengths()) {
            assert_abs_diff_eq!(*mirrored, *measured, epsilon = 1e-12);
        }
    }

    #[test]
    fn segment_access() {
        let l = line(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]);
        assert_eq!(l.segment(1).unwrap().end(), Point2::new(1.0, 1.0));
        assert!(l.segment(2).is_err());
        assert_eq!(l.find(1.5).unwrap(), 1);
    }

    #[test]
    fn from_segment_and_display() {
        let l = PolyLine2d::from(LineSegment2d::from_coords(0.0, 0.0, 1.5, 0.0).unwrap());
        assert_abs_diff_eq!(l.length(), 1.5);
        assert_eq!(l.to_string(), "PolyLine2d [(0, 0), (1.5, 0)]");
    }
}
