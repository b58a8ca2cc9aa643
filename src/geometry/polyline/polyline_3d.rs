use std::fmt;

use tracing::warn;

use crate::error::{GeometryError, Result};
use crate::geometry::bounds::{write_coords, Bounds3d};
use crate::geometry::ray::Ray3d;
use crate::geometry::segment::LineSegment3d;
use crate::math::distance::closest_point_on_segment;
use crate::math::{check_finite, is_finite_point, Point2, Point3, Vector3};
use crate::operations::offset::{validate_stops, OffsetParams};

use super::{
    check_fraction_or_position, sequence, DuplicateFilter, LineKind, PolyLine, PolyLine2d, ProjectionMode,
};

/// An immutable line through two or more points in space.
///
/// Offsets are computed on the XY projection; see [`PolyLine3d::project`].
#[derive(Debug, Clone)]
pub struct PolyLine3d {
    points: Vec<Point3>,
    lengths: Vec<f64>,
    bounds: Bounds3d,
    kind: LineKind<Ray3d>,
}

impl PolyLine3d {
    /// Creates a line from `points` as given.
    ///
    /// # Errors
    ///
    /// Fails with fewer than 2 points, non-finite coordinates, or two equal
    /// consecutive points.
    pub fn new(points: Vec<Point3>) -> Result<Self> {
        Self::with_filter(points, DuplicateFilter::Disabled)
    }

    /// Creates a line after merging adjacent points according to `filter`.
    ///
    /// # Errors
    ///
    /// See [`Self::new`].
    pub fn with_filter(points: Vec<Point3>, filter: DuplicateFilter) -> Result<Self> {
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
    /// Returns `GeometryError::LengthMismatch` when the slices differ in length.
    pub fn from_coords(x: &[f64], y: &[f64], z: &[f64]) -> Result<Self> {
        for (parameter, other) in [("y", y), ("z", z)] {
            if other.len() != x.len() {
                return Err(GeometryError::LengthMismatch {
                    parameter,
                    expected: x.len(),
                    actual: other.len(),
                }
                .into());
            }
        }
        Self::new(
            x.iter()
                .zip(y)
                .zip(z)
                .map(|((&x, &y), &z)| Point3::new(x, y, z))
                .collect(),
        )
    }

    /// Zero-length line at `point` heading along azimuth `phi` and polar angle `theta`.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::NotFinite` for non-finite input.
    pub fn degenerate(point: Point3, phi: f64, theta: f64) -> Result<Self> {
        let heading = Ray3d::new(point, phi, theta)?;
        Ok(Self {
            points: vec![point],
            lengths: vec![0.0],
            bounds: Bounds3d::from_corners(&point, &point),
            kind: LineKind::Degenerate { heading },
        })
    }

    /// Joins lines whose end and start points coincide exactly.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::Disconnected` when consecutive lines do not touch.
    pub fn concatenate(lines: &[&Self]) -> Result<Self> {
        Self::concatenate_with_tolerance(0.0, lines)
    }

    /// Joins lines whose end and start points lie within `tolerance`.
    ///
    /// # Errors
    ///
    /// See [`Self::concatenate`].
    pub fn concatenate_with_tolerance(tolerance: f64, lines: &[&Self]) -> Result<Self> {
        if let [line] = lines {
            return Ok((*line).clone());
        }
        let slices: Vec<&[Point3]> = lines.iter().map(|line| line.points.as_slice()).collect();
        Self::with_filter(sequence::concatenate(&slices, tolerance)?, DuplicateFilter::Epsilon(0.0))
    }

    /// Drops z. Points that coincide after flattening are collapsed.
    ///
    /// # Errors
    ///
    /// Fails when fewer than two distinct XY points remain.
    pub fn project(&self) -> Result<PolyLine2d> {
        if let Some(heading) = self.heading() {
            return PolyLine2d::degenerate(self.points[0].xy(), heading.phi());
        }
        PolyLine2d::with_filter(
            self.points.iter().map(|p| p.xy()).collect(),
            DuplicateFilter::Epsilon(0.0),
        )
    }

    /// Lifts a flat line back into space, taking z from the nearest reference point.
    ///
    /// The search for each point starts at the previous match, so a flat line
    /// that follows the reference in order is matched in order.
    fn attach_z(&self, flat: &PolyLine2d) -> Result<Self> {
        if let LineKind::Degenerate { heading } = flat.kind() {
            return Self::degenerate(
                Point3::new(flat.first().x, flat.first().y, self.points[0].z),
                heading.phi(),
                self.heading().map_or(std::f64::consts::FRAC_PI_2, Ray3d::theta),
            );
        }
        let mut start = 0;
        let mut points = Vec::with_capacity(flat.size());
        for p in flat.points() {
            let mut best_index = start;
            let mut best_distance = f64::INFINITY;
            for (index, reference) in self.points.iter().enumerate().skip(start) {
                let distance = nalgebra::distance(&reference.xy(), p);
                if distance < best_distance {
                    best_distance = distance;
                    best_index = index;
                }
            }
            start = best_index;
            points.push(Point3::new(p.x, p.y, self.points[best_index].z));
        }
        Self::new(points)
    }

    fn heading(&self) -> Option<&Ray3d> {
        match &self.kind {
            LineKind::Regular => None,
            LineKind::Degenerate { heading } => Some(heading),
        }
    }

    fn degenerate_error(operation: &str) -> crate::error::PolycurveError {
        GeometryError::Degenerate(format!("cannot {operation} a degenerate line")).into()
    }
}

impl PolyLine for PolyLine3d {
    type Point = Point3;
    type Ray = Ray3d;
    type Segment = LineSegment3d;
    type Bounds = Bounds3d;

    fn points(&self) -> &[Point3] {
        &self.points
    }

    fn kind(&self) -> &LineKind<Ray3d> {
        &self.kind
    }

    fn length(&self) -> f64 {
        self.lengths[self.lengths.len() - 1]
    }

    fn lengths(&self) -> &[f64] {
        &self.lengths
    }

    fn bounds(&self) -> &Bounds3d {
        &self.bounds
    }

    fn segment(&self, index: usize) -> Result<LineSegment3d> {
        let segments = self.points.len() - 1;
        if index >= segments {
            return Err(GeometryError::IndexOutOfRange { index, size: segments }.into());
        }
        LineSegment3d::new(self.points[index], self.points[index + 1])
    }

    fn location_extended(&self, position: f64) -> Result<Ray3d> {
        check_finite("position", position)?;
        if let Some(heading) = self.heading() {
            return heading.location_extended(position);
        }
        let (point, direction) = sequence::location_extended(&self.points, &self.lengths, position)?;
        Ok(Ray3d::along(point, direction))
    }

    fn location(&self, position: f64) -> Result<Ray3d> {
        check_fraction_or_position("position", position, self.length())?;
        if let Some(heading) = self.heading() {
            return Ok(*heading);
        }
        let (point, direction) = sequence::location(&self.points, &self.lengths, position)?;
        Ok(Ray3d::along(point, direction))
    }

    fn project_orthogonal_fractional(&self, point: &Point3, mode: ProjectionMode) -> Option<f64> {
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

    fn project_orthogonal(&self, point: &Point3, mode: ProjectionMode) -> Option<Point3> {
        if let Some(heading) = self.heading() {
            if mode == ProjectionMode::Extend && is_finite_point(point) {
                return Some(heading.project_orthogonal_extended(point));
            }
            return self.project_orthogonal_fractional(point, mode).map(|_| self.points[0]);
        }
        let fraction = self.project_orthogonal_fractional(point, mode)?;
        self.location_fraction_extended(fraction).ok().map(|ray| ray.point())
    }

    fn closest_point_on_polyline(&self, point: &Point3) -> Point3 {
        self.points
            .windows(2)
            .map(|pair| closest_point_on_segment(point, &pair[0], &pair[1]))
            .min_by(|a, b| nalgebra::distance(point, a).total_cmp(&nalgebra::distance(point, b)))
            .unwrap_or(self.points[0])
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
        check_finite("offset", offset)?;
        params.validate()?;
        if params.is_negligible(offset) {
            return Ok(self.clone());
        }
        let flat = self.project()?.offset_line_with(offset, params)?;
        self.attach_z(&flat)
    }

    fn offset_line_blended_with(&self, offset_at_start: f64, offset_at_end: f64, params: &OffsetParams) -> Result<Self> {
        validate_stops(&[0.0, 1.0], &[offset_at_start, offset_at_end])?;
        params.validate()?;
        if params.is_negligible(offset_at_start) && params.is_negligible(offset_at_end) {
            return Ok(self.clone());
        }
        let flat = self
            .project()?
            .offset_line_blended_with(offset_at_start, offset_at_end, params)?;
        self.attach_z(&flat)
    }

    fn offset_line_fractions_with(&self, fractions: &[f64], offsets: &[f64], params: &OffsetParams) -> Result<Self> {
        validate_stops(fractions, offsets)?;
        params.validate()?;
        if offsets.iter().all(|&offset| params.is_negligible(offset)) {
            return Ok(self.clone());
        }
        let flat = self.project()?.offset_line_fractions_with(fractions, offsets, params)?;
        self.attach_z(&flat)
    }
}

impl PartialEq for PolyLine3d {
    fn eq(&self, other: &Self) -> bool {
        self.points == other.points && self.kind == other.kind
    }
}

impl TryFrom<Vec<Point3>> for PolyLine3d {
    type Error = crate::error::PolycurveError;

    fn try_from(points: Vec<Point3>) -> Result<Self> {
        Self::new(points)
    }
}

impl TryFrom<&[Point3]> for PolyLine3d {
    type Error = crate::error::PolycurveError;

    fn try_from(points: &[Point3]) -> Result<Self> {
        Self::new(points.to_vec())
    }
}

impl From<LineSegment3d> for PolyLine3d {
    fn from(segment: LineSegment3d) -> Self {
        Self {
            points: vec![segment.start(), segment.end()],
            lengths: vec![0.0, segment.length()],
            bounds: segment.bounds(),
            kind: LineKind::Regular,
        }
    }
}

impl From<&PolyLine2d> for PolyLine3d {
    /// Lifts a flat line into the `z = 0` plane.
    fn from(line: &PolyLine2d) -> Self {
        let lift = |p: &Point2| Point3::new(p.x, p.y, 0.0);
        let points: Vec<Point3> = line.points().iter().map(lift).collect();
        let kind = match line.kind() {
            LineKind::Regular => LineKind::Regular,
            LineKind::Degenerate { heading } => {
                let direction = heading.direction();
                LineKind::Degenerate {
                    heading: Ray3d::along(lift(&heading.point()), Vector3::new(direction.x, direction.y, 0.0)),
                }
            }
        };
        Self {
            bounds: Bounds3d::from_corners(&lift(line.bounds().min()), &lift(line.bounds().max())),
            lengths: line.lengths().to_vec(),
            points,
            kind,
        }
    }
}

impl fmt::Display for PolyLine3d {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PolyLine3d [")?;
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
