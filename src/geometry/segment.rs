use std::fmt;

use crate::error::{GeometryError, Result};
use crate::math::distance::{closest_point_on_segment, fraction_on_segment};
use crate::math::intersect_2d::segment_segment_intersect_2d;
use crate::math::{check_finite, is_finite_point, Point2, Point3};

use super::bounds::{write_coords, Bounds2d, Bounds3d};
use super::ray::{Ray2d, Ray3d};

/// A straight segment between two distinct points in the plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment2d {
    start: Point2,
    end: Point2,
}

impl LineSegment2d {
    /// Creates a segment.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::Degenerate` when `start == end` or a coordinate is not finite.
    pub fn new(start: Point2, end: Point2) -> Result<Self> {
        if !is_finite_point(&start) || !is_finite_point(&end) {
            return Err(GeometryError::Degenerate(format!(
                "segment from {start} to {end} has non-finite coordinates"
            ))
            .into());
        }
        if start == end {
            return Err(GeometryError::Degenerate(format!("segment start equals end at {start}")).into());
        }
        Ok(Self { start, end })
    }

    /// Creates a segment from raw coordinates.
    ///
    /// # Errors
    ///
    /// See [`Self::new`].
    pub fn from_coords(x1: f64, y1: f64, x2: f64, y2: f64) -> Result<Self> {
        Self::new(Point2::new(x1, y1), Point2::new(x2, y2))
    }

    #[must_use]
    pub fn start(&self) -> Point2 {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> Point2 {
        self.end
    }

    /// Euclidean length; always positive.
    #[must_use]
    pub fn length(&self) -> f64 {
        nalgebra::distance(&self.start, &self.end)
    }

    /// Ray at `start` pointing towards `end`.
    #[must_use]
    pub fn direction(&self) -> Ray2d {
        Ray2d::along(self.start, self.end - self.start)
    }

    /// Point and direction at `position` along the infinite extension of the segment.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::NotFinite` when `position` is NaN or infinite.
    pub fn location_extended(&self, position: f64) -> Result<Ray2d> {
        check_finite("position", position)?;
        self.direction().location_extended(position)
    }

    /// Point and direction at `position` within `[0, length]`.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::ParameterOutOfRange` outside `[0, length]`.
    pub fn location(&self, position: f64) -> Result<Ray2d> {
        let length = self.length();
        if position.is_nan() || position < 0.0 || position > length {
            return Err(GeometryError::ParameterOutOfRange {
                parameter: "position",
                value: position,
                min: 0.0,
                max: length,
            }
            .into());
        }
        self.location_extended(position)
    }

    /// Closest point on the segment; projections beyond an end snap to that end.
    #[must_use]
    pub fn closest_point_on_segment(&self, point: &Point2) -> Point2 {
        closest_point_on_segment(point, &self.start, &self.end)
    }

    /// Unclamped fractional position of the orthogonal projection of `point`.
    #[must_use]
    pub fn project_orthogonal_fractional(&self, point: &Point2) -> f64 {
        fraction_on_segment(point, &self.start, &self.end)
    }

    /// Intersection point with `other`, endpoints included.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Option<Point2> {
        segment_segment_intersect_2d(&self.start, &self.end, &other.start, &other.end)
    }

    /// The same segment traversed from `end` to `start`.
    #[must_use]
    pub fn reverse(&self) -> Self {
        Self {
            start: self.end,
            end: self.start,
        }
    }

    /// Bounding box of both endpoints.
    #[must_use]
    pub fn bounds(&self) -> Bounds2d {
        Bounds2d::from_corners(&self.start, &self.end)
    }
}

impl fmt::Display for LineSegment2d {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LineSegment2d [(")?;
        write_coords(f, &self.start)?;
        write!(f, ") -> (")?;
        write_coords(f, &self.end)?;
        write!(f, ")]")
    }
}

/// A straight segment between two distinct points in space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment3d {
    start: Point3,
    end: Point3,
}

impl LineSegment3d {
    /// Creates a segment.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::Degenerate` when `start == end` or a coordinate is not finite.
    pub fn new(start: Point3, end: Point3) -> Result<Self> {
        if !is_finite_point(&start) || !is_finite_point(&end) {
            return Err(GeometryError::Degenerate(format!(
                "segment from {start} to {end} has non-finite coordinates"
            ))
            .into());
        }
        if start == end {
            return Err(GeometryError::Degenerate(format!("segment start equals end at {start}")).into());
        }
        Ok(Self { start, end })
    }

    /// Creates a segment from raw coordinates.
    ///
    /// # Errors
    ///
    /// See [`Self::new`].
    pub fn from_coords(x1: f64, y1: f64, z1: f64, x2: f64, y2: f64, z2: f64) -> Result<Self> {
        Self::new(Point3::new(x1, y1, z1), Point3::new(x2, y2, z2))
    }

    #[must_use]
    pub fn start(&self) -> Point3 {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> Point3 {
        self.end
    }

    #[must_use]
    pub fn length(&self) -> f64 {
        nalgebra::distance(&self.start, &self.end)
    }

    /// Ray at `start` pointing towards `end`.
    #[must_use]
    pub fn direction(&self) -> Ray3d {
        Ray3d::along(self.start, self.end - self.start)
    }

    /// Point and direction at `position` along the infinite extension of the segment.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::NotFinite` when `position` is NaN or infinite.
    pub fn location_extended(&self, position: f64) -> Result<Ray3d> {
        check_finite("position", position)?;
        self.direction().location_extended(position)
    }

    /// Point and direction at `position` within `[0, length]`.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::ParameterOutOfRange` outside `[0, length]`.
    pub fn location(&self, position: f64) -> Result<Ray3d> {
        let length = self.length();
        if position.is_nan() || position < 0.0 || position > length {
            return Err(GeometryError::ParameterOutOfRange {
                parameter: "position",
                value: position,
                min: 0.0,
                max: length,
            }
            .into());
        }
        self.location_extended(position)
    }

    #[must_use]
    pub fn closest_point_on_segment(&self, point: &Point3) -> Point3 {
        closest_point_on_segment(point, &self.start, &self.end)
    }

    #[must_use]
    pub fn project_orthogonal_fractional(&self, point: &Point3) -> f64 {
        fraction_on_segment(point, &self.start, &self.end)
    }

    #[must_use]
    pub fn reverse(&self) -> Self {
        Self {
            start: self.end,
            end: self.start,
        }
    }

    #[must_use]
    pub fn bounds(&self) -> Bounds3d {
        Bounds3d::from_corners(&self.start, &self.end)
    }
}

impl fmt::Display for LineSegment3d {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LineSegment3d [(")?;
        write_coords(f, &self.start)?;
        write!(f, ") -> (")?;
        write_coords(f, &self.end)?;
        write!(f, ")]")
    }
}
