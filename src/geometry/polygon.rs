use std::fmt;

use crate::error::{GeometryError, Result};
use crate::math::distance::turn_cross;
use crate::math::intersect_2d::segment_segment_intersect_2d;
use crate::math::polygon_2d::{ring_contains, signed_area_2d};
use crate::math::{Point2, Point3, PointN};

use super::bounds::{write_coords, Bounds2d, Bounds3d};
use super::polyline::sequence::filter_points;
use super::polyline::{DuplicateFilter, PolyLine, PolyLine2d, PolyLine3d};
use super::segment::{LineSegment2d, LineSegment3d};

/// Drops an explicit closing point and rejects rings that still close on themselves.
fn strip_closing_point<const D: usize>(points: &mut Vec<PointN<D>>) -> Result<()> {
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
        if points.len() > 1 && points.first() == points.last() {
            return Err(GeometryError::Degenerate(
                "polygon ring closes on its first point more than once".to_owned(),
            )
            .into());
        }
    }
    Ok(())
}

/// A closed ring in the plane. The last point connects back to the first.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon2d {
    line: PolyLine2d,
    closing_length: f64,
}

impl Polygon2d {
    /// Creates a polygon. A last point equal to the first is removed.
    ///
    /// # Errors
    ///
    /// Fails when the ring is still closed after that, or under the
    /// [`PolyLine2d::new`] rules.
    pub fn new(points: Vec<Point2>) -> Result<Self> {
        Self::with_filter(points, DuplicateFilter::Disabled)
    }

    /// Creates a polygon after merging adjacent points according to `filter`.
    ///
    /// # Errors
    ///
    /// See [`Self::new`].
    pub fn with_filter(points: Vec<Point2>, filter: DuplicateFilter) -> Result<Self> {
        let mut points = filter_points(points, filter)?;
        strip_closing_point(&mut points)?;
        let line = PolyLine2d::new(points)?;
        Ok(Self::from_open(line))
    }

    /// Creates a polygon from parallel coordinate slices.
    ///
    /// # Errors
    ///
    /// See [`PolyLine2d::from_coords`] and [`Self::new`].
    pub fn from_coords(x: &[f64], y: &[f64]) -> Result<Self> {
        let line = PolyLine2d::from_coords(x, y)?;
        Self::new(line.points().to_vec())
    }

    fn from_open(line: PolyLine2d) -> Self {
        let closing_length = nalgebra::distance(&line.last(), &line.first());
        Self { line, closing_length }
    }

    /// The ring as an open line, without the closing edge.
    #[must_use]
    pub fn as_polyline(&self) -> &PolyLine2d {
        &self.line
    }

    #[must_use]
    pub fn into_polyline(self) -> PolyLine2d {
        self.line
    }

    #[must_use]
    pub fn points(&self) -> &[Point2] {
        self.line.points()
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.line.size()
    }

    /// Point `index`.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::IndexOutOfRange` for `index >= size()`.
    pub fn get(&self, index: usize) -> Result<Point2> {
        self.line.get(index)
    }

    #[must_use]
    pub fn bounds(&self) -> &Bounds2d {
        self.line.bounds()
    }

    /// Perimeter, closing edge included.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.line.length() + self.closing_length
    }

    /// Edge `index`; edge `size() - 1` runs from the last point back to the first.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::IndexOutOfRange` for `index >= size()`.
    pub fn segment(&self, index: usize) -> Result<LineSegment2d> {
        let size = self.size();
        if index + 1 == size {
            return LineSegment2d::new(self.line.last(), self.line.first());
        }
        if index >= size {
            return Err(GeometryError::IndexOutOfRange { index, size }.into());
        }
        self.line.segment(index)
    }

    /// Even-odd containment test. Points on the boundary may go either way.
    #[must_use]
    pub fn contains(&self, point: &Point2) -> bool {
        if !self.bounds().covers(point) {
            return false;
        }
        ring_contains(self.points(), point.x, point.y)
    }

    /// True when every corner turns the same way. Straight corners are ignored.
    #[must_use]
    pub fn is_convex(&self) -> bool {
        let points = self.points();
        let n = points.len();
        let mut sign = 0.0_f64;
        for i in 0..n {
            let cross = turn_cross(&points[i], &points[(i + 1) % n], &points[(i + 2) % n]);
            if cross == 0.0 {
                continue;
            }
            if sign == 0.0 {
                sign = cross.signum();
            } else if cross.signum() != sign {
                return false;
            }
        }
        true
    }

    /// True when the polygons overlap or touch.
    ///
    /// Cheap checks run first: bounds, then vertex containment, then every
    /// pair of edges.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        if !self.bounds().intersects(other.bounds()) {
            return false;
        }
        if other.points().iter().any(|p| self.contains(p)) || self.points().iter().any(|p| other.contains(p)) {
            return true;
        }
        let edges = |polygon: &Self| -> Vec<(Point2, Point2)> {
            let points = polygon.points();
            let n = points.len();
            (0..n).map(|i| (points[i], points[(i + 1) % n])).collect()
        };
        let theirs = edges(other);
        edges(self).iter().any(|(a0, a1)| {
            theirs
                .iter()
                .any(|(b0, b1)| segment_segment_intersect_2d(a0, a1, b0, b1).is_some())
        })
    }

    /// Signed area; positive for counter-clockwise rings.
    #[must_use]
    pub fn surface(&self) -> f64 {
        signed_area_2d(self.points(), &self.bounds().midpoint())
    }

    /// Same ring traversed the other way.
    #[must_use]
    pub fn reverse(&self) -> Self {
        Self::from_open(self.line.reverse())
    }
}

impl TryFrom<Vec<Point2>> for Polygon2d {
    type Error = crate::error::PolycurveError;

    fn try_from(points: Vec<Point2>) -> Result<Self> {
        Self::new(points)
    }
}

impl TryFrom<&[Point2]> for Polygon2d {
    type Error = crate::error::PolycurveError;

    fn try_from(points: &[Point2]) -> Result<Self> {
        Self::new(points.to_vec())
    }
}

impl fmt::Display for Polygon2d {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Polygon2d [")?;
        for (i, p) in self.points().iter().enumerate() {
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

/// A closed ring in space.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon3d {
    line: PolyLine3d,
    closing_length: f64,
}

impl Polygon3d {
    /// Creates a polygon. A last point equal to the first is removed.
    ///
    /// # Errors
    ///
    /// See [`Polygon2d::new`].
    pub fn new(points: Vec<Point3>) -> Result<Self> {
        Self::with_filter(points, DuplicateFilter::Disabled)
    }

    /// Creates a polygon after merging adjacent points according to `filter`.
    ///
    /// # Errors
    ///
    /// See [`Polygon2d::new`].
    pub fn with_filter(points: Vec<Point3>, filter: DuplicateFilter) -> Result<Self> {
        let mut points = filter_points(points, filter)?;
        strip_closing_point(&mut points)?;
        let line = PolyLine3d::new(points)?;
        let closing_length = nalgebra::distance(&line.last(), &line.first());
        Ok(Self { line, closing_length })
    }

    #[must_use]
    pub fn as_polyline(&self) -> &PolyLine3d {
        &self.line
    }

    #[must_use]
    pub fn into_polyline(self) -> PolyLine3d {
        self.line
    }

    #[must_use]
    pub fn points(&self) -> &[Point3] {
        self.line.points()
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.line.size()
    }

    /// Point `index`.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::IndexOutOfRange` for `index >= size()`.
    pub fn get(&self, index: usize) -> Result<Point3> {
        self.line.get(index)
    }

    #[must_use]
    pub fn bounds(&self) -> &Bounds3d {
        self.line.bounds()
    }

    /// Perimeter, closing edge included.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.line.length() + self.closing_length
    }

    /// Edge `index`; edge `size() - 1` is the closing edge.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::IndexOutOfRange` for `index >= size()`.
    pub fn segment(&self, index: usize) -> Result<LineSegment3d> {
        let size = self.size();
        if index + 1 == size {
            return LineSegment3d::new(self.line.last(), self.line.first());
        }
        if index >= size {
            return Err(GeometryError::IndexOutOfRange { index, size }.into());
        }
        self.line.segment(index)
    }

    /// Drops z.
    ///
    /// # Errors
    ///
    /// Fails when the flattened ring degenerates.
    pub fn project(&self) -> Result<Polygon2d> {
        Polygon2d::with_filter(
            self.points().iter().map(|p| p.xy()).collect(),
            DuplicateFilter::Epsilon(0.0),
        )
    }

    #[must_use]
    pub fn reverse(&self) -> Self {
        Self {
            line: self.line.reverse(),
            closing_length: self.closing_length,
        }
    }
}

impl fmt::Display for Polygon3d {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Polygon3d [")?;
        for (i, p) in self.points().iter().enumerate() {
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
