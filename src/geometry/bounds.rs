use std::fmt;

use crate::error::{GeometryError, Result};
use crate::math::PointN;

/// Axis-aligned bounding box of a point set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds<const D: usize> {
    min: PointN<D>,
    max: PointN<D>,
}

/// 2D axis-aligned bounding box.
pub type Bounds2d = Bounds<2>;

/// 3D axis-aligned bounding box.
pub type Bounds3d = Bounds<3>;

impl<const D: usize> Bounds<D> {
    /// Builds the smallest box covering all `points`.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::TooFewPoints` for an empty point set.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a PointN<D>>) -> Result<Self> {
        let mut iter = points.into_iter();
        let first = iter.next().ok_or(GeometryError::TooFewPoints {
            required: 1,
            actual: 0,
        })?;
        let (min, max) = iter.fold((*first, *first), |(min, max), p| (min.inf(p), max.sup(p)));
        Ok(Self { min, max })
    }

    /// Box spanning two corner points given in any order.
    #[must_use]
    pub fn from_corners(a: &PointN<D>, b: &PointN<D>) -> Self {
        Self {
            min: a.inf(b),
            max: a.sup(b),
        }
    }

    /// Grows the box to cover `point`.
    pub(crate) fn include(&mut self, point: &PointN<D>) {
        self.min = self.min.inf(point);
        self.max = self.max.sup(point);
    }

    /// Lower corner.
    #[must_use]
    pub fn min(&self) -> &PointN<D> {
        &self.min
    }

    /// Upper corner.
    #[must_use]
    pub fn max(&self) -> &PointN<D> {
        &self.max
    }

    /// Center of the box.
    #[must_use]
    pub fn midpoint(&self) -> PointN<D> {
        nalgebra::center(&self.min, &self.max)
    }

    /// True when `point` lies inside the box or on its boundary.
    #[must_use]
    pub fn covers(&self, point: &PointN<D>) -> bool {
        (0..D).all(|i| point[i] >= self.min[i] && point[i] <= self.max[i])
    }

    /// True when the boxes overlap or touch.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        (0..D).all(|i| self.min[i] <= other.max[i] && other.min[i] <= self.max[i])
    }
}

impl<const D: usize> fmt::Display for Bounds<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bounds{}d [min=(", D)?;
        write_coords(f, &self.min)?;
        write!(f, "), max=(")?;
        write_coords(f, &self.max)?;
        write!(f, ")]")
    }
}

/// Writes `x, y[, z]` with `.` as decimal separator regardless of locale.
pub(crate) fn write_coords<const D: usize>(f: &mut fmt::Formatter<'_>, p: &PointN<D>) -> fmt::Result {
    for (i, c) in p.coords.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{c}")?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::{Point2, Point3};

    #[test]
    fn from_points_spans_all() {
        let pts = [Point2::new(1.0, -2.0), Point2::new(-3.0, 4.0), Point2::new(0.0, 0.0)];
        let b = Bounds2d::from_points(&pts).unwrap();
        assert_eq!(*b.min(), Point2::new(-3.0, -2.0));
        assert_eq!(*b.max(), Point2::new(1.0, 4.0));
        assert_eq!(b.midpoint(), Point2::new(-1.0, 1.0));
    }

    #[test]
    fn empty_point_set_fails() {
        let pts: [Point3; 0] = [];
        assert!(Bounds3d::from_points(&pts).is_err());
    }

    #[test]
    fn covers_is_inclusive() {
        let b = Bounds2d::from_points(&[Point2::new(0.0, 0.0), Point2::new(2.0, 2.0)]).unwrap();
        assert!(b.covers(&Point2::new(2.0, 1.0)));
        assert!(!b.covers(&Point2::new(2.1, 1.0)));
    }

    #[test]
    fn intersects_touching_boxes() {
        let a = Bounds3d::from_points(&[Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0)]).unwrap();
        let b = Bounds3d::from_points(&[Point3::new(1.0, 1.0, 1.0), Point3::new(2.0, 2.0, 2.0)]).unwrap();
        let c = Bounds3d::from_points(&[Point3::new(1.5, 0.0, 0.0), Point3::new(2.0, 2.0, 2.0)]).unwrap();
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn display_uses_dot_decimal() {
        let b = Bounds2d::from_points(&[Point2::new(0.5, 0.0), Point2::new(1.0, 2.25)]).unwrap();
        assert_eq!(b.to_string(), "Bounds2d [min=(0.5, 0), max=(1, 2.25)]");
    }
}
