use std::f64::consts::PI;
use std::fmt;

use crate::error::{GeometryError, Result};
use crate::math::{check_finite, is_finite_point, normalize_angle, Point2, Point3, Vector2, Vector3};

/// A half-line in the plane: an origin plus a direction angle.
///
/// `phi` is measured counter-clockwise from the +x axis and kept in `(-π, π]`.
/// Every location query on a line returns one of these.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray2d {
    point: Point2,
    phi: f64,
}

impl Ray2d {
    /// Creates a ray from an origin and a direction angle.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::NotFinite` for NaN or infinite inputs.
    pub fn new(point: Point2, phi: f64) -> Result<Self> {
        check_point_2d(&point)?;
        check_finite("phi", phi)?;
        Ok(Self {
            point,
            phi: normalize_angle(phi),
        })
    }

    /// Creates a ray starting at `point` that passes through `through`.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::Degenerate` if both points are equal.
    pub fn through(point: Point2, through: Point2) -> Result<Self> {
        Self::from_direction(point, through - point)
    }

    /// Creates a ray starting at `point` heading along `direction`.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::Degenerate` for a zero vector.
    pub fn from_direction(point: Point2, direction: Vector2) -> Result<Self> {
        if direction.x == 0.0 && direction.y == 0.0 {
            return Err(GeometryError::Degenerate("ray direction has zero length".to_owned()).into());
        }
        Self::new(point, direction.y.atan2(direction.x))
    }

    /// Ray along a direction vector the caller already knows to be finite and non-zero.
    pub(crate) fn along(point: Point2, direction: Vector2) -> Self {
        Self {
            point,
            phi: direction.y.atan2(direction.x),
        }
    }

    /// Origin of the ray.
    #[must_use]
    pub fn point(&self) -> Point2 {
        self.point
    }

    /// Direction angle in `(-π, π]`.
    #[must_use]
    pub fn phi(&self) -> f64 {
        self.phi
    }

    /// Unit vector along the ray.
    #[must_use]
    pub fn direction(&self) -> Vector2 {
        Vector2::new(self.phi.cos(), self.phi.sin())
    }

    /// Ray with the same direction, moved `position` along this one.
    /// Negative positions move backwards.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::NotFinite` for NaN or infinite positions.
    pub fn location_extended(&self, position: f64) -> Result<Self> {
        check_finite("position", position)?;
        Ok(Self {
            point: self.point + self.direction() * position,
            phi: self.phi,
        })
    }

    /// Like [`Self::location_extended`], restricted to the half-line itself.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::ParameterOutOfRange` for negative positions.
    pub fn location(&self, position: f64) -> Result<Self> {
        if position < 0.0 {
            return Err(GeometryError::ParameterOutOfRange {
                parameter: "position",
                value: position,
                min: 0.0,
                max: f64::INFINITY,
            }
            .into());
        }
        self.location_extended(position)
    }

    /// Signed distance from the origin to the orthogonal projection of `point`
    /// on the carrier line of this ray.
    #[must_use]
    pub fn project_orthogonal_fractional_extended(&self, point: &Point2) -> f64 {
        (point - self.point).dot(&self.direction())
    }

    /// Orthogonal projection of `point` on the carrier line of this ray.
    #[must_use]
    pub fn project_orthogonal_extended(&self, point: &Point2) -> Point2 {
        self.point + self.direction() * self.project_orthogonal_fractional_extended(point)
    }

    /// Orthogonal projection of `point` on the ray; `None` when it falls behind the origin.
    #[must_use]
    pub fn project_orthogonal(&self, point: &Point2) -> Option<Point2> {
        let t = self.project_orthogonal_fractional_extended(point);
        (t >= 0.0).then(|| self.point + self.direction() * t)
    }

    /// The same origin pointing the opposite way.
    #[must_use]
    pub fn flip(&self) -> Self {
        Self {
            point: self.point,
            phi: normalize_angle(self.phi + PI),
        }
    }
}

impl fmt::Display for Ray2d {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ray2d [x={}, y={}, phi={}]", self.point.x, self.point.y, self.phi)
    }
}

/// A half-line in space: an origin plus two direction angles.
///
/// `phi` is the azimuth in the XY plane, `theta` the polar angle from +z
/// (`0` points up, `π/2` lies in the XY plane).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray3d {
    point: Point3,
    phi: f64,
    theta: f64,
}

impl Ray3d {
    /// Creates a ray from an origin and two direction angles.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::NotFinite` for NaN or infinite inputs.
    pub fn new(point: Point3, phi: f64, theta: f64) -> Result<Self> {
        if !is_finite_point(&point) {
            return Err(GeometryError::Degenerate(format!("ray origin {point} is not finite")).into());
        }
        check_finite("phi", phi)?;
        check_finite("theta", theta)?;
        Ok(Self {
            point,
            phi: normalize_angle(phi),
            theta,
        })
    }

    /// Creates a ray starting at `point` that passes through `through`.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::Degenerate` if both points are equal.
    pub fn through(point: Point3, through: Point3) -> Result<Self> {
        Self::from_direction(point, through - point)
    }

    /// Creates a ray starting at `point` heading along `direction`.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::Degenerate` for a zero vector.
    pub fn from_direction(point: Point3, direction: Vector3) -> Result<Self> {
        if direction.x == 0.0 && direction.y == 0.0 && direction.z == 0.0 {
            return Err(GeometryError::Degenerate("ray direction has zero length".to_owned()).into());
        }
        let ray = Self::along(point, direction);
        Self::new(point, ray.phi, ray.theta)
    }

    /// Ray along a direction vector the caller already knows to be finite and non-zero.
    pub(crate) fn along(point: Point3, direction: Vector3) -> Self {
        Self {
            point,
            phi: direction.y.atan2(direction.x),
            theta: direction.x.hypot(direction.y).atan2(direction.z),
        }
    }

    /// Origin of the ray.
    #[must_use]
    pub fn point(&self) -> Point3 {
        self.point
    }

    /// Azimuth angle in `(-π, π]`.
    #[must_use]
    pub fn phi(&self) -> f64 {
        self.phi
    }

    /// Polar angle measured from +z.
    #[must_use]
    pub fn theta(&self) -> f64 {
        self.theta
    }

    /// Unit vector along the ray.
    #[must_use]
    pub fn direction(&self) -> Vector3 {
        let s = self.theta.sin();
        Vector3::new(s * self.phi.cos(), s * self.phi.sin(), self.theta.cos())
    }

    /// Ray with the same direction, moved `position` along this one.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::NotFinite` for NaN or infinite positions.
    pub fn location_extended(&self, position: f64) -> Result<Self> {
        check_finite("position", position)?;
        Ok(Self {
            point: self.point + self.direction() * position,
            ..*self
        })
    }

    /// Like [`Self::location_extended`], restricted to the half-line itself.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::ParameterOutOfRange` for negative positions.
    pub fn location(&self, position: f64) -> Result<Self> {
        if position < 0.0 {
            return Err(GeometryError::ParameterOutOfRange {
                parameter: "position",
                value: position,
                min: 0.0,
                max: f64::INFINITY,
            }
            .into());
        }
        self.location_extended(position)
    }

    /// Signed distance from the origin to the projection of `point` on the carrier line.
    #[must_use]
    pub fn project_orthogonal_fractional_extended(&self, point: &Point3) -> f64 {
        (point - self.point).dot(&self.direction())
    }

    /// Orthogonal projection of `point` on the carrier line of this ray.
    #[must_use]
    pub fn project_orthogonal_extended(&self, point: &Point3) -> Point3 {
        self.point + self.direction() * self.project_orthogonal_fractional_extended(point)
    }

    /// Orthogonal projection of `point` on the ray; `None` when it falls behind the origin.
    #[must_use]
    pub fn project_orthogonal(&self, point: &Point3) -> Option<Point3> {
        let t = self.project_orthogonal_fractional_extended(point);
        (t >= 0.0).then(|| self.point + self.direction() * t)
    }

    /// The same origin pointing the opposite way.
    #[must_use]
    pub fn flip(&self) -> Self {
        Self {
            point: self.point,
            phi: normalize_angle(self.phi + PI),
            theta: PI - self.theta,
        }
    }

    /// Drops z; the azimuth becomes the 2D heading.
    #[must_use]
    pub fn project(&self) -> Ray2d {
        Ray2d {
            point: self.point.xy(),
            phi: self.phi,
        }
    }
}

impl fmt::Display for Ray3d {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ray3d [x={}, y={}, z={}, phi={}, theta={}]",
            self.point.x, self.point.y, self.point.z, self.phi, self.theta
        )
    }
}

fn check_point_2d(point: &Point2) -> Result<()> {
    if is_finite_point(point) {
        Ok(())
    } else {
        Err(GeometryError::Degenerate(format!("ray origin {point} is not finite")).into())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn through_point_sets_angle() {
        let r = Ray2d::through(Point2::new(1.0, 1.0), Point2::new(1.0, 3.0)).unwrap();
        assert_abs_diff_eq!(r.phi(), FRAC_PI_2, epsilon = 1e-12);
        assert!(Ray2d::through(Point2::new(1.0, 1.0), Point2::new(1.0, 1.0)).is_err());
    }

    #[test]
    fn location_extended_moves_both_ways() {
        let r = Ray2d::new(Point2::new(0.0, 0.0), 0.0).unwrap();
        assert_eq!(r.location_extended(-2.0).unwrap().point(), Point2::new(-2.0, 0.0));
        assert!(r.location(-2.0).is_err());
        assert!(r.location_extended(f64::NAN).is_err());
    }

    #[test]
    fn projection_behind_origin_is_none() {
        let r = Ray2d::new(Point2::new(0.0, 0.0), 0.0).unwrap();
        assert!(r.project_orthogonal(&Point2::new(-1.0, 4.0)).is_none());
        assert_eq!(r.project_orthogonal(&Point2::new(3.0, 4.0)), Some(Point2::new(3.0, 0.0)));
        assert_abs_diff_eq!(r.project_orthogonal_fractional_extended(&Point2::new(-1.0, 4.0)), -1.0);
    }

    #[test]
    fn flip_reverses_heading() {
        let r = Ray2d::new(Point2::new(0.0, 0.0), 0.25).unwrap().flip();
        assert_abs_diff_eq!(r.phi(), 0.25 - PI, epsilon = 1e-12);
    }

    #[test]
    fn ray3d_direction_round_trip() {
        let dir = Vector3::new(1.0, 2.0, -2.0);
        let r = Ray3d::from_direction(Point3::new(0.0, 0.0, 0.0), dir).unwrap();
        let unit = r.direction();
        assert_abs_diff_eq!(unit, dir / 3.0, epsilon = 1e-12);
        let p = r.location_extended(3.0).unwrap().point();
        assert_abs_diff_eq!(p, Point3::new(1.0, 2.0, -2.0), epsilon = 1e-12);
    }

    #[test]
    fn ray3d_flip_and_project() {
        let r = Ray3d::through(Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 1.0, 1.0)).unwrap();
        let flipped = r.flip();
        assert_abs_diff_eq!(flipped.direction(), -r.direction(), epsilon = 1e-12);
        assert_abs_diff_eq!(r.project().phi(), FRAC_PI_2, epsilon = 1e-12);
    }
}
