pub mod distance;
pub mod intersect_2d;
pub mod polygon_2d;

use std::f64::consts::PI;

use crate::error::{GeometryError, Result};

/// 2D point type.
pub type Point2 = nalgebra::Point2<f64>;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 2D vector type.
pub type Vector2 = nalgebra::Vector2<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Point of any fixed dimension, used by the dimension-independent algorithms.
pub type PointN<const D: usize> = nalgebra::Point<f64, D>;

/// Vector of any fixed dimension.
pub type VectorN<const D: usize> = nalgebra::SVector<f64, D>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Fails with [`GeometryError::NotFinite`] when `value` is NaN or infinite.
///
/// # Errors
///
/// Returns `GeometryError::NotFinite` naming `parameter`.
pub fn check_finite(parameter: &'static str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(GeometryError::NotFinite { parameter, value }.into())
    }
}

/// Returns true when every coordinate of `point` is finite.
#[must_use]
pub fn is_finite_point<const D: usize>(point: &PointN<D>) -> bool {
    point.coords.iter().all(|c| c.is_finite())
}

/// Normalizes an angle into `(-π, π]`.
#[must_use]
pub fn normalize_angle(angle: f64) -> f64 {
    let mut a = angle % (2.0 * PI);
    if a <= -PI {
        a += 2.0 * PI;
    } else if a > PI {
        a -= 2.0 * PI;
    }
    a
}
