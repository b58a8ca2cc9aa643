use super::{PointN, Point2};

/// Fractional position of the orthogonal projection of `point` on the
/// infinite line through `a` and `b`.
///
/// `0` maps to `a`, `1` maps to `b`; values outside `[0, 1]` lie on the
/// extension. Returns `0` when `a == b`.
#[must_use]
pub fn fraction_on_segment<const D: usize>(point: &PointN<D>, a: &PointN<D>, b: &PointN<D>) -> f64 {
    let d = b - a;
    let len_sq = d.norm_squared();
    if len_sq == 0.0 {
        return 0.0;
    }
    (point - a).dot(&d) / len_sq
}

/// Point at fraction `t` between `a` and `b` (extrapolates outside `[0, 1]`).
///
/// Exact at `t = 0` and `t = 1`.
#[must_use]
pub fn interpolate<const D: usize>(a: &PointN<D>, b: &PointN<D>, t: f64) -> PointN<D> {
    a.lerp(b, t)
}

/// Closest point to `point` on the segment from `a` to `b`.
///
/// Projections falling outside the segment snap to the nearest endpoint.
#[must_use]
pub fn closest_point_on_segment<const D: usize>(
    point: &PointN<D>,
    a: &PointN<D>,
    b: &PointN<D>,
) -> PointN<D> {
    let t = fraction_on_segment(point, a, b);
    if t <= 0.0 {
        *a
    } else if t >= 1.0 {
        *b
    } else {
        interpolate(a, b, t)
    }
}

/// Returns the minimum distance from `point` to the segment from `a` to `b`.
#[must_use]
pub fn point_to_segment_dist<const D: usize>(point: &PointN<D>, a: &PointN<D>, b: &PointN<D>) -> f64 {
    nalgebra::distance(point, &closest_point_on_segment(point, a, b))
}

/// Z component of the cross product of `(b - a)` and `(c - b)`.
///
/// Positive for a left (counter-clockwise) turn at `b`.
#[must_use]
pub fn turn_cross(a: &Point2, b: &Point2, c: &Point2) -> f64 {
    let u = b - a;
    let v = c - b;
    u.x * v.y - u.y * v.x
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Point3, TOLERANCE};

    #[test]
    fn segment_dist_perpendicular_projection() {
        let d = point_to_segment_dist(
            &Point2::new(1.0, 1.0),
            &Point2::new(0.0, 0.0),
            &Point2::new(2.0, 0.0),
        );
        assert!((d - 1.0).abs() < TOLERANCE, "d={d}");
    }

    #[test]
    fn segment_dist_endpoint_closest() {
        let d = point_to_segment_dist(
            &Point2::new(-1.0, 0.0),
            &Point2::new(0.0, 0.0),
            &Point2::new(2.0, 0.0),
        );
        assert!((d - 1.0).abs() < TOLERANCE, "d={d}");
    }

    #[test]
    fn segment_dist_degenerate() {
        let d = point_to_segment_dist(
            &Point2::new(3.0, 4.0),
            &Point2::new(0.0, 0.0),
            &Point2::new(0.0, 0.0),
        );
        assert!((d - 5.0).abs() < TOLERANCE, "d={d}");
    }

    #[test]
    fn fraction_extends_past_end() {
        let t = fraction_on_segment(
            &Point3::new(3.0, 5.0, 0.0),
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(2.0, 0.0, 0.0),
        );
        assert!((t - 1.5).abs() < TOLERANCE);
    }

    #[test]
    fn closest_point_snaps_to_start() {
        let p = closest_point_on_segment(
            &Point3::new(-4.0, 1.0, 1.0),
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(0.0, 0.0, 2.0),
        );
        assert_eq!(p, Point3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn interpolate_is_exact_at_ends() {
        let a = Point2::new(0.1, 0.7);
        let b = Point2::new(3.3, -1.9);
        assert_eq!(interpolate(&a, &b, 0.0), a);
        assert_eq!(interpolate(&a, &b, 1.0), b);
    }

    #[test]
    fn turn_sign() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(1.0, 0.0);
        assert!(turn_cross(&a, &b, &Point2::new(1.0, 1.0)) > 0.0);
        assert!(turn_cross(&a, &b, &Point2::new(1.0, -1.0)) < 0.0);
        assert!(turn_cross(&a, &b, &Point2::new(2.0, 0.0)).abs() < TOLERANCE);
    }
}
