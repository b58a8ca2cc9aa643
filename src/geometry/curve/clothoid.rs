use tracing::{debug, instrument};

use crate::error::{GeometryError, Result};
use crate::geometry::polyline::PolyLine2d;
use crate::geometry::ray::Ray2d;
use crate::math::{normalize_angle, Point2, Vector2};

use super::{Curve, CurveDomain};

/// Sample count of [`Clothoid2d::to_polyline_default`].
pub const DEFAULT_CLOTHOID_SAMPLES: usize = 64;

/// Simpson intervals over the unit parameter range; must be even.
const FRESNEL_STEPS: u32 = 1024;

/// Simpson intervals between two consecutive samples; must be even.
const SAMPLE_STEPS: u32 = 16;

const MAX_NEWTON_ITERATIONS: usize = 50;
const NEWTON_TOLERANCE: f64 = 1e-12;

/// An Euler spiral: curvature changes linearly with arc length.
///
/// Built from two rays, it leaves the start ray along its heading and reaches
/// the end ray's point along the end heading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Clothoid2d {
    start: Ray2d,
    end: Ray2d,
    length: f64,
    curvature: f64,
    sharpness: f64,
}

/// Composite Simpson rule over `[t0, t1]` with an even number of `steps`.
fn simpson(f: impl Fn(f64) -> Vector2, t0: f64, t1: f64, steps: u32) -> Vector2 {
    let h = (t1 - t0) / f64::from(steps);
    let mut sum = f(t0) + f(t1);
    for k in 1..steps {
        let weight = if k % 2 == 1 { 4.0 } else { 2.0 };
        sum += f(t0 + f64::from(k) * h) * weight;
    }
    sum * (h / 3.0)
}

/// Generalised Fresnel integrals `∫₀¹ (cos, sin)(a/2·t² + b·t + c) dt`.
fn fresnel(a: f64, b: f64, c: f64) -> Vector2 {
    simpson(
        |t| {
            let angle = a / 2.0 * t * t + b * t + c;
            Vector2::new(angle.cos(), angle.sin())
        },
        0.0,
        1.0,
        FRESNEL_STEPS,
    )
}

impl Clothoid2d {
    /// Fits the clothoid joining `start` and `end` with matching headings.
    ///
    /// Both headings are measured against the chord; the curvature change
    /// that closes the lateral gap is found with Newton's method.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::Degenerate` when both rays start at the same
    /// point or no clothoid joins them.
    #[instrument(level = "debug", fields(phi0 = start.phi(), phi1 = end.phi()))]
    pub fn from_rays(start: &Ray2d, end: &Ray2d) -> Result<Self> {
        let chord = end.point() - start.point();
        let distance = chord.norm();
        if distance == 0.0 {
            return Err(GeometryError::Degenerate("clothoid start and end coincide".to_owned()).into());
        }
        let chord_angle = chord.y.atan2(chord.x);
        let phi0 = normalize_angle(start.phi() - chord_angle);
        let phi1 = normalize_angle(end.phi() - chord_angle);
        let delta = phi1 - phi0;

        let mut a = 3.0 * (phi0 + phi1);
        let mut converged = false;
        for iteration in 0..MAX_NEWTON_ITERATIONS {
            let gap = fresnel(2.0 * a, delta - a, phi0).y;
            let slope = simpson(
                |t| Vector2::new((a * t * t + (delta - a) * t + phi0).cos() * (t * t - t), 0.0),
                0.0,
                1.0,
                FRESNEL_STEPS,
            )
            .x;
            if slope == 0.0 || !slope.is_finite() {
                break;
            }
            let step = gap / slope;
            a -= step;
            if step.abs() < NEWTON_TOLERANCE {
                debug!(iteration, "clothoid fit converged");
                converged = true;
                break;
            }
        }
        let along = fresnel(2.0 * a, delta - a, phi0).x;
        if !converged || !a.is_finite() || along <= 0.0 {
            return Err(GeometryError::Degenerate(format!("no clothoid joins {start} and {end}")).into());
        }

        let length = distance / along;
        Ok(Self {
            start: *start,
            end: *end,
            length,
            curvature: (delta - a) / length,
            sharpness: 2.0 * a / (length * length),
        })
    }

    /// Arc length.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.length
    }

    #[must_use]
    pub fn start_curvature(&self) -> f64 {
        self.curvature
    }

    #[must_use]
    pub fn end_curvature(&self) -> f64 {
        self.curvature + self.sharpness * self.length
    }

    /// Curvature change per unit length.
    #[must_use]
    pub fn sharpness(&self) -> f64 {
        self.sharpness
    }

    /// Heading at parameter `t` in `[0, 1]`.
    fn heading(&self, t: f64) -> f64 {
        let s = t * self.length;
        self.start.phi() + self.curvature * s + self.sharpness * s * s / 2.0
    }

    fn unit_tangent(&self, t: f64) -> Vector2 {
        let heading = self.heading(t);
        Vector2::new(heading.cos(), heading.sin())
    }

    fn point_at(&self, t: f64) -> Point2 {
        self.start.point() + simpson(|u| self.unit_tangent(u), 0.0, t, FRESNEL_STEPS) * self.length
    }

    /// Point and heading at arc length `position`.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::ParameterOutOfRange` outside `[0, length]`.
    pub fn location(&self, position: f64) -> Result<Ray2d> {
        if position.is_nan() || position < 0.0 || position > self.length {
            return Err(GeometryError::ParameterOutOfRange {
                parameter: "position",
                value: position,
                min: 0.0,
                max: self.length,
            }
            .into());
        }
        let t = position / self.length;
        Ray2d::new(self.point_at(t), self.heading(t))
    }

    /// `n` points at equal arc length steps; the first and last are the ray points.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::ParameterOutOfRange` for `n < 2`.
    pub fn sample(&self, n: usize) -> Result<Vec<Point2>> {
        if n < 2 {
            return Err(GeometryError::ParameterOutOfRange {
                parameter: "n",
                value: n as f64,
                min: 2.0,
                max: f64::INFINITY,
            }
            .into());
        }
        let last = n - 1;
        let mut points = Vec::with_capacity(n);
        let mut p = self.start.point();
        points.push(p);
        for i in 1..last {
            let (t0, t1) = ((i - 1) as f64 / last as f64, i as f64 / last as f64);
            p += simpson(|u| self.unit_tangent(u), t0, t1, SAMPLE_STEPS) * self.length;
            points.push(p);
        }
        points.push(self.end.point());
        Ok(points)
    }

    /// Samples `n` points into a line.
    ///
    /// # Errors
    ///
    /// Fails for `n < 2`.
    pub fn to_polyline(&self, n: usize) -> Result<PolyLine2d> {
        PolyLine2d::new(self.sample(n)?)
    }

    /// [`Self::to_polyline`] with [`DEFAULT_CLOTHOID_SAMPLES`] points.
    ///
    /// # Errors
    ///
    /// Fails when samples coincide.
    pub fn to_polyline_default(&self) -> Result<PolyLine2d> {
        self.to_polyline(DEFAULT_CLOTHOID_SAMPLES)
    }
}

impl Curve<2> for Clothoid2d {
    fn evaluate(&self, t: f64) -> Result<Point2> {
        if !self.domain().contains(t) {
            return Err(GeometryError::ParameterOutOfRange {
                parameter: "t",
                value: t,
                min: 0.0,
                max: 1.0,
            }
            .into());
        }
        Ok(self.point_at(t))
    }

    fn tangent(&self, t: f64) -> Result<Vector2> {
        if !self.domain().contains(t) {
            return Err(GeometryError::ParameterOutOfRange {
                parameter: "t",
                value: t,
                min: 0.0,
                max: 1.0,
            }
            .into());
        }
        Ok(self.unit_tangent(t) * self.length)
    }

    fn domain(&self) -> CurveDomain {
        CurveDomain::new(0.0, 1.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::geometry::polyline::PolyLine;

    fn ray(x: f64, y: f64, phi: f64) -> Ray2d {
        Ray2d::new(Point2::new(x, y), phi).unwrap()
    }

    #[test]
    fn aligned_rays_give_a_straight_line() {
        let c = Clothoid2d::from_rays(&ray(0.0, 0.0, 0.0), &ray(10.0, 0.0, 0.0)).unwrap();
        assert_abs_diff_eq!(c.length(), 10.0, epsilon = 1e-12);
        assert_abs_diff_eq!(c.start_curvature(), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(c.sharpness(), 0.0, epsilon = 1e-12);
        let line = c.to_polyline_default().unwrap();
        assert_eq!(line.size(), DEFAULT_CLOTHOID_SAMPLES);
        for p in line.points() {
            assert_abs_diff_eq!(p.y, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn symmetric_turn_is_a_circular_arc() {
        let c = Clothoid2d::from_rays(&ray(0.0, 0.0, 0.0), &ray(1.0, 1.0, FRAC_PI_2)).unwrap();
        assert_abs_diff_eq!(c.length(), FRAC_PI_2, epsilon = 1e-9);
        assert_abs_diff_eq!(c.start_curvature(), 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(c.end_curvature(), 1.0, epsilon = 1e-9);
        let mid = c.location(c.length() / 2.0).unwrap();
        assert_abs_diff_eq!(
            mid.point(),
            Point2::new(FRAC_PI_4.sin(), 1.0 - FRAC_PI_4.cos()),
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(mid.phi(), FRAC_PI_4, epsilon = 1e-9);
    }

    #[test]
    fn reaches_end_point_with_end_heading() {
        let start = ray(0.0, 0.0, 0.3);
        let end = ray(5.0, 2.0, -0.4);
        let c = Clothoid2d::from_rays(&start, &end).unwrap();
        assert!(c.sharpness() != 0.0);
        let first = c.location(0.0).unwrap();
        assert_eq!(first.point(), start.point());
        assert_abs_diff_eq!(first.phi(), 0.3, epsilon = 1e-12);
        let last = c.location(c.length()).unwrap();
        assert_abs_diff_eq!(last.point(), end.point(), epsilon = 1e-9);
        assert_abs_diff_eq!(last.phi(), -0.4, epsilon = 1e-9);

        let line = c.to_polyline_default().unwrap();
        assert_eq!(line.first(), start.point());
        assert_eq!(line.last(), end.point());
        assert!(line.length() <= c.length());
        assert_abs_diff_eq!(line.length(), c.length(), epsilon = 1e-3);
    }

    #[test]
    fn s_curve_passes_through_its_centre() {
        let c = Clothoid2d::from_rays(&ray(0.0, 0.0, 0.0), &ray(5.0, 5.0, 0.0)).unwrap();
        assert_abs_diff_eq!(c.end_curvature(), -c.start_curvature(), epsilon = 1e-9);
        assert_abs_diff_eq!(c.evaluate(0.5).unwrap(), Point2::new(2.5, 2.5), epsilon = 1e-9);
        let tangent = c.tangent(1.0).unwrap();
        assert_abs_diff_eq!(tangent.y, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(tangent.x, c.length(), epsilon = 1e-9);
    }

    #[test]
    fn invalid_input_is_rejected() {
        assert!(Clothoid2d::from_rays(&ray(1.0, 1.0, 0.0), &ray(1.0, 1.0, 1.0)).is_err());
        let c = Clothoid2d::from_rays(&ray(0.0, 0.0, 0.0), &ray(10.0, 0.0, 0.0)).unwrap();
        assert!(c.to_polyline(1).is_err());
        assert!(c.location(-1.0).is_err());
        assert!(c.location(10.5).is_err());
        assert!(c.evaluate(1.5).is_err());
    }
}
