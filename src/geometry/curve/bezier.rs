use tracing::{debug, instrument};

use crate::error::{GeometryError, Result};
use crate::geometry::polyline::{PolyLine2d, PolyLine3d};
use crate::geometry::ray::{Ray2d, Ray3d};
use crate::math::{check_finite, is_finite_point, PointN, VectorN};

use super::{Curve, CurveDomain};

/// Sample count of [`Bezier2d::to_polyline_default`] and [`Bezier3d::to_polyline_default`].
pub const DEFAULT_BEZIER_SAMPLES: usize = 64;

/// Bisection depth limit for adaptive sampling.
const MAX_SUBDIVISION_DEPTH: u32 = 32;

/// A Bézier curve of any degree, evaluated in Bernstein form.
///
/// The curve starts at the first control point and ends at the last.
#[derive(Debug, Clone, PartialEq)]
pub struct Bezier<const D: usize> {
    control_points: Vec<PointN<D>>,
}

/// Bézier curve in the plane.
pub type Bezier2d = Bezier<2>;

/// Bézier curve in space.
pub type Bezier3d = Bezier<3>;

impl<const D: usize> Bezier<D> {
    /// Creates a curve of degree `control_points.len() - 1`.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::TooFewPoints` for fewer than 2 control points and
    /// `GeometryError::Degenerate` for non-finite coordinates.
    pub fn new(control_points: Vec<PointN<D>>) -> Result<Self> {
        if control_points.len() < 2 {
            return Err(GeometryError::TooFewPoints {
                required: 2,
                actual: control_points.len(),
            }
            .into());
        }
        if let Some(index) = control_points.iter().position(|p| !is_finite_point(p)) {
            return Err(GeometryError::Degenerate(format!("control point {index} has non-finite coordinates")).into());
        }
        Ok(Self { control_points })
    }

    /// Cubic curve through `start` and `end`.
    ///
    /// # Errors
    ///
    /// See [`Self::new`].
    pub fn cubic(start: PointN<D>, control1: PointN<D>, control2: PointN<D>, end: PointN<D>) -> Result<Self> {
        Self::new(vec![start, control1, control2, end])
    }

    #[must_use]
    pub fn control_points(&self) -> &[PointN<D>] {
        &self.control_points
    }

    #[must_use]
    pub fn degree(&self) -> usize {
        self.control_points.len() - 1
    }

    /// Bernstein sum over `points` at `t`; exact at `t = 0` and `t = 1`.
    fn bernstein(points: &[PointN<D>], t: f64) -> PointN<D> {
        let n = points.len() - 1;
        let s = 1.0 - t;
        let s_powers: Vec<f64> = std::iter::successors(Some(1.0), |acc| Some(acc * s)).take(n + 1).collect();
        let mut coefficient = 1.0;
        let mut t_power = 1.0;
        let mut sum = VectorN::<D>::zeros();
        for (i, p) in points.iter().enumerate() {
            sum += p.coords * (coefficient * t_power * s_powers[n - i]);
            coefficient = coefficient * (n - i) as f64 / (i + 1) as f64;
            t_power *= t;
        }
        PointN::from(sum)
    }

    fn point_at(&self, t: f64) -> PointN<D> {
        Self::bernstein(&self.control_points, t)
    }

    /// `n` points at evenly spaced parameters, both ends included.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::ParameterOutOfRange` for `n < 2`.
    pub fn sample(&self, n: usize) -> Result<Vec<PointN<D>>> {
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
        Ok((0..n)
            .map(|i| {
                if i == last {
                    self.control_points[self.degree()]
                } else {
                    self.point_at(i as f64 / last as f64)
                }
            })
            .collect())
    }

    /// Points whose chords stay within `epsilon` of the curve.
    ///
    /// An interval is bisected while the curve midpoint is more than `epsilon`
    /// from the chord midpoint, or while the quarter points lie on opposite
    /// sides of the chord (an inflection) more than `epsilon` away from it.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::InvalidParameter` unless `epsilon` is positive and finite.
    #[instrument(level = "debug", skip(self), fields(degree = self.degree()))]
    pub fn sample_adaptive(&self, epsilon: f64) -> Result<Vec<PointN<D>>> {
        check_finite("epsilon", epsilon)?;
        if epsilon <= 0.0 {
            return Err(GeometryError::InvalidParameter {
                parameter: "epsilon",
                reason: format!("must be positive, got {epsilon}"),
            }
            .into());
        }
        let start = self.control_points[0];
        let end = self.control_points[self.degree()];
        let mut points = vec![start];
        self.subdivide((0.0, start), (1.0, end), epsilon, 0, &mut points);
        points.push(end);
        debug!(points = points.len(), "adaptive bezier sampled");
        Ok(points)
    }

    /// Appends the interior points of `(t0, t1)`, excluding both ends.
    fn subdivide(
        &self,
        (t0, p0): (f64, PointN<D>),
        (t1, p1): (f64, PointN<D>),
        epsilon: f64,
        depth: u32,
        out: &mut Vec<PointN<D>>,
    ) {
        if depth >= MAX_SUBDIVISION_DEPTH {
            return;
        }
        let tm = (t0 + t1) / 2.0;
        let pm = self.point_at(tm);
        let mut split = nalgebra::distance(&pm, &nalgebra::center(&p0, &p1)) > epsilon;
        if !split {
            let q1 = self.point_at((t0 + tm) / 2.0);
            let q3 = self.point_at((tm + t1) / 2.0);
            let (o1, o3) = (chord_offset(&p0, &p1, &q1), chord_offset(&p0, &p1, &q3));
            split = o1.dot(&o3) < 0.0 && o1.norm().max(o3.norm()) > epsilon;
        }
        if split {
            self.subdivide((t0, p0), (tm, pm), epsilon, depth + 1, out);
            out.push(pm);
            self.subdivide((tm, pm), (t1, p1), epsilon, depth + 1, out);
        }
    }
}

/// Component of `q - a` perpendicular to the chord `a -> b`.
fn chord_offset<const D: usize>(a: &PointN<D>, b: &PointN<D>, q: &PointN<D>) -> VectorN<D> {
    let chord = b - a;
    let v = q - a;
    let len_sq = chord.norm_squared();
    if len_sq == 0.0 {
        return v;
    }
    v - chord * (v.dot(&chord) / len_sq)
}

impl<const D: usize> Curve<D> for Bezier<D> {
    fn evaluate(&self, t: f64) -> Result<PointN<D>> {
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

    fn tangent(&self, t: f64) -> Result<VectorN<D>> {
        if !self.domain().contains(t) {
            return Err(GeometryError::ParameterOutOfRange {
                parameter: "t",
                value: t,
                min: 0.0,
                max: 1.0,
            }
            .into());
        }
        let n = self.degree() as f64;
        let differences: Vec<PointN<D>> = self
            .control_points
            .windows(2)
            .map(|w| PointN::from((w[1] - w[0]) * n))
            .collect();
        Ok(Self::bernstein(&differences, t).coords)
    }

    fn domain(&self) -> CurveDomain {
        CurveDomain::new(0.0, 1.0)
    }
}

fn check_shape(shape: f64) -> Result<()> {
    if !shape.is_finite() || shape <= 0.0 {
        return Err(GeometryError::InvalidParameter {
            parameter: "shape",
            reason: format!("must be positive and finite, got {shape}"),
        }
        .into());
    }
    Ok(())
}

/// Distances of the two control points from their end points.
///
/// Unweighted, each gets half of `shape * distance`. Weighted, the total is
/// split by how far each end lies from the other ray's line.
fn control_distances(shape: f64, distance: f64, weighted: bool, d_start: f64, d_end: f64) -> (f64, f64) {
    let total = shape * distance;
    let sum = d_start + d_end;
    if weighted && sum > 0.0 {
        (total * d_start / sum, total * d_end / sum)
    } else {
        (total / 2.0, total / 2.0)
    }
}

impl Bezier2d {
    /// Cubic curve leaving `start` along its heading and arriving at `end` along its heading.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::InvalidParameter` unless `shape` is positive and finite.
    pub fn cubic_from_rays(start: &Ray2d, end: &Ray2d, shape: f64, weighted: bool) -> Result<Self> {
        check_shape(shape)?;
        let (p0, p3) = (start.point(), end.point());
        let d_start = nalgebra::distance(&p0, &end.project_orthogonal_extended(&p0));
        let d_end = nalgebra::distance(&p3, &start.project_orthogonal_extended(&p3));
        let (c1, c2) = control_distances(shape, nalgebra::distance(&p0, &p3), weighted, d_start, d_end);
        Self::cubic(p0, start.location(c1)?.point(), end.flip().location(c2)?.point(), p3)
    }

    /// Samples `n` points into a line.
    ///
    /// # Errors
    ///
    /// Fails for `n < 2` or when samples coincide.
    pub fn to_polyline(&self, n: usize) -> Result<PolyLine2d> {
        PolyLine2d::new(self.sample(n)?)
    }

    /// [`Self::to_polyline`] with [`DEFAULT_BEZIER_SAMPLES`] points.
    ///
    /// # Errors
    ///
    /// Fails when samples coincide.
    pub fn to_polyline_default(&self) -> Result<PolyLine2d> {
        self.to_polyline(DEFAULT_BEZIER_SAMPLES)
    }

    /// Adaptive sampling into a line.
    ///
    /// # Errors
    ///
    /// See [`Bezier::sample_adaptive`].
    pub fn to_polyline_adaptive(&self, epsilon: f64) -> Result<PolyLine2d> {
        PolyLine2d::new(self.sample_adaptive(epsilon)?)
    }
}

impl Bezier3d {
    /// Cubic curve leaving `start` along its heading and arriving at `end` along its heading.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::InvalidParameter` unless `shape` is positive and finite.
    pub fn cubic_from_rays(start: &Ray3d, end: &Ray3d, shape: f64, weighted: bool) -> Result<Self> {
        check_shape(shape)?;
        let (p0, p3) = (start.point(), end.point());
        let d_start = nalgebra::distance(&p0, &end.project_orthogonal_extended(&p0));
        let d_end = nalgebra::distance(&p3, &start.project_orthogonal_extended(&p3));
        let (c1, c2) = control_distances(shape, nalgebra::distance(&p0, &p3), weighted, d_start, d_end);
        Self::cubic(p0, start.location(c1)?.point(), end.flip().location(c2)?.point(), p3)
    }

    /// Samples `n` points into a line.
    ///
    /// # Errors
    ///
    /// Fails for `n < 2` or when samples coincide.
    pub fn to_polyline(&self, n: usize) -> Result<PolyLine3d> {
        PolyLine3d::new(self.sample(n)?)
    }

    /// [`Self::to_polyline`] with [`DEFAULT_BEZIER_SAMPLES`] points.
    ///
    /// # Errors
    ///
    /// Fails when samples coincide.
    pub fn to_polyline_default(&self) -> Result<PolyLine3d> {
        self.to_polyline(DEFAULT_BEZIER_SAMPLES)
    }

    /// Adaptive sampling into a line.
    ///
    /// # Errors
    ///
    /// See [`Bezier::sample_adaptive`].
    pub fn to_polyline_adaptive(&self, epsilon: f64) -> Result<PolyLine3d> {
        PolyLine3d::new(self.sample_adaptive(epsilon)?)
    }
}
