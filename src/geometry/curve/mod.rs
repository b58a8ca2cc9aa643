mod bezier;
mod clothoid;

pub use bezier::{Bezier, Bezier2d, Bezier3d, DEFAULT_BEZIER_SAMPLES};
pub use clothoid::{Clothoid2d, DEFAULT_CLOTHOID_SAMPLES};

use crate::error::Result;
use crate::math::{PointN, VectorN};

/// Parameter domain for a curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveDomain {
    /// Start of the parameter range.
    pub t_min: f64,
    /// End of the parameter range.
    pub t_max: f64,
}

impl CurveDomain {
    /// Creates a new curve domain.
    #[must_use]
    pub fn new(t_min: f64, t_max: f64) -> Self {
        Self { t_min, t_max }
    }

    /// True when `t` lies in the closed range.
    #[must_use]
    pub fn contains(&self, t: f64) -> bool {
        t >= self.t_min && t <= self.t_max
    }
}

/// A parametric curve in `D` dimensions.
pub trait Curve<const D: usize> {
    /// Evaluates the curve at parameter `t`.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameter is outside [`Self::domain`].
    fn evaluate(&self, t: f64) -> Result<PointN<D>>;

    /// Derivative with respect to `t`.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameter is outside [`Self::domain`].
    fn tangent(&self, t: f64) -> Result<VectorN<D>>;

    /// Returns the parameter domain of the curve.
    fn domain(&self) -> CurveDomain;
}
