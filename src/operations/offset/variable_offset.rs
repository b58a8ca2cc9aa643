use std::cmp::Ordering;

use tracing::{debug, instrument};

use crate::error::{GeometryError, Result};
use crate::geometry::polyline::{DuplicateFilter, PolyLine, PolyLine2d};
use crate::math::check_finite;

use super::{OffsetParams, PolyLineOffset2d};

/// Offsets a 2D polyline by a distance that changes along its length.
///
/// `offsets[i]` applies at fractional position `fractions[i]`; in between, the
/// offset lines of both neighbours are blended linearly with
/// [`PolyLine::transition_line`].
#[derive(Debug)]
pub struct VariableOffset2d<'a> {
    line: &'a PolyLine2d,
    fractions: Vec<f64>,
    offsets: Vec<f64>,
    params: OffsetParams,
}

impl<'a> VariableOffset2d<'a> {
    #[must_use]
    pub fn new(line: &'a PolyLine2d, fractions: Vec<f64>, offsets: Vec<f64>) -> Self {
        Self {
            line,
            fractions,
            offsets,
            params: OffsetParams::default(),
        }
    }

    #[must_use]
    pub fn with_params(mut self, params: OffsetParams) -> Self {
        self.params = params;
        self
    }

    /// Executes the variable offset.
    ///
    /// # Errors
    ///
    /// - `GeometryError::LengthMismatch` if there are not as many offsets as fractions
    /// - `GeometryError::InvalidParameter` unless fractions run strictly upwards from 0 to 1
    /// - any error of the constant offsets it is built from
    #[instrument(level = "debug", skip(self), fields(stops = self.fractions.len()))]
    pub fn execute(&self) -> Result<PolyLine2d> {
        self.validate()?;

        let lines = self
            .offsets
            .iter()
            .map(|&offset| PolyLineOffset2d::new(self.line, offset).with_params(self.params).execute())
            .collect::<Result<Vec<_>>>()?;

        let mut points = Vec::new();
        for (i, window) in self.fractions.windows(2).enumerate() {
            let (start, end) = (window[0], window[1]);
            let from = lines[i].extract_fractional(start, end)?;
            let to = lines[i + 1].extract_fractional(start, end)?;
            let blended = from.transition_line(&to, |f| f)?;
            for p in blended.points() {
                if points.last() != Some(p) {
                    points.push(*p);
                }
            }
        }
        debug!(points = points.len(), "variable offset blended");

        PolyLine2d::with_filter(points, DuplicateFilter::Epsilon(0.0))
    }

    fn validate(&self) -> Result<()> {
        validate_stops(&self.fractions, &self.offsets)
    }
}

/// Checks `(fraction, offset)` stops: equal counts, at least two, finite
/// offsets, fractions strictly ascending from 0 to 1.
pub(crate) fn validate_stops(fractions: &[f64], offsets: &[f64]) -> Result<()> {
    if offsets.len() != fractions.len() {
        return Err(GeometryError::LengthMismatch {
            parameter: "offsets",
            expected: fractions.len(),
            actual: offsets.len(),
        }
        .into());
    }
    if fractions.len() < 2 {
        return Err(GeometryError::InvalidParameter {
            parameter: "fractions",
            reason: format!("need at least 2 stops, got {}", fractions.len()),
        }
        .into());
    }
    for &offset in offsets {
        check_finite("offset", offset)?;
    }
    let first = fractions[0];
    let last = fractions[fractions.len() - 1];
    if first != 0.0 || last != 1.0 {
        return Err(GeometryError::InvalidParameter {
            parameter: "fractions",
            reason: format!("must start at 0 and end at 1, got {first} .. {last}"),
        }
        .into());
    }
    if let Some(pair) = fractions
        .windows(2)
        .find(|pair| !matches!(pair[0].partial_cmp(&pair[1]), Some(Ordering::Less)))
    {
        return Err(GeometryError::InvalidParameter {
            parameter: "fractions",
            reason: format!("must be strictly ascending, got {} then {}", pair[0], pair[1]),
        }
        .into());
    }
    Ok(())
}
