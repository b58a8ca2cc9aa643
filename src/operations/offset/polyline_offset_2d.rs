use std::f64::consts::FRAC_PI_2;

use tracing::{debug, instrument};

use crate::error::Result;
use crate::geometry::polyline::{DuplicateFilter, LineKind, PolyLine, PolyLine2d};
use crate::math::distance::point_to_segment_dist;
use crate::math::intersect_2d::segment_segment_intersect_2d;
use crate::math::{check_finite, normalize_angle, Point2, Vector2};

use super::OffsetParams;

/// Upper bound on the number of chords in one corner arc.
const MAX_ARC_SEGMENTS: u32 = 1 << 16;

/// Offsets a 2D polyline by a signed distance.
///
/// # Algorithm
///
/// 1. Offsets below `minimum_offset` return the reference line unchanged.
/// 2. The reference line is noise filtered at [`OffsetParams::noise_level`],
///    so jitter in the input is not amplified.
/// 3. Every segment is translated along its left normal by the offset.
/// 4. At each interior vertex:
///    - **Outside of the turn**: the gap is closed by an arc fan around the
///      vertex. The chord count doubles until the sagitta is below
///      `circle_precision`.
///    - **Inside of the turn**: earlier offset segments are intersected with the
///      new one so the inner corner becomes a miter instead of a loop.
/// 5. Interior points closer than `|offset| - circle_precision` to the
///    reference line, or never at `|offset|` from it, are dropped.
///
/// Step 5 is a heuristic; strongly self-intersecting input can still leave
/// artifacts.
///
/// # Sign Convention
///
/// - Positive offset: left of the walking direction
/// - Negative offset: right of the walking direction
#[derive(Debug)]
pub struct PolyLineOffset2d<'a> {
    line: &'a PolyLine2d,
    offset: f64,
    params: OffsetParams,
}

impl<'a> PolyLineOffset2d<'a> {
    /// Creates a new offset operation with default parameters.
    #[must_use]
    pub fn new(line: &'a PolyLine2d, offset: f64) -> Self {
        Self {
            line,
            offset,
            params: OffsetParams::default(),
        }
    }

    /// Replaces the tuning parameters.
    #[must_use]
    pub fn with_params(mut self, params: OffsetParams) -> Self {
        self.params = params;
        self
    }

    /// Executes the offset operation.
    ///
    /// # Errors
    ///
    /// - `GeometryError::NotFinite` if the offset is NaN or infinite
    /// - `GeometryError::InvalidParameter` if the parameters do not validate
    /// - a construction error if the offset collapses to fewer than 2 points
    #[instrument(level = "debug", skip(self), fields(offset = self.offset, points = self.line.size()))]
    pub fn execute(&self) -> Result<PolyLine2d> {
        check_finite("offset", self.offset)?;
        self.params.validate()?;

        if self.params.is_negligible(self.offset) {
            return Ok(self.line.clone());
        }

        if let LineKind::Degenerate { heading } = self.line.kind() {
            let shifted = heading.point() + left_normal(heading.phi()) * self.offset;
            return PolyLine2d::degenerate(shifted, heading.phi());
        }

        let reference = self.line.noise_filtered_line(self.params.noise_level(self.offset));
        let raw = self.build_raw_offset(reference.points());
        let raw_count = raw.len();
        let kept = self.remove_close_points(&raw, reference.points());
        debug!(raw = raw_count, kept = kept.len(), "offset points built");

        PolyLine2d::with_filter(kept, DuplicateFilter::Epsilon(0.0))
    }

    /// Steps 3 and 4: translated segments joined by arc fans and miters.
    fn build_raw_offset(&self, reference: &[Point2]) -> Vec<Point2> {
        let mut out: Vec<Point2> = Vec::with_capacity(reference.len() * 2);
        let mut prev_point = reference[0];
        let mut prev_angle: Option<f64> = None;

        for next_point in &reference[1..] {
            let delta = next_point - prev_point;
            let angle = delta.y.atan2(delta.x);
            let shift = left_normal(angle) * self.offset;
            let mut segment_from = prev_point + shift;
            let segment_to = next_point + shift;
            let mut add_from = true;

            if let Some(prev_angle) = prev_angle {
                let turn = normalize_angle(angle - prev_angle);
                if turn * self.offset <= 0.0 {
                    add_from = !self.push_arc(&mut out, prev_point, prev_angle, turn, &segment_from, &segment_to);
                } else {
                    segment_from = miter_inside(&mut out, angle, segment_from, &segment_to);
                }
            }

            if add_from {
                out.push(segment_from);
            }
            out.push(segment_to);
            prev_point = *next_point;
            prev_angle = Some(angle);
        }
        out
    }

    /// Appends the arc fan around `center` from `prev_angle` over `turn`.
    ///
    /// Returns true when the fan ran into the next offset segment; the crossing
    /// then replaces that segment's start point.
    fn push_arc(
        &self,
        out: &mut Vec<Point2>,
        center: Point2,
        prev_angle: f64,
        turn: f64,
        segment_from: &Point2,
        segment_to: &Point2,
    ) -> bool {
        let distance = self.offset.abs();
        let precision = self.params.circle_precision;

        let mut segments: u32 = if turn.abs() > FRAC_PI_2 { 2 } else { 1 };
        while segments < MAX_ARC_SEGMENTS
            && distance * (1.0 - (turn / f64::from(segments) / 2.0).cos().abs()) >= precision
        {
            segments *= 2;
        }

        let Some(mut prev_arc_point) = out.last().copied() else {
            return false;
        };
        for k in 1..segments {
            let angle = prev_angle + turn * f64::from(k) / f64::from(segments);
            let arc_point = center + left_normal(angle) * self.offset;

            let existing = out.len();
            for i in 1..existing {
                let (from, to) = (out[i - 1], out[i]);
                if let Some(crossing) = segment_segment_intersect_2d(&prev_arc_point, &arc_point, &from, &to) {
                    if nalgebra::distance(&crossing, &prev_arc_point) > precision
                        && nalgebra::distance(&crossing, &from) > precision
                        && nalgebra::distance(&crossing, &to) > precision
                    {
                        out.push(crossing);
                    }
                }
            }

            let last = out[existing - 1];
            if let Some(hit) = segment_segment_intersect_2d(&last, &arc_point, segment_from, segment_to) {
                out.push(hit);
                return true;
            }
            out.push(arc_point);
            prev_arc_point = arc_point;
        }
        false
    }

    /// Step 5.
    fn remove_close_points(&self, points: &[Point2], reference: &[Point2]) -> Vec<Point2> {
        let distance = self.offset.abs();
        let too_close = distance - self.params.circle_precision;
        let at_distance = distance + self.params.minimum_offset;
        let last = points.len().saturating_sub(1);

        points
            .iter()
            .enumerate()
            .filter(|&(index, p)| {
                if index == 0 || index == last {
                    return true;
                }
                let mut somewhere_at_distance = false;
                for pair in reference.windows(2) {
                    let d = point_to_segment_dist(p, &pair[0], &pair[1]);
                    if d < too_close {
                        return false;
                    }
                    if d < at_distance {
                        somewhere_at_distance = true;
                    }
                }
                somewhere_at_distance
            })
            .map(|(_, p)| *p)
            .collect()
    }
}

/// Unit normal to the left of heading `angle`.
fn left_normal(angle: f64) -> Vector2 {
    Vector2::new(-angle.sin(), angle.cos())
}

/// Intersects the earlier offset segments with the new one at an inside turn.
///
/// A crossing with the most recent segment cuts that segment short and
/// becomes the new segment start, which is returned.
fn miter_inside(out: &mut Vec<Point2>, angle: f64, mut segment_from: Point2, segment_to: &Point2) -> Point2 {
    let existing = out.len();
    for i in 1..existing {
        if i >= out.len() {
            break;
        }
        let (from, to) = (out[i - 1], out[i]);
        let is_last = i == out.len() - 1;
        let segment_angle = (to.y - from.y).atan2(to.x - from.x);
        if normalize_angle(angle - segment_angle) != 0.0 {
            if let Some(crossing) = segment_segment_intersect_2d(&from, &to, &segment_from, segment_to) {
                if is_last {
                    out.pop();
                    segment_from = crossing;
                } else {
                    out.push(crossing);
                }
            }
        } else if is_last {
            // parallel to the latest segment: continue from its start
            out.pop();
            if let Some(start) = out.pop() {
                segment_from = start;
            }
        }
    }
    segment_from
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::geometry::polyline::PolyLine;

    fn line(coords: &[(f64, f64)]) -> PolyLine2d {
        PolyLine2d::new(coords.iter().map(|&(x, y)| Point2::new(x, y)).collect()).unwrap()
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    }

    #[test]
    fn straight_line_offset_is_exact() {
        let l = line(&[(0.0, 0.0), (10.0, 0.0)]);
        let left = PolyLineOffset2d::new(&l, 2.0).execute().unwrap();
        assert_eq!(left.points(), &[Point2::new(0.0, 2.0), Point2::new(10.0, 2.0)]);
        let right = PolyLineOffset2d::new(&l, -2.0).execute().unwrap();
        assert_eq!(right.points(), &[Point2::new(0.0, -2.0), Point2::new(10.0, -2.0)]);
    }

    #[test]
    fn diagonal_offset_is_parallel() {
        let l = line(&[(1.0, 1.0), (4.0, 5.0)]);
        let o = PolyLineOffset2d::new(&l, 0.5).execute().unwrap();
        assert_eq!(o.size(), 2);
        for p in o.points() {
            assert_abs_diff_eq!(point_to_segment_dist(p, &l.first(), &l.last()), 0.5, epsilon = 1e-12);
        }
        assert_abs_diff_eq!(o.length(), l.length(), epsilon = 1e-12);
    }

    #[test]
    fn inside_corner_is_mitered() {
        init_tracing();
        let l = line(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]);
        let o = PolyLineOffset2d::new(&l, 1.0).execute().unwrap();
        assert_eq!(o.size(), 3);
        assert_abs_diff_eq!(o.points()[0], Point2::new(0.0, 1.0), epsilon = 1e-12);
        assert_abs_diff_eq!(o.points()[1], Point2::new(9.0, 1.0), epsilon = 1e-12);
        assert_abs_diff_eq!(o.points()[2], Point2::new(9.0, 10.0), epsilon = 1e-12);
    }

    #[test]
    fn outside_corner_gets_arc_fan() {
        init_tracing();
        let l = line(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]);
        let o = PolyLineOffset2d::new(&l, -1.0).execute().unwrap();
        // two translated segments plus 31 interior arc points
        assert_eq!(o.size(), 35);
        assert_abs_diff_eq!(o.first(), Point2::new(0.0, -1.0), epsilon = 1e-12);
        assert_abs_diff_eq!(o.last(), Point2::new(11.0, 10.0), epsilon = 1e-12);
        let corner = Point2::new(10.0, 0.0);
        for p in &o.points()[1..o.size() - 1] {
            assert_abs_diff_eq!(nalgebra::distance(p, &corner), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn coarser_precision_needs_fewer_arc_points() {
        let l = line(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]);
        let params = OffsetParams {
            circle_precision: 0.1,
            ..OffsetParams::default()
        };
        let o = PolyLineOffset2d::new(&l, -1.0).with_params(params).execute().unwrap();
        // 1 - cos(pi / 8) < 0.1, so two chords
        assert_eq!(o.size(), 5);
    }

    fn distance_to_line(p: &Point2, l: &PolyLine2d) -> f64 {
        l.points()
            .windows(2)
            .map(|pair| point_to_segment_dist(p, &pair[0], &pair[1]))
            .fold(f64::INFINITY, f64::min)
    }

    #[test]
    fn short_zigzag_step_is_cleaned_up() {
        init_tracing();
        // the 0.5 step is shorter than the offset, so the inside miter and the
        // start of the outside arc end up too close to the reference
        let l = line(&[(0.0, 0.0), (10.0, 0.0), (10.0, 0.5), (20.0, 0.5)]);
        let op = PolyLineOffset2d::new(&l, 2.0);
        let raw = op.build_raw_offset(l.points());
        let kept = op.remove_close_points(&raw, l.points());
        assert!(raw.len() > kept.len());
        let near = |points: &[Point2], p: &Point2| points.iter().any(|q| nalgebra::distance(p, q) < 1e-9);
        for p in [Point2::new(10.0, 2.0), Point2::new(8.0, 0.0), Point2::new(8.0, 0.5)] {
            assert!(near(&raw, &p), "{p} missing from the raw offset");
            assert!(!near(&kept, &p), "{p} survived the cleanup");
        }

        let o = op.execute().unwrap();
        assert_eq!(o.first(), Point2::new(0.0, 2.0));
        assert_eq!(o.last(), Point2::new(20.0, 2.5));
        let too_close = 2.0 - OffsetParams::default().circle_precision;
        for p in o.points() {
            assert!(distance_to_line(p, &l) >= too_close - 1e-12, "{p} is too close to the reference");
        }
    }

    #[test]
    fn inside_offset_of_tight_arc_is_cleaned_up() {
        // radius 1, offset 2 towards the centre
        let arc: Vec<(f64, f64)> = (0..=15)
            .map(|i| {
                let a = std::f64::consts::PI * f64::from(i) / 15.0;
                (a.cos(), a.sin())
            })
            .collect();
        let l = line(&arc);
        let params = OffsetParams::default();
        let op = PolyLineOffset2d::new(&l, 2.0);
        let reference = l.noise_filtered_line(params.noise_level(2.0));
        assert_eq!(reference.size(), l.size());
        let raw = op.build_raw_offset(reference.points());
        let kept = op.remove_close_points(&raw, reference.points());
        assert!(raw.len() > kept.len());
        let too_close = 2.0 - params.circle_precision;
        for p in &kept[1..kept.len() - 1] {
            assert!(distance_to_line(p, &l) >= too_close - 1e-12, "{p} is too close to the reference");
        }
        let o = op.execute().unwrap();
        assert!(o.size() < raw.len());
    }

    #[test]
    fn negligible_offset_returns_reference() {
        let l = line(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]);
        let o = PolyLineOffset2d::new(&l, 1e-6).execute().unwrap();
        assert_eq!(o, l);
    }

    #[test]
    fn invalid_input_is_rejected() {
        let l = line(&[(0.0, 0.0), (10.0, 0.0)]);
        assert!(PolyLineOffset2d::new(&l, f64::NAN).execute().is_err());
        let params = OffsetParams {
            circle_precision: -1.0,
            ..OffsetParams::default()
        };
        assert!(PolyLineOffset2d::new(&l, 1.0).with_params(params).execute().is_err());
    }

    #[test]
    fn degenerate_line_moves_sideways() {
        let d = PolyLine2d::degenerate(Point2::new(0.0, 0.0), 0.0).unwrap();
        let o = PolyLineOffset2d::new(&d, 1.0).execute().unwrap();
        assert!(o.is_degenerate());
        assert_abs_diff_eq!(o.first(), Point2::new(0.0, 1.0), epsilon = 1e-12);
    }
}
