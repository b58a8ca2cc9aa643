//! Dimension-independent algorithms over a point sequence and its
//! cumulative length index. `PolyLine2d` and `PolyLine3d` both delegate here.

use crate::error::{GeometryError, InternalError, OperationError, Result};
use crate::geometry::bounds::Bounds;
use crate::math::distance::{fraction_on_segment, interpolate};
use crate::math::{is_finite_point, PointN, VectorN};

use super::{DuplicateFilter, ProjectionMode};

/// Merges adjacent points closer than the filter epsilon.
///
/// The first point of a run is kept, except at the very end of the sequence
/// where the final input point replaces the kept one so the line still ends
/// where the input ends.
pub(crate) fn filter_points<const D: usize>(
    points: Vec<PointN<D>>,
    filter: DuplicateFilter,
) -> Result<Vec<PointN<D>>> {
    let epsilon = match filter {
        DuplicateFilter::Disabled => return Ok(points),
        DuplicateFilter::Epsilon(epsilon) => epsilon,
    };
    if epsilon.is_nan() || epsilon < 0.0 {
        return Err(GeometryError::InvalidParameter {
            parameter: "epsilon",
            reason: format!("must be a non-negative number, got {epsilon}"),
        }
        .into());
    }
    let epsilon_sq = epsilon * epsilon;
    let count = points.len();
    let mut out: Vec<PointN<D>> = Vec::with_capacity(count);
    for (i, p) in points.into_iter().enumerate() {
        let merge = out
            .last()
            .is_some_and(|prev| *prev == p || nalgebra::distance_squared(prev, &p) < epsilon_sq);
        if !merge {
            out.push(p);
        } else if i == count - 1 && out.len() > 1 {
            if let Some(last) = out.last_mut() {
                *last = p;
            }
        }
    }
    Ok(out)
}

/// Validates a point sequence and measures it in one pass.
///
/// Returns the cumulative length at every point together with the bounding box.
pub(crate) fn measure<const D: usize>(points: &[PointN<D>]) -> Result<(Vec<f64>, Bounds<D>)> {
    let Some(first) = points.first() else {
        return Err(GeometryError::TooFewPoints {
            required: 2,
            actual: 0,
        }
        .into());
    };
    if points.len() < 2 {
        return Err(GeometryError::TooFewPoints {
            required: 2,
            actual: points.len(),
        }
        .into());
    }
    let mut lengths = Vec::with_capacity(points.len());
    let mut bounds = Bounds::from_corners(first, first);
    let mut total = 0.0;
    lengths.push(total);
    for (i, p) in points.iter().enumerate() {
        if !is_finite_point(p) {
            return Err(GeometryError::Degenerate(format!("point {i} has non-finite coordinates")).into());
        }
        if i == 0 {
            continue;
        }
        let prev = &points[i - 1];
        if prev == p {
            return Err(GeometryError::Degenerate(format!(
                "degenerate line; point {} has the same coordinates as point {i}",
                i - 1
            ))
            .into());
        }
        total += nalgebra::distance(prev, p);
        lengths.push(total);
        bounds.include(p);
    }
    Ok((lengths, bounds))
}

/// Index `i` of the segment with `lengths[i] <= position <= lengths[i + 1]`.
///
/// A position equal to an interior cumulative length returns that point's
/// index; the end of the line returns the last segment.
pub(crate) fn find(lengths: &[f64], position: f64) -> Result<usize> {
    if position == 0.0 {
        return Ok(0);
    }
    let segments = lengths.len().saturating_sub(1);
    let mut lo = 0;
    let mut hi = segments;
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if position < lengths[mid] {
            hi = mid;
        } else if position > lengths[mid + 1] {
            lo = mid + 1;
        } else if position == lengths[mid + 1] && mid + 1 < segments {
            return Ok(mid + 1);
        } else {
            return Ok(mid);
        }
    }
    Err(InternalError::InvariantViolated(format!(
        "could not find position {position} on line with length {}",
        lengths.last().copied().unwrap_or(0.0)
    ))
    .into())
}

/// Point at `position` within segment `index`, exact on both vertices.
pub(crate) fn point_at<const D: usize>(
    points: &[PointN<D>],
    lengths: &[f64],
    index: usize,
    position: f64,
) -> PointN<D> {
    if position == lengths[index] {
        return points[index];
    }
    if position == lengths[index + 1] {
        return points[index + 1];
    }
    let t = (position - lengths[index]) / (lengths[index + 1] - lengths[index]);
    interpolate(&points[index], &points[index + 1], t)
}

/// Point at `position`, clamped into `[0, length]`.
pub(crate) fn position_at<const D: usize>(points: &[PointN<D>], lengths: &[f64], position: f64) -> Result<PointN<D>> {
    let length = lengths[lengths.len() - 1];
    if position <= 0.0 {
        return Ok(points[0]);
    }
    if position >= length {
        return Ok(points[points.len() - 1]);
    }
    let index = find(lengths, position)?;
    Ok(point_at(points, lengths, index, position))
}

/// Point and direction vector at `position`, which must lie in `[0, length]`.
///
/// At the end of the line the direction is that of the last segment, so the
/// point `2 * last - second_to_last` lies on the returned heading.
pub(crate) fn location<const D: usize>(
    points: &[PointN<D>],
    lengths: &[f64],
    position: f64,
) -> Result<(PointN<D>, VectorN<D>)> {
    let n = points.len();
    if position == 0.0 {
        return Ok((points[0], points[1] - points[0]));
    }
    if position == lengths[n - 1] {
        return Ok((points[n - 1], points[n - 1] - points[n - 2]));
    }
    let index = find(lengths, position)?;
    Ok((
        point_at(points, lengths, index, position),
        points[index + 1] - points[index],
    ))
}

/// Like [`location`], but positions before the start or beyond the end are
/// extrapolated along the first or last segment.
///
/// A far extrapolation over a very short end segment can overflow; the chord
/// then grows one segment at a time until the result is finite.
pub(crate) fn location_extended<const D: usize>(
    points: &[PointN<D>],
    lengths: &[f64],
    position: f64,
) -> Result<(PointN<D>, VectorN<D>)> {
    let n = points.len();
    let length = lengths[n - 1];
    if (0.0..=length).contains(&position) {
        return location(points, lengths, position);
    }
    if position < 0.0 {
        for after in 1..n {
            let fraction = position / lengths[after];
            let delta = points[after] - points[0];
            let p = points[0] + delta * fraction;
            if fraction.is_finite() && is_finite_point(&p) {
                return Ok((p, delta));
            }
        }
    } else {
        let last = n - 1;
        let beyond = position - length;
        for before in (0..last).rev() {
            let fraction = beyond / (lengths[last] - lengths[before]);
            let delta = points[last] - points[before];
            let p = points[last] + delta * fraction;
            if fraction.is_finite() && is_finite_point(&p) {
                return Ok((p, delta));
            }
        }
    }
    tracing::warn!(position, length, "extrapolation overflowed on every segment");
    Err(OperationError::ExtrapolationOverflow { position }.into())
}

/// Fractional position of the orthogonal projection of `point`.
///
/// Two minima are tracked: the best projection allowed by `mode`, and the best
/// projection when the first and last segments may be extended. Without the
/// second one, a point just beyond an end would snap to an interior segment
/// whenever it happens to lie inside that segment's perpendicular band.
pub(crate) fn project_fractional<const D: usize>(
    points: &[PointN<D>],
    lengths: &[f64],
    point: &PointN<D>,
    mode: ProjectionMode,
) -> Option<f64> {
    let n = points.len();
    let last_segment = n - 2;
    let mut best_distance = f64::INFINITY;
    let mut best_distance_extended = f64::INFINITY;
    let mut result = None;
    for i in 0..=last_segment {
        let (a, b) = (&points[i], &points[i + 1]);
        let t = fraction_on_segment(point, a, b);
        let distance = nalgebra::distance(point, &interpolate(a, b, t));
        let in_range = (0.0..=1.0).contains(&t);
        let before_start = t < 0.0 && i == 0;
        let beyond_end = t > 1.0 && i == last_segment;
        if distance < best_distance_extended && (in_range || before_start || beyond_end) {
            best_distance_extended = distance;
        }
        if in_range || (mode == ProjectionMode::Extend && (before_start || beyond_end)) {
            if distance < best_distance {
                best_distance = distance;
                result = Some(lengths[i] + t * (lengths[i + 1] - lengths[i]));
            }
        } else if mode == ProjectionMode::Clamp {
            let (vertex, position) = if t < 0.0 { (a, lengths[i]) } else { (b, lengths[i + 1]) };
            let distance = nalgebra::distance(point, vertex);
            if distance < best_distance {
                best_distance = distance;
                result = Some(position);
            }
        }
    }
    if mode != ProjectionMode::Clamp && best_distance > best_distance_extended {
        return None;
    }
    result.map(|position| position / lengths[n - 1])
}

fn check_position(parameter: &'static str, value: f64, length: f64) -> Result<()> {
    if value.is_nan() || value < 0.0 || value > length {
        return Err(GeometryError::ParameterOutOfRange {
            parameter,
            value,
            min: 0.0,
            max: length,
        }
        .into());
    }
    Ok(())
}

fn push_distinct<const D: usize>(out: &mut Vec<PointN<D>>, p: PointN<D>) {
    if out.last() != Some(&p) {
        out.push(p);
    }
}

/// Points of the sub-line covering `[start, end]`.
///
/// Cut points are interpolated; a cut that rounds onto a neighbouring
/// point is not repeated.
pub(crate) fn extract<const D: usize>(
    points: &[PointN<D>],
    lengths: &[f64],
    start: f64,
    end: f64,
) -> Result<Vec<PointN<D>>> {
    let length = lengths[lengths.len() - 1];
    check_position("start", start, length)?;
    check_position("end", end, length)?;
    if start >= end {
        return Err(GeometryError::InvalidParameter {
            parameter: "start",
            reason: format!("start ({start}) must be less than end ({end})"),
        }
        .into());
    }
    let first = find(lengths, start)?;
    let last = find(lengths, end)?;
    let mut out = Vec::with_capacity(last - first + 2);
    out.push(point_at(points, lengths, first, start));
    for i in (first + 1)..=last {
        if lengths[i] > start && lengths[i] < end {
            push_distinct(&mut out, points[i]);
        }
    }
    push_distinct(&mut out, point_at(points, lengths, last, end));
    if out.len() < 2 {
        return Err(GeometryError::Degenerate(format!("interval [{start}, {end}] is too short to extract")).into());
    }
    Ok(out)
}

/// Points of the sub-line covering `[0, position]`.
pub(crate) fn truncate<const D: usize>(
    points: &[PointN<D>],
    lengths: &[f64],
    position: f64,
) -> Result<Vec<PointN<D>>> {
    let length = lengths[lengths.len() - 1];
    if position.is_nan() || position <= 0.0 || position > length {
        return Err(GeometryError::ParameterOutOfRange {
            parameter: "position",
            value: position,
            min: 0.0,
            max: length,
        }
        .into());
    }
    if position == length {
        return Ok(points.to_vec());
    }
    let index = find(lengths, position)?;
    let mut out = points[..=index].to_vec();
    if position != lengths[index] {
        push_distinct(&mut out, point_at(points, lengths, index, position));
    }
    if out.len() < 2 {
        return Err(GeometryError::Degenerate(format!("position {position} is too close to the start")).into());
    }
    Ok(out)
}

/// Drops interior points closer than `noise_level` to the previously kept point.
///
/// Returns `None` when nothing would change. The first and last point of the
/// input always survive.
pub(crate) fn noise_filter<const D: usize>(points: &[PointN<D>], noise_level: f64) -> Option<Vec<PointN<D>>> {
    if points.len() <= 2 {
        return None;
    }
    let last_index = points.len() - 1;
    let mut out: Vec<PointN<D>> = Vec::with_capacity(points.len());
    for (i, p) in points.iter().enumerate() {
        let noise = out.last().is_some_and(|prev| nalgebra::distance(prev, p) < noise_level);
        if !noise {
            out.push(*p);
        } else if i == last_index {
            if out.len() == 1 {
                out.push(*p);
            } else if let Some(kept) = out.last_mut() {
                *kept = *p;
            }
        }
    }
    if out.len() == points.len() {
        return None;
    }
    let k = out.len();
    if k >= 3 && out[k - 2] == out[k - 1] {
        out.remove(k - 2);
    }
    if out.len() == 2 && out[0] == out[1] {
        // points[1] differs from points[0] by construction
        out.insert(1, points[1]);
    }
    Some(out)
}

/// Joins point sequences end to start, taking every joint once.
pub(crate) fn concatenate<const D: usize>(lines: &[&[PointN<D>]], tolerance: f64) -> Result<Vec<PointN<D>>> {
    if lines.is_empty() {
        return Err(OperationError::MissingArgument("lines").into());
    }
    if tolerance.is_nan() || tolerance < 0.0 {
        return Err(GeometryError::InvalidParameter {
            parameter: "tolerance",
            reason: format!("must be a non-negative number, got {tolerance}"),
        }
        .into());
    }
    let mut size = lines[0].len();
    for (index, pair) in lines.windows(2).enumerate() {
        let (Some(end), Some(start)) = (pair[0].last(), pair[1].first()) else {
            return Err(OperationError::MissingArgument("lines").into());
        };
        let gap = nalgebra::distance(end, start);
        if gap > tolerance {
            return Err(OperationError::Disconnected {
                index: index + 1,
                gap,
                tolerance,
            }
            .into());
        }
        size += pair[1].len() - 1;
    }
    let mut out = Vec::with_capacity(size);
    out.extend_from_slice(lines[0]);
    for line in &lines[1..] {
        out.extend_from_slice(&line[1..]);
    }
    Ok(out)
}

/// Blends two lines, walking both by fractional length in lockstep.
///
/// Every vertex of either line yields one output point:
/// `start(f) + transition(f) * (end(f) - start(f))`.
pub(crate) fn transition<const D: usize, F: Fn(f64) -> f64>(
    (start_points, start_lengths): (&[PointN<D>], &[f64]),
    (end_points, end_lengths): (&[PointN<D>], &[f64]),
    transition: F,
) -> Result<Vec<PointN<D>>> {
    let start_length = start_lengths[start_lengths.len() - 1];
    let end_length = end_lengths[end_lengths.len() - 1];
    let mut out = Vec::with_capacity(start_points.len() + end_points.len());
    let (mut i, mut j) = (0, 0);
    while i < start_points.len() && j < end_points.len() {
        let fraction_in_start = start_lengths[i] / start_length;
        let fraction_in_end = end_lengths[j] / end_length;
        if fraction_in_start < fraction_in_end {
            let other = position_at(end_points, end_lengths, fraction_in_start * end_length)?;
            out.push(interpolate(&start_points[i], &other, transition(fraction_in_start)));
            i += 1;
        } else if fraction_in_start > fraction_in_end {
            let own = position_at(start_points, start_lengths, fraction_in_end * start_length)?;
            out.push(interpolate(&own, &end_points[j], transition(fraction_in_end)));
            j += 1;
        } else {
            out.push(interpolate(
                &start_points[i],
                &end_points[j],
                transition(fraction_in_start),
            ));
            i += 1;
            j += 1;
        }
    }
    Ok(out)
}
