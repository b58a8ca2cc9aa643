use super::Point2;

/// Computes the signed area of a polygon (shoelace formula).
///
/// Coordinates are taken relative to `origin` first, which keeps the
/// products small for polygons far away from `(0, 0)`.
/// Positive for counter-clockwise, negative for clockwise.
#[must_use]
pub fn signed_area_2d(points: &[Point2], origin: &Point2) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    let mut prev = points[n - 1] - origin;
    for p in points {
        let cur = p - origin;
        sum += prev.x * cur.y - cur.x * prev.y;
        prev = cur;
    }
    sum * 0.5
}

/// Even-odd ray casting test of `(x, y)` against the closed ring `points`.
///
/// The ring is implicitly closed; the last point connects to the first.
#[must_use]
pub fn ring_contains(points: &[Point2], x: f64, y: f64) -> bool {
    let Some(last) = points.last() else {
        return false;
    };
    let mut crossings = 0_usize;
    let (mut prev_x, mut prev_y) = (last.x, last.y);
    for p in points {
        let (cur_x, cur_y) = (p.x, p.y);
        if y > prev_y.min(cur_y) && y <= prev_y.max(cur_y) && x <= prev_x.max(cur_x) && prev_y != cur_y {
            let x_crossing = (y - prev_y) * (cur_x - prev_x) / (cur_y - prev_y) + prev_x;
            if prev_x == cur_x || x <= x_crossing {
                crossings += 1;
            }
        }
        prev_x = cur_x;
        prev_y = cur_y;
    }
    crossings % 2 == 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::TOLERANCE;

    fn square(offset: f64) -> Vec<Point2> {
        vec![
            Point2::new(offset, offset),
            Point2::new(offset + 1.0, offset),
            Point2::new(offset + 1.0, offset + 1.0),
            Point2::new(offset, offset + 1.0),
        ]
    }

    #[test]
    fn signed_area_ccw_square() {
        let area = signed_area_2d(&square(0.0), &Point2::origin());
        assert!((area - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn signed_area_cw_square() {
        let mut pts = square(0.0);
        pts.reverse();
        let area = signed_area_2d(&pts, &Point2::origin());
        assert!((area + 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn signed_area_far_from_origin() {
        let pts = square(1.0e9);
        let area = signed_area_2d(&pts, &Point2::new(1.0e9 + 0.5, 1.0e9 + 0.5));
        assert!((area - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn signed_area_degenerate() {
        assert!(signed_area_2d(&[Point2::new(0.0, 0.0)], &Point2::origin()).abs() < TOLERANCE);
        assert!(signed_area_2d(&[], &Point2::origin()).abs() < TOLERANCE);
    }

    #[test]
    fn ring_contains_inside_and_outside() {
        let pts = square(0.0);
        assert!(ring_contains(&pts, 0.5, 0.5));
        assert!(!ring_contains(&pts, 1.5, 0.5));
        assert!(!ring_contains(&pts, 0.5, -0.5));
        assert!(!ring_contains(&[], 0.0, 0.0));
    }
}
