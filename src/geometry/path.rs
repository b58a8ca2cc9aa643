//! Move/line/close command sequences, the interchange format of 2D drawing libraries.

use crate::error::{OperationError, Result};
use crate::math::Point2;

use super::polygon::Polygon2d;
use super::polyline::{PolyLine, PolyLine2d};

/// One drawing command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo(Point2),
    LineTo(Point2),
    /// Line back to the most recent `MoveTo` point.
    Close,
}

/// Collects the points of a single open or closed sub-path.
///
/// Returns the points and whether the path ended with `Close`.
fn collect_points(commands: &[PathCommand]) -> Result<(Vec<Point2>, bool)> {
    let mut iter = commands.iter();
    let start = match iter.next() {
        Some(PathCommand::MoveTo(p)) => *p,
        Some(_) => return Err(OperationError::InvalidInput("path must start with MoveTo".to_owned()).into()),
        None => return Err(OperationError::MissingArgument("commands").into()),
    };
    let mut points = vec![start];
    let mut closed = false;
    for command in iter {
        if closed {
            return Err(OperationError::InvalidInput("path continues after Close".to_owned()).into());
        }
        match command {
            PathCommand::MoveTo(_) => {
                return Err(OperationError::InvalidInput("path has more than one MoveTo".to_owned()).into());
            }
            PathCommand::LineTo(p) => points.push(*p),
            PathCommand::Close => closed = true,
        }
    }
    Ok((points, closed))
}

impl PolyLine2d {
    /// Builds a line from a single sub-path. `Close` appends the start point again.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::InvalidInput` for a path that does not start
    /// with `MoveTo`, holds a second `MoveTo`, or continues after `Close`.
    pub fn from_path(commands: &[PathCommand]) -> Result<Self> {
        let (mut points, closed) = collect_points(commands)?;
        if closed {
            points.push(points[0]);
        }
        Self::new(points)
    }

    /// `MoveTo` the first point, then `LineTo` every other point.
    #[must_use]
    pub fn to_path(&self) -> Vec<PathCommand> {
        let mut commands = Vec::with_capacity(self.size());
        commands.push(PathCommand::MoveTo(self.first()));
        commands.extend(self.points()[1..].iter().map(|p| PathCommand::LineTo(*p)));
        commands
    }
}

impl Polygon2d {
    /// Builds a polygon from a single sub-path; a trailing `Close` is optional.
    ///
    /// # Errors
    ///
    /// See [`PolyLine2d::from_path`].
    pub fn from_path(commands: &[PathCommand]) -> Result<Self> {
        let (points, _) = collect_points(commands)?;
        Self::new(points)
    }

    /// Like [`PolyLine2d::to_path`], ending with `Close`.
    #[must_use]
    pub fn to_path(&self) -> Vec<PathCommand> {
        let mut commands = self.as_polyline().to_path();
        commands.push(PathCommand::Close);
        commands
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    #[test]
    fn polyline_path_round_trip() {
        let line = PolyLine2d::new(vec![p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0)]).unwrap();
        let path = line.to_path();
        assert_eq!(path[0], PathCommand::MoveTo(p(0.0, 0.0)));
        assert_eq!(PolyLine2d::from_path(&path).unwrap(), line);
    }

    #[test]
    fn close_appends_start_to_polyline() {
        let path = [
            PathCommand::MoveTo(p(0.0, 0.0)),
            PathCommand::LineTo(p(1.0, 0.0)),
            PathCommand::LineTo(p(1.0, 1.0)),
            PathCommand::Close,
        ];
        let line = PolyLine2d::from_path(&path).unwrap();
        assert_eq!(line.size(), 4);
        assert_eq!(line.last(), p(0.0, 0.0));
        let polygon = Polygon2d::from_path(&path).unwrap();
        assert_eq!(polygon.size(), 3);
        assert_eq!(polygon.to_path().last(), Some(&PathCommand::Close));
    }

    #[test]
    fn malformed_paths_fail() {
        assert!(PolyLine2d::from_path(&[]).is_err());
        assert!(PolyLine2d::from_path(&[PathCommand::LineTo(p(1.0, 0.0))]).is_err());
        assert!(PolyLine2d::from_path(&[
            PathCommand::MoveTo(p(0.0, 0.0)),
            PathCommand::LineTo(p(1.0, 0.0)),
            PathCommand::MoveTo(p(2.0, 0.0)),
        ])
        .is_err());
        assert!(Polygon2d::from_path(&[
            PathCommand::MoveTo(p(0.0, 0.0)),
            PathCommand::LineTo(p(1.0, 0.0)),
            PathCommand::Close,
            PathCommand::LineTo(p(2.0, 0.0)),
        ])
        .is_err());
    }
}
