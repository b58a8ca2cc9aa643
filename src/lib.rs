//! Immutable polylines, polygons, rays and offset curves in two and three dimensions.

pub mod error;
pub mod geometry;
pub mod math;
pub mod operations;

pub use error::{GeometryError, InternalError, OperationError, PolycurveError, Result};
pub use geometry::{
    Bezier2d, Bezier3d, Clothoid2d, DuplicateFilter, LineKind, LineSegment2d, LineSegment3d, PathCommand, PolyLine,
    PolyLine2d, PolyLine3d, Polygon2d, Polygon3d, ProjectionMode, Ray2d, Ray3d,
};
pub use operations::offset::{OffsetParams, PolyLineOffset2d, VariableOffset2d};
