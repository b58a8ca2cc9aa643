pub mod bounds;
pub mod curve;
pub mod path;
pub mod polygon;
pub mod polyline;
pub mod ray;
pub mod segment;

pub use bounds::{Bounds, Bounds2d, Bounds3d};
pub use curve::{
    Bezier, Bezier2d, Bezier3d, Clothoid2d, Curve, CurveDomain, DEFAULT_BEZIER_SAMPLES, DEFAULT_CLOTHOID_SAMPLES,
};
pub use path::PathCommand;
pub use polygon::{Polygon2d, Polygon3d};
pub use polyline::{DuplicateFilter, LineKind, PolyLine, PolyLine2d, PolyLine3d, ProjectionMode};
pub use ray::{Ray2d, Ray3d};
pub use segment::{LineSegment2d, LineSegment3d};
