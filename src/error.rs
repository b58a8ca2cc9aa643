use thiserror::Error;

/// Top-level error type for the polycurve kernel.
#[derive(Debug, Error)]
pub enum PolycurveError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Operation(#[from] OperationError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

/// Malformed arguments: the caller handed in values no geometry can be built from.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("{parameter} must be finite, got {value}")]
    NotFinite { parameter: &'static str, value: f64 },

    #[error("parameter {parameter} = {value} is out of range [{min}, {max}]")]
    ParameterOutOfRange {
        parameter: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("need at least {required} points, got {actual}")]
    TooFewPoints { required: usize, actual: usize },

    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("index {index} out of range for size {size}")]
    IndexOutOfRange { index: usize, size: usize },

    #[error("{parameter} has {actual} entries, expected {expected}")]
    LengthMismatch {
        parameter: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("invalid parameter {parameter}: {reason}")]
    InvalidParameter {
        parameter: &'static str,
        reason: String,
    },
}

/// Errors raised by operations whose individual inputs may each be valid.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("lines are not connected: gap of {gap} before line {index} exceeds tolerance {tolerance}")]
    Disconnected {
        index: usize,
        gap: f64,
        tolerance: f64,
    },

    #[error("required argument {0} is missing")]
    MissingArgument(&'static str),

    #[error("extrapolating to position {position} overflows on every segment of the line")]
    ExtrapolationOverflow { position: f64 },

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// States the algorithms consider impossible. Seeing one of these is a library bug.
#[derive(Debug, Error)]
pub enum InternalError {
    #[error("invariant violated: {0}")]
    InvariantViolated(String),
}

/// Convenience type alias for results using [`PolycurveError`].
pub type Result<T> = std::result::Result<T, PolycurveError>;
