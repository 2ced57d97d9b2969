use thiserror::Error;

/// Top-level error type for the path geometry engine.
#[derive(Debug, Error)]
pub enum GeopathError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Operation(#[from] OperationError),
}

/// Errors related to geometric computations.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("zero-length vector")]
    ZeroVector,

    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("ellipse diameters must be perpendicular")]
    NotPerpendicular,

    #[error("matrix is not invertible")]
    NotInvertible,

    #[error("point is not on the curve (nearest point is {distance} away)")]
    NotOnCurve { distance: f64 },

    #[error("self test failed: {0}")]
    SelfTest(String),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("points are not planar: {0}")]
    NotPlanar(String),
}

/// Errors related to path structure.
#[derive(Debug, Error)]
pub enum PathError {
    #[error("path has no segments")]
    Empty,

    #[error("segment {index} does not start where its predecessor stops")]
    NotConnected { index: usize },
}

/// Errors related to higher level operations.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("operation failed: {0}")]
    Failed(String),
}

/// Convenience type alias for results using [`GeopathError`].
pub type Result<T> = std::result::Result<T, GeopathError>;
