use thiserror::Error;

/// Top-level error type for curve geometries and their rendering.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Errors raised while constructing or mutating geometries.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("{geometry} has {count} coordinates, expected {expected}")]
    InvalidCoordinateCount {
        geometry: &'static str,
        count: usize,
        expected: &'static str,
    },

    #[error("coordinate layout mismatch: expected {expected}, found {found}")]
    LayoutMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("segment {index} does not start at the end of the previous segment")]
    EndpointMismatch { index: usize },

    #[error("ring {index} is not closed")]
    RingNotClosed { index: usize },

    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("zero-length vector")]
    ZeroVector,

    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
}

/// Errors related to building or replaying instruction streams.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid style: {0}")]
    InvalidStyle(String),

    #[error("invalid instruction at {index}: {reason}")]
    InvalidInstruction { index: usize, reason: String },

    #[error("feature not found")]
    FeatureNotFound,
}

/// Convenience type alias for results using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
