use thiserror::Error;

/// Top-level error type for the skeleton engine and the operations built on it.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Operation(#[from] OperationError),
}

/// Errors related to input geometry.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("coordinate ({x}, {y}) is not finite")]
    NonFinite { x: f64, y: f64 },
}

/// Errors related to operation parameters.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("invalid value {value} for option `{option}`")]
    InvalidOption { option: &'static str, value: f64 },
}

/// Convenience type alias for results using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
