// elevd — Top-level error types
//
// Aggregates dispatch and IO errors into a single enum for the
// application boundary. Command-level failures stay inside
// `DispatchError` and are reported to the caller, never escalated.

use thiserror::Error;

/// Top-level error type for the elevated helper.
#[derive(Debug, Error)]
pub enum ElevdError {
    #[error("Dispatch error: {0}")]
    Dispatch(#[from] crate::dispatch::DispatchError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ElevdError>;
