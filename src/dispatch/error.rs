// elevd — Dispatch error types

use thiserror::Error;

/// Failures a dispatched command can report back to the caller. None of
/// these is fatal to the helper: the process keeps serving other commands.
///
/// A lookup that legitimately finds nothing is not represented here — it
/// is a success carrying the not-found sentinel, since absence is an
/// expected, frequent outcome.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The command name is not in the catalog.
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// A required parameter is missing or fails to convert to the shape
    /// the command expects. Reported before any OS call is attempted.
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// The underlying OS primitive failed; the OS error detail rides along.
    #[error("Operation failed: {0}")]
    OperationFailed(#[from] std::io::Error),
}

impl DispatchError {
    /// Stable machine-readable kind, used by the wire protocol.
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::UnknownCommand(_) => "unknownCommand",
            DispatchError::InvalidParameters(_) => "invalidParameters",
            DispatchError::OperationFailed(_) => "operationFailed",
        }
    }
}
