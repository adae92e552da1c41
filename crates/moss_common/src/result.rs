//! Common result and error types for the moss toolchain.

/// The standard result type for fallible internal operations.
///
/// `Err` indicates an unrecoverable internal error (a bug in moss — label
/// allocation skew, mate asymmetry, graph index misuse), never a problem
/// with the user's netlist. User errors are reported through the diagnostic
/// sink and the operation still returns `Ok` with an unsuccessful outcome.
pub type MossResult<T> = Result<T, InternalError>;

/// An internal tool error indicating a bug in moss, not a user input problem.
///
/// These errors should never occur during normal operation; any occurrence
/// means an invariant the engine relies on has been violated.
#[derive(Debug, thiserror::Error)]
#[error("internal error: {message}")]
pub struct InternalError {
    /// Description of the internal error.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}
