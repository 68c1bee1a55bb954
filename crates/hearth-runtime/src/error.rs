use thiserror::Error;

/// Errors surfaced by the runtime substrate.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// An initialization routine failed; the ready target is never posted.
    #[error("Initialization routine failed: {routine}: {reason}")]
    InitFailed { routine: String, reason: String },

    /// An initialization routine panicked instead of returning an error.
    #[error("Initialization routine panicked: {reason}")]
    InitPanicked { reason: String },
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
