//! Error types for the avmux CLI.
//!
//! Uses thiserror for derive macros and provides user-actionable error messages.

use crate::exit_codes;
use thiserror::Error;

/// Main error type for avmux operations.
///
/// Each variant maps to a distinct exit code. Runner-level failures
/// (`runner::ExecutionError`) are translated into these variants at the
/// command boundary so the caller sees one error channel with a short code
/// and a descriptive message.
#[derive(Error, Debug)]
pub enum AvmuxError {
    /// User provided invalid arguments or configuration.
    #[error("{0}")]
    UserError(String),

    /// Inputs or the FFmpeg binary failed validation before the merge ran.
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    /// The FFmpeg binary could not be started.
    #[error("Launch failed: {0}")]
    LaunchFailed(String),

    /// FFmpeg ran but the merge did not produce a usable result.
    #[error("Merge failed: {0}")]
    MergeFailed(String),

    /// FFmpeg exceeded its allotted time and was killed.
    #[error("Timed out: {0}")]
    Timeout(String),
}

impl AvmuxError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            AvmuxError::UserError(_) => exit_codes::USER_ERROR,
            AvmuxError::PreconditionFailed(_) => exit_codes::PRECONDITION_FAILURE,
            AvmuxError::LaunchFailed(_) => exit_codes::LAUNCH_FAILURE,
            AvmuxError::MergeFailed(_) => exit_codes::MERGE_FAILURE,
            AvmuxError::Timeout(_) => exit_codes::TIMEOUT,
        }
    }
}

/// Result type alias for avmux operations.
pub type Result<T> = std::result::Result<T, AvmuxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_error_has_correct_exit_code() {
        let err = AvmuxError::UserError("bad argument".to_string());
        assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
    }

    #[test]
    fn precondition_error_has_correct_exit_code() {
        let err = AvmuxError::PreconditionFailed("video file not found".to_string());
        assert_eq!(err.exit_code(), exit_codes::PRECONDITION_FAILURE);
    }

    #[test]
    fn launch_error_has_correct_exit_code() {
        let err = AvmuxError::LaunchFailed("permission denied".to_string());
        assert_eq!(err.exit_code(), exit_codes::LAUNCH_FAILURE);
    }

    #[test]
    fn merge_error_has_correct_exit_code() {
        let err = AvmuxError::MergeFailed("exit code 1".to_string());
        assert_eq!(err.exit_code(), exit_codes::MERGE_FAILURE);
    }

    #[test]
    fn timeout_error_has_correct_exit_code() {
        let err = AvmuxError::Timeout("exceeded 30s".to_string());
        assert_eq!(err.exit_code(), exit_codes::TIMEOUT);
    }

    #[test]
    fn error_messages_are_descriptive() {
        let err = AvmuxError::PreconditionFailed("audio file not found: 'a.m4a'".to_string());
        assert_eq!(
            err.to_string(),
            "Precondition failed: audio file not found: 'a.m4a'"
        );

        let err = AvmuxError::Timeout("FFmpeg did not finish within 30s".to_string());
        assert_eq!(err.to_string(), "Timed out: FFmpeg did not finish within 30s");
    }
}
