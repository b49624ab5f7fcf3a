// src/grading/error.rs

use thiserror::Error;

/// Errors raised while scoring a question.
///
/// Every variant aborts the submission it belongs to; none of them is ever
/// turned into a zero score.
#[derive(Debug, Error)]
pub enum GradingError {
    /// The grading service could not be reached.
    #[error("grading service unreachable: {0}")]
    Unreachable(String),

    /// The grading service did not answer in time.
    #[error("grading request timed out after {0}s")]
    Timeout(u64),

    /// The grading service answered with an error status.
    #[error("grading service error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The reply was not a bare integer.
    #[error("grading service returned a non-numeric score: {0:?}")]
    Malformed(String),

    /// The reply was an integer outside `0..=max`.
    #[error("grading service returned {score}, expected 0..={max}")]
    OutOfRange { score: i64, max: i32 },
}

impl GradingError {
    /// Whether a fresh attempt of the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            GradingError::Unreachable(_) | GradingError::Timeout(_) => true,
            GradingError::Api { status, .. } => *status == 429 || *status >= 500,
            GradingError::Malformed(_) | GradingError::OutOfRange { .. } => false,
        }
    }

    /// Short description that is safe to show to end users.
    pub fn category(&self) -> &'static str {
        match self {
            GradingError::Unreachable(_) => "grading service unavailable",
            GradingError::Timeout(_) => "grading service timed out",
            GradingError::Api { .. } => "grading service rejected the request",
            GradingError::Malformed(_) | GradingError::OutOfRange { .. } => {
                "grading service returned an invalid score"
            }
        }
    }
}
