//! Error types for narrafuse.
//!
//! All errors are strongly typed using thiserror. This enables pattern
//! matching on specific error conditions and provides clear error
//! messages. No error here is fatal to the process: every variant is
//! scoped to the merge dialog and recoverable by retry or cancellation.

use thiserror::Error;

/// Validation errors raised when a merge plan cannot be built because
/// required state is missing or inconsistent.
///
/// A correct UI gates the "proceed" action so these are never reached at
/// runtime; they exist as contract preconditions.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("No primary name has been chosen for the merged entity")]
    MissingPrimaryName,

    #[error("Primary name '{name}' does not match any candidate in the current selection")]
    PrimaryNameNotInSelection {
        name: String,
    },

    #[error("At least 2 entities must be selected to merge, got {count}")]
    TooFewEntities {
        count: usize,
    },
}

/// Failures of the backend similarity or preview-merge calls.
///
/// Recovered by falling back to a simpler similarity call or by leaving
/// the analysis at its "not yet known" defaults; the merge action itself
/// stays available.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Connection failed: {message}")]
    ConnectionFailed {
        message: String,
    },

    #[error("Failed to decode response: {message}")]
    Decode {
        message: String,
    },

    #[error("Response shape not recognized: {message}")]
    UnexpectedShape {
        message: String,
    },

    #[error("Server error: {message}")]
    Server {
        message: String,
    },
}

impl BackendError {
    /// Creates a decode error from any displayable cause.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Creates an unexpected-shape error.
    #[must_use]
    pub fn shape(message: impl Into<String>) -> Self {
        Self::UnexpectedShape {
            message: message.into(),
        }
    }
}

/// Failures of the final merge submission.
///
/// The wizard returns to the review step with the backend's message
/// surfaced; selection and plan are preserved so the user can retry
/// without re-entering choices.
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("Merge submission failed: {0}")]
    Transport(#[from] BackendError),

    #[error("Merge rejected by backend: {message}")]
    Rejected {
        message: String,
    },
}

/// Top-level error type for narrafuse.
#[derive(Debug, Error)]
pub enum FuseError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Submission error: {0}")]
    Submission(#[from] SubmissionError),
}

impl FuseError {
    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is a backend (analysis) error.
    #[must_use]
    pub const fn is_backend(&self) -> bool {
        matches!(self, Self::Backend(_))
    }

    /// Returns true if this is a submission error.
    #[must_use]
    pub const fn is_submission(&self) -> bool {
        matches!(self, Self::Submission(_))
    }

    /// Returns true if this error is retryable.
    ///
    /// Validation errors will not change on retry; transport-level
    /// failures and server errors might.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Validation(_) => false,
            Self::Backend(e) => matches!(
                e,
                BackendError::ConnectionFailed { .. } | BackendError::Server { .. }
            ),
            Self::Submission(e) => match e {
                SubmissionError::Transport(t) => matches!(
                    t,
                    BackendError::ConnectionFailed { .. } | BackendError::Server { .. }
                ),
                SubmissionError::Rejected { .. } => false,
            },
        }
    }
}

/// Result type alias for narrafuse operations.
pub type FuseResult<T> = Result<T, FuseError>;
