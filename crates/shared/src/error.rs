//! Application-wide error type.
//!
//! Domain errors are folded into [`AppError`] at the edge. Each variant is a
//! status class; the machine-readable code travels with it in an
//! [`ErrorDetail`], so `INSUFFICIENT_FUNDS` and `ACCOUNT_INACTIVE` both map
//! to 422 without losing which rule failed.

use std::fmt;

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Stable code plus a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDetail {
    /// Machine-readable code, e.g. `INSUFFICIENT_FUNDS`.
    pub code: &'static str,
    /// Message for logs and clients.
    pub message: String,
}

impl ErrorDetail {
    /// Creates a detail.
    #[must_use]
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

/// Errors surfaced to callers of the ledger.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed input.
    #[error("Invalid input: {0}")]
    InvalidInput(ErrorDetail),

    /// The actor may not perform the operation.
    #[error("Access denied: {0}")]
    Forbidden(ErrorDetail),

    /// Referenced resource does not exist or is not visible to the actor.
    #[error("Not found: {0}")]
    NotFound(ErrorDetail),

    /// Duplicate or concurrently modified state.
    #[error("Conflict: {detail}")]
    Conflict {
        /// What conflicted.
        detail: ErrorDetail,
        /// Whether repeating the request may succeed.
        retryable: bool,
    },

    /// A business rule rejected the operation.
    #[error("Rejected: {0}")]
    Rejected(ErrorDetail),

    /// Storage did not answer in time.
    #[error("Timed out: {0}")]
    Timeout(ErrorDetail),

    /// Storage failed.
    #[error("Storage error: {0}")]
    Storage(ErrorDetail),

    /// Anything else.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput(_) => 400,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Conflict { .. } => 409,
            Self::Rejected(_) => 422,
            Self::Timeout(_) => 504,
            Self::Storage(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the machine-readable code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidInput(d)
            | Self::Forbidden(d)
            | Self::NotFound(d)
            | Self::Conflict { detail: d, .. }
            | Self::Rejected(d)
            | Self::Timeout(d)
            | Self::Storage(d) => d.code,
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// True when the same request may succeed if repeated.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Conflict { retryable, .. } => *retryable,
            Self::Timeout(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn detail(code: &'static str) -> ErrorDetail {
        ErrorDetail::new(code, "msg")
    }

    #[rstest]
    #[case(AppError::InvalidInput(detail("INVALID_AMOUNT")), 400, false)]
    #[case(AppError::Forbidden(detail("FORBIDDEN")), 403, false)]
    #[case(AppError::NotFound(detail("ACCOUNT_NOT_FOUND")), 404, false)]
    #[case(AppError::Conflict { detail: detail("ALREADY_REVERSED"), retryable: false }, 409, false)]
    #[case(AppError::Conflict { detail: detail("CONCURRENT_MODIFICATION"), retryable: true }, 409, true)]
    #[case(AppError::Rejected(detail("INSUFFICIENT_FUNDS")), 422, false)]
    #[case(AppError::Timeout(detail("STORAGE_TIMEOUT")), 504, true)]
    #[case(AppError::Storage(detail("STORAGE_ERROR")), 500, false)]
    fn test_status_and_retryability(
        #[case] err: AppError,
        #[case] status: u16,
        #[case] retryable: bool,
    ) {
        assert_eq!(err.status_code(), status);
        assert_eq!(err.is_retryable(), retryable);
    }

    #[test]
    fn test_code_travels_with_detail() {
        let err = AppError::Rejected(detail("ACCOUNT_INACTIVE"));
        assert_eq!(err.error_code(), "ACCOUNT_INACTIVE");
        assert_eq!(AppError::Internal("boom".into()).error_code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_error_display() {
        let err = AppError::Rejected(ErrorDetail::new("INSUFFICIENT_FUNDS", "balance too low"));
        assert_eq!(err.to_string(), "Rejected: balance too low (INSUFFICIENT_FUNDS)");
    }
}
