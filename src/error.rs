//! Error types for session-pager.

use thiserror::Error;

/// Main error type for session store operations.
#[derive(Error, Debug)]
pub enum PagerError {
    /// Malformed or duplicate input parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Session with the given ID was never created or has been pruned.
    #[error("session not found: {0}")]
    NotFound(String),

    /// Requested page has not been produced yet.
    #[error("page {page} out of range: {available} records available")]
    OutOfRange {
        /// The requested page index.
        page: i64,
        /// Number of records produced so far.
        available: usize,
    },

    /// Unexpected internal storage inconsistency.
    #[error("session store fault: {0}")]
    StoreFault(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PagerError {
    /// Whether the caller can fix the request and try again.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidRequest(_) | Self::NotFound(_) | Self::OutOfRange { .. }
        )
    }
}

/// Convenience Result type for session-pager operations.
pub type Result<T> = std::result::Result<T, PagerError>;
