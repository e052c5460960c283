//! API request and response types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PagerError;
use crate::session::{Record, Session, SessionId, Tags};

/// Response for session creation.
#[derive(Debug, Clone, Serialize)]
pub struct CreateSessionResponse {
    /// The assigned session ID.
    pub id: SessionId,
    /// Page the client should request next.
    pub page: usize,
    /// Instant after which the session is gone.
    pub deadline: DateTime<Utc>,
    /// Tags recorded from the create request.
    pub tags: Tags,
}

impl CreateSessionResponse {
    pub fn from_session(session: &Session) -> Self {
        Self {
            id: session.id(),
            page: session.page(),
            deadline: session.deadline(),
            tags: session.tags().clone(),
        }
    }
}

/// Query parameters of a page fetch.
///
/// Both fields are kept as raw strings so missing and malformed values can
/// be reported precisely.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FetchPageParams {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub page: Option<String>,
}

impl FetchPageParams {
    /// Validate and convert into a session ID and page index.
    ///
    /// Negative page numbers are passed through; the session rejects them
    /// as out of range.
    pub fn parse(&self) -> Result<(SessionId, i64), PagerError> {
        let id = match self.id.as_deref() {
            None | Some("") => {
                return Err(PagerError::InvalidRequest("missing id query param".into()))
            }
            Some(raw) => raw.parse::<SessionId>()?,
        };

        let page = match self.page.as_deref() {
            None | Some("") => {
                return Err(PagerError::InvalidRequest("missing page query param".into()))
            }
            Some(raw) => raw.trim().parse::<i64>().map_err(|e| {
                PagerError::InvalidRequest(format!("invalid page '{}': {}", raw, e))
            })?,
        };

        Ok((id, page))
    }
}

/// Response for a page fetch.
#[derive(Debug, Clone, Serialize)]
pub struct PageResponse {
    /// Session ID.
    pub id: SessionId,
    /// Page the records were taken from.
    pub requested_page: i64,
    /// Page the client should request next.
    pub page: usize,
    /// Instant after which the session is gone.
    pub deadline: DateTime<Utc>,
    /// Whether the producer has finished the stream.
    pub finished: bool,
    /// Records of the requested page, in production order.
    pub records: Vec<Record>,
}

impl PageResponse {
    pub fn new(session: &Session, requested_page: i64, records: Vec<Record>) -> Self {
        Self {
            id: session.id(),
            requested_page,
            page: session.page(),
            deadline: session.deadline(),
            finished: session.is_finished(),
            records,
        }
    }
}

/// Generic API error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "SESSION_NOT_FOUND").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new("INVALID_REQUEST", message)
    }

    pub fn session_not_found(id: &str) -> Self {
        Self::new("SESSION_NOT_FOUND", format!("Session '{}' not found", id))
    }

    pub fn page_out_of_range(page: i64, available: usize) -> Self {
        Self::new("PAGE_OUT_OF_RANGE", format!("Page {} is not available yet", page))
            .with_details(format!("{} records produced so far", available))
    }

    pub fn internal_error() -> Self {
        Self::new("INTERNAL_ERROR", "Internal server error")
    }
}
