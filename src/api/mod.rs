//! HTTP boundary for session-pager.
//!
//! Translates wire requests into session store operations. Records are
//! encoded as JSON strings; the core itself is encoding-agnostic.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /api/v1/` - API information
//! - `POST /api/v1/sessions?k=v&...` - Create a session tagged with the query pairs
//! - `GET /api/v1/sessions?id=<id>&page=<n>` - Fetch one page of a session
//!
//! Responses that carry a session ID also carry a `Link: <...>; rel="next"`
//! header naming the page to poll next and a `Deadline` header with the
//! session's expiry in RFC 3339 UTC.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use session_pager::api::{serve_with_state, AppState, ServerConfig};
//! use session_pager::{Pruner, SessionStore};
//!
//! #[tokio::main]
//! async fn main() -> session_pager::Result<()> {
//!     let store = Arc::new(SessionStore::new());
//!     let pruner = Pruner::spawn(Arc::clone(&store), Duration::from_secs(1));
//!
//!     let config = ServerConfig::new("127.0.0.1", 3000);
//!     serve_with_state(config, AppState::with_store(store)).await?;
//!
//!     pruner.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod handlers;
pub mod router;
pub mod types;

// Re-export commonly used types
pub use handlers::{error_response, pagination_headers, AppState, SESSIONS_PATH};
pub use router::{create_router, create_router_with_state, serve_until, serve_with_state, ServerConfig};
pub use types::{CreateSessionResponse, ErrorResponse, FetchPageParams, PageResponse};
