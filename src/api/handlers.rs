//! REST API handlers.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    Json,
};
use chrono::SecondsFormat;

use super::types::{CreateSessionResponse, ErrorResponse, FetchPageParams, PageResponse};
use crate::error::PagerError;
use crate::session::{Session, SessionStore, Tags};

/// Path the session routes are mounted under.
pub const SESSIONS_PATH: &str = "/api/v1/sessions";

/// Header advertising when a session expires.
pub static DEADLINE_HEADER: HeaderName = HeaderName::from_static("deadline");

/// Error half of every handler result.
pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SessionStore>,
}

impl AppState {
    pub fn new() -> Self {
        Self::with_store(Arc::new(SessionStore::new()))
    }

    pub fn with_store(store: Arc<SessionStore>) -> Self {
        Self { store }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a core error onto a status code and client-facing body.
///
/// Store faults are logged in full and reported generically.
pub fn error_response(err: PagerError) -> ApiError {
    match err {
        PagerError::InvalidRequest(msg) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::invalid_request(msg)),
        ),
        PagerError::NotFound(id) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::session_not_found(&id)),
        ),
        PagerError::OutOfRange { page, available } => (
            StatusCode::RANGE_NOT_SATISFIABLE,
            Json(ErrorResponse::page_out_of_range(page, available)),
        ),
        err @ (PagerError::StoreFault(_) | PagerError::Io(_)) => {
            tracing::error!(error = ?err, "session store failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::internal_error()),
            )
        }
    }
}

/// `Link` and `Deadline` headers pointing the client at its next page.
pub fn pagination_headers(session: &Session) -> HeaderMap {
    let mut headers = HeaderMap::new();

    let link = format!(
        "<{}?id={}&page={}>; rel=\"next\"",
        SESSIONS_PATH,
        session.id(),
        session.page()
    );
    if let Ok(value) = HeaderValue::from_str(&link) {
        headers.insert(header::LINK, value);
    }

    let deadline = session
        .deadline()
        .to_rfc3339_opts(SecondsFormat::Millis, true);
    if let Ok(value) = HeaderValue::from_str(&deadline) {
        headers.insert(DEADLINE_HEADER.clone(), value);
    }

    headers
}

/// Health check endpoint.
pub async fn health() -> &'static str {
    "OK"
}

/// API information endpoint.
pub async fn api_info(State(state): State<AppState>) -> Json<serde_json::Value> {
    let config = state.store.config();
    Json(serde_json::json!({
        "name": "session-pager",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "sessions": state.store.len(),
        "ttl_secs": config.ttl.as_secs_f64(),
        "page_size": config.page_size,
    }))
}

/// Create a new session tagged with the query parameters.
pub async fn create_session(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<(StatusCode, HeaderMap, Json<CreateSessionResponse>), ApiError> {
    let tags = Tags::try_from_pairs(pairs).map_err(error_response)?;
    let session = state.store.create(tags).map_err(error_response)?;

    tracing::info!(session_id = %session.id(), "session opened");

    Ok((
        StatusCode::CREATED,
        pagination_headers(&session),
        Json(CreateSessionResponse::from_session(&session)),
    ))
}

/// Fetch one page of a session.
pub async fn fetch_page(
    State(state): State<AppState>,
    Query(params): Query<FetchPageParams>,
) -> Result<(HeaderMap, Json<PageResponse>), ApiError> {
    let (id, page) = params.parse().map_err(error_response)?;

    let session = state.store.get(&id).map_err(error_response)?;
    let records = session.get_page(page).map_err(error_response)?;

    tracing::debug!(
        session_id = %id,
        page,
        records = records.len(),
        "page served"
    );

    Ok((
        pagination_headers(&session),
        Json(PageResponse::new(&session, page, records)),
    ))
}
