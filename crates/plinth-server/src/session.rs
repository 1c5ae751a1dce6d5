//! Per-request database sessions for handlers.
//!
//! A handler that takes a [`DbSession`] parameter receives its own pooled
//! connection for the duration of the request. The session drops with the
//! handler, on success and failure alike, so the connection always returns
//! to the pool without explicit release.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use plinth_db::{open_session, Session};

use crate::AppState;

/// Extractor handing a scoped database session to a handler.
///
/// ```ignore
/// async fn list_things(DbSession(session): DbSession) -> Json<Value> {
///     let count: i64 = session
///         .query_row("SELECT COUNT(*) FROM things", [], |row| row.get(0))?;
///     ...
/// }
/// ```
pub struct DbSession(pub Session);

impl<S> FromRequestParts<S> for DbSession
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let state = parts
            .extensions
            .get::<Arc<AppState>>()
            .cloned()
            .ok_or_else(|| error_response("application state missing".to_string()))?;

        // Checkout can block on a busy pool; keep it off the async executor.
        let session = tokio::task::spawn_blocking(move || open_session(&state.pool))
            .await
            .map_err(|e| error_response(format!("session task failed: {e}")))?
            .map_err(|e| error_response(e.to_string()))?;

        Ok(DbSession(session))
    }
}

fn error_response(message: String) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": message })),
    )
        .into_response()
}
