//! Plinth server library logic.

pub mod api_auth;
pub mod config;
pub mod routes;
pub mod session;

use axum::{routing::get, Extension, Json, Router};
use plinth_db::DbPool;
use routes::{MountError, RouterBuilder};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: DbPool,
}

/// Root handler.
///
/// Returns `200 OK` with a fixed greeting, regardless of request headers or
/// body. Used to verify the server is up.
async fn root() -> Json<Value> {
    Json(json!({ "message": "Hello World" }))
}

/// Builds the application router: the root route plus every route group.
///
/// The pool arrives through `state`, constructed by the caller rather than a
/// process global, and is shared with handlers via an `Extension` layer.
///
/// # Errors
///
/// Returns [`MountError`] when a route group fails validation. The caller
/// treats that as fatal; a misdeclared route table must not serve traffic.
pub fn app(state: AppState) -> Result<Router, MountError> {
    let router = RouterBuilder::new()
        .route("/", get(root))
        .mount(api_auth::routes())?
        .into_router();

    Ok(router
        .layer(TraceLayer::new_for_http())
        .layer(Extension(Arc::new(state))))
}
