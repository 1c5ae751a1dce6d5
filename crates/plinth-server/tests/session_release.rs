//! Handler sessions must return to the pool after every request, whether
//! the handler succeeds or fails.

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Extension, Json,
};
use plinth_db::{create_pool, DbPool, PoolSettings};
use plinth_server::routes::{RouteGroup, RouterBuilder};
use plinth_server::session::DbSession;
use plinth_server::AppState;
use std::sync::Arc;
use tower::ServiceExt;

async fn count_tables(DbSession(session): DbSession) -> Json<serde_json::Value> {
    let tables: i64 = session
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    Json(serde_json::json!({ "tables": tables }))
}

async fn always_fails(DbSession(_session): DbSession) -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

fn probe_app(pool: DbPool) -> axum::Router {
    let group = RouteGroup::new("probe", "/probe")
        .route(Method::GET, "/ok", count_tables)
        .route(Method::GET, "/fail", always_fails);

    RouterBuilder::new()
        .mount(group)
        .unwrap()
        .into_router()
        .layer(Extension(Arc::new(AppState { pool })))
}

#[tokio::test]
async fn handler_sessions_return_to_the_pool() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("database.db");
    let settings = PoolSettings {
        max_connections: 2,
        ..PoolSettings::default()
    };
    let pool = create_pool(&db_path, settings).unwrap();

    let app = probe_app(pool.clone());

    // With only two connections, a leaked session would starve the pool
    // well before ten requests complete.
    for i in 0..10 {
        let (path, expected) = if i % 2 == 0 {
            ("/probe/ok", StatusCode::OK)
        } else {
            ("/probe/fail", StatusCode::INTERNAL_SERVER_ERROR)
        };

        let response = app
            .clone()
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), expected, "GET {path}");
    }

    let state = pool.state();
    assert_eq!(
        state.connections, state.idle_connections,
        "every handler session is back in the pool"
    );
}

#[tokio::test]
async fn handler_observes_the_empty_schema() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("database.db");
    let pool = create_pool(&db_path, PoolSettings::default()).unwrap();
    plinth_db::initialize_schema(&pool).unwrap();

    let app = probe_app(pool);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/probe/ok")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json, serde_json::json!({ "tables": 0 }));
}
