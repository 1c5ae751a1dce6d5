use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use plinth_db::{create_pool, PoolSettings};
use plinth_server::{app, AppState};
use std::path::Path;
use tower::ServiceExt;

fn test_app() -> axum::Router {
    let pool = create_pool(Path::new(":memory:"), PoolSettings::default()).unwrap();
    app(AppState { pool }).unwrap()
}

#[tokio::test]
async fn root_returns_hello_world() {
    let app = test_app();

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json, serde_json::json!({ "message": "Hello World" }));
}

#[tokio::test]
async fn root_payload_ignores_request_headers() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/")
                .header("accept", "text/plain")
                .header("x-request-id", "0f3deb7c")
                .header("cookie", "session=stale")
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
    assert_eq!(json["message"], "Hello World");
}

#[tokio::test]
async fn unknown_top_level_path_is_a_plain_404() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/definitely-not-here")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(body.is_empty(), "paths outside any group get the framework 404");
}
