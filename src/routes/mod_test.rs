use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use tower::ServiceExt;

use super::*;
use crate::state::test_helpers::test_app_state;

#[tokio::test]
async fn root_reports_running() {
    let (state, _) = test_app_state();
    let resp = app(state)
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), 1024).await.unwrap();
    assert_eq!(&bytes[..], b"Backend is running");
}

#[tokio::test]
async fn healthz_ok() {
    let (state, _) = test_app_state();
    let resp = app(state)
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn cors_allows_frontend_origin_with_credentials() {
    let (state, _) = test_app_state();
    let req = Request::builder()
        .uri("/api/user")
        .header(header::ORIGIN, "http://localhost:5173")
        .body(Body::empty())
        .unwrap();
    let resp = app(state).oneshot(req).await.unwrap();

    let headers = resp.headers();
    assert_eq!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "http://localhost:5173");
    assert_eq!(headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(), "true");
}

#[tokio::test]
async fn cors_ignores_other_origins() {
    let (state, _) = test_app_state();
    let req = Request::builder()
        .uri("/api/user")
        .header(header::ORIGIN, "https://evil.test")
        .body(Body::empty())
        .unwrap();
    let resp = app(state).oneshot(req).await.unwrap();
    assert!(resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

#[test]
fn cors_layer_tolerates_invalid_origin() {
    // Header values cannot contain newlines; falls back to the default origin.
    let _layer = cors_layer("http://bad\norigin");
}
