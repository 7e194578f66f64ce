//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! This module binds the OAuth, session and user endpoints under a single
//! Axum router. The marketing frontend runs on its own origin, so CORS allows
//! exactly `FRONTEND_URL` with credentials to let the session cookie through.

pub mod auth;
pub mod users;

use axum::Router;
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::DEFAULT_FRONTEND_URL;
use crate::state::AppState;

fn cors_layer(frontend_url: &str) -> CorsLayer {
    let origin = HeaderValue::from_str(frontend_url).unwrap_or_else(|_| {
        tracing::warn!(%frontend_url, "FRONTEND_URL is not a valid origin; using default");
        HeaderValue::from_static(DEFAULT_FRONTEND_URL)
    });

    CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
}

/// Full application router.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.frontend_url);

    Router::new()
        .route("/", get(root))
        .route("/healthz", get(healthz))
        .route("/auth/google", get(auth::google_redirect))
        .route("/auth/google/callback", get(auth::google_callback))
        .route("/api/user", get(users::current_user))
        .route("/logout", get(auth::logout))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> &'static str {
    "Backend is running"
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
