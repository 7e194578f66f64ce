//! Auth routes — Google OAuth flow, session cookie, logout.

use axum::extract::rejection::QueryRejection;
use axum::extract::{FromRef, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite, SignedCookieJar};
use serde::Deserialize;
use time::Duration;

use crate::services::auth::{self as auth_svc, AuthError};
use crate::services::session;
use crate::services::users::User;
use crate::state::AppState;

pub(crate) const COOKIE_NAME: &str = "session_token";
pub(crate) const OAUTH_STATE_COOKIE_NAME: &str = "oauth_state";

fn base_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

fn expired_cookie(name: &'static str, secure: bool) -> Cookie<'static> {
    let mut cookie = base_cookie(name, String::new(), secure);
    cookie.set_max_age(Duration::ZERO);
    cookie
}

// =============================================================================
// AUTH EXTRACTOR
// =============================================================================

/// Why a request could not be bound to a user.
#[derive(Debug)]
pub enum AuthRejection {
    Unauthenticated,
    Internal,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthenticated => {
                (StatusCode::UNAUTHORIZED, Json(serde_json::json!({ "message": "Not authenticated" }))).into_response()
            }
            Self::Internal => {
                (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({ "message": "Internal server error" })))
                    .into_response()
            }
        }
    }
}

/// Authenticated user extracted from the signed session cookie.
/// Use as a handler parameter to require authentication.
pub struct AuthUser {
    pub user: User,
}

impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let jar = SignedCookieJar::from_headers(&parts.headers, app_state.cookie_key.clone());
        let Some(token) = jar
            .get(COOKIE_NAME)
            .map(|c| c.value().to_owned())
            .filter(|t| !t.is_empty())
        else {
            return Err(AuthRejection::Unauthenticated);
        };

        let user_id = app_state
            .sessions
            .user_id(&token)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "session lookup failed");
                AuthRejection::Internal
            })?
            .ok_or(AuthRejection::Unauthenticated)?;

        let user = app_state
            .users
            .find_by_id(user_id)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, %user_id, "user lookup failed");
                AuthRejection::Internal
            })?
            .ok_or_else(|| {
                tracing::warn!(%user_id, "session refers to missing user");
                AuthRejection::Unauthenticated
            })?;

        Ok(Self { user })
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `GET /auth/google` — redirect to Google's consent screen.
pub async fn google_redirect(State(state): State<AppState>) -> Response {
    let oauth_state = session::generate_token();
    let mut cookie = base_cookie(OAUTH_STATE_COOKIE_NAME, oauth_state.clone(), state.config.cookie_secure);
    cookie.set_max_age(Duration::minutes(10));

    let jar = CookieJar::new().add(cookie);
    (jar, Redirect::temporary(&state.provider.authorize_url(&oauth_state))).into_response()
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

fn check_callback<'a>(params: &'a CallbackQuery, expected_state: &str) -> Result<&'a str, AuthError> {
    if let Some(error) = &params.error {
        return Err(AuthError::Denied(error.clone()));
    }
    let callback_state = params.state.as_deref().unwrap_or_default();
    if expected_state.is_empty() || expected_state != callback_state {
        return Err(AuthError::InvalidState);
    }
    params
        .code
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AuthError::Denied("missing authorization code".into()))
}

/// `GET /auth/google/callback` — exchange code, upsert user, set cookie, and
/// redirect to the frontend with `status=success` or `status=failure`.
pub async fn google_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    signed: SignedCookieJar,
    query: Result<Query<CallbackQuery>, QueryRejection>,
) -> Response {
    let secure = state.config.cookie_secure;
    let expected_state = jar
        .get(OAUTH_STATE_COOKIE_NAME)
        .map(|c| c.value().to_owned())
        .unwrap_or_default();
    let jar = jar.add(expired_cookie(OAUTH_STATE_COOKIE_NAME, secure));

    let result = match query {
        Ok(Query(params)) => match check_callback(&params, &expected_state) {
            Ok(code) => auth_svc::complete_login(&*state.provider, &*state.users, &*state.sessions, code).await,
            Err(e) => Err(e),
        },
        Err(rejection) => Err(AuthError::MalformedCallback(rejection.body_text())),
    };

    match result {
        Ok(login) => {
            tracing::debug!(user_id = %login.user.id, created = login.created, "session issued");
            let signed = signed.add(base_cookie(COOKIE_NAME, login.token, secure));
            (jar, signed, Redirect::temporary(&state.config.success_redirect())).into_response()
        }
        Err(e) => {
            match &e {
                AuthError::Denied(_) | AuthError::InvalidState | AuthError::MalformedCallback(_) => {
                    tracing::warn!(error = %e, "login rejected");
                }
                _ => tracing::error!(error = %e, "login failed"),
            }
            (jar, Redirect::temporary(&state.config.failure_redirect())).into_response()
        }
    }
}

async fn log_logout(state: &AppState, token: &str) {
    let user_id = match state.sessions.user_id(token).await {
        Ok(Some(user_id)) => user_id,
        Ok(None) => {
            tracing::debug!("logout with unknown session");
            return;
        }
        Err(e) => {
            tracing::warn!(error = %e, "session lookup failed during logout");
            return;
        }
    };

    match state.users.find_by_id(user_id).await {
        Ok(Some(user)) => tracing::info!(
            user_id = %user.id,
            google_id = %user.external_id,
            name = user.display_name.as_deref().unwrap_or(""),
            email = user.email.as_deref().unwrap_or(""),
            "logging out user"
        ),
        Ok(None) => tracing::info!(%user_id, "logging out session of missing user"),
        Err(e) => tracing::warn!(error = %e, %user_id, "user lookup failed during logout"),
    }
}

/// `GET /logout` — delete the session if there is one and clear the cookie.
pub async fn logout(State(state): State<AppState>, signed: SignedCookieJar) -> Response {
    if let Some(token) = signed.get(COOKIE_NAME).map(|c| c.value().to_owned()) {
        log_logout(&state, &token).await;
        if let Err(e) = state.sessions.delete(&token).await {
            tracing::error!(error = %e, "session delete failed");
            return AuthRejection::Internal.into_response();
        }
    }

    let jar = CookieJar::new().add(expired_cookie(COOKIE_NAME, state.config.cookie_secure));
    (jar, Json(serde_json::json!({ "message": "Logout successful" }))).into_response()
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
