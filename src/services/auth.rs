//! Login flow — provider exchange, user lookup-or-create, session creation.
//!
//! The route layer turns every [`AuthError`] into a redirect to the failure
//! URL, so nothing here needs to know about HTTP responses.

use super::session::{SessionError, SessionStore};
use super::users::{self, DirectoryError, ProviderProfile, User, UserDirectory};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("provider denied authorization: {0}")]
    Denied(String),
    #[error("oauth state mismatch")]
    InvalidState,
    #[error("malformed callback query: {0}")]
    MalformedCallback(String),
    #[error("token exchange failed: {0}")]
    TokenExchange(String),
    #[error("profile fetch failed: {0}")]
    Profile(String),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// An OAuth2 identity provider.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Consent-screen URL carrying the CSRF `state` value.
    fn authorize_url(&self, state: &str) -> String;

    /// Trade an authorization code for the user's profile.
    async fn exchange(&self, code: &str) -> Result<ProviderProfile, AuthError>;
}

/// A finished login.
#[derive(Debug, Clone)]
pub struct Login {
    pub user: User,
    pub created: bool,
    pub token: String,
}

/// Complete a login for an authorization code.
///
/// # Errors
///
/// Returns the first failing step. No session exists when this fails; a
/// user row may exist if only the session insert failed.
pub async fn complete_login(
    provider: &dyn IdentityProvider,
    directory: &dyn UserDirectory,
    sessions: &dyn SessionStore,
    code: &str,
) -> Result<Login, AuthError> {
    let profile = provider.exchange(code).await?;
    let resolved = users::lookup_or_create(directory, &profile).await?;
    let token = sessions.create(resolved.user.id).await?;

    let user = resolved.user;
    tracing::info!(
        user_id = %user.id,
        google_id = %user.external_id,
        name = user.display_name.as_deref().unwrap_or(""),
        email = user.email.as_deref().unwrap_or(""),
        photo = user.avatar_url.as_deref().unwrap_or(""),
        created = resolved.created,
        "user logged in"
    );

    Ok(Login { user, created: resolved.created, token })
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
