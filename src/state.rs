//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! owns the user directory, the session store, the identity provider and the
//! cookie signing key. Stores and provider sit behind trait objects so tests
//! can run the full router without Postgres or Google.

use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use sha2::{Digest, Sha512};

use crate::config::AppConfig;
use crate::services::auth::IdentityProvider;
use crate::services::session::SessionStore;
use crate::services::users::UserDirectory;

/// Shared application state. Clone is required by Axum; every field is cheap
/// to clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserDirectory>,
    pub sessions: Arc<dyn SessionStore>,
    pub provider: Arc<dyn IdentityProvider>,
    pub cookie_key: Key,
}

impl AppState {
    #[must_use]
    pub fn new(
        config: AppConfig,
        users: Arc<dyn UserDirectory>,
        sessions: Arc<dyn SessionStore>,
        provider: Arc<dyn IdentityProvider>,
    ) -> Self {
        let cookie_key = cookie_key(&config.session_secret);
        Self { config: Arc::new(config), users, sessions, provider, cookie_key }
    }
}

/// Derive the 64-byte cookie signing key from the configured secret.
#[must_use]
pub fn cookie_key(secret: &str) -> Key {
    let digest = Sha512::digest(secret.as_bytes());
    Key::from(digest.as_slice())
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
