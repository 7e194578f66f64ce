//! Server-side sessions and random token generation.
//!
//! ARCHITECTURE
//! ============
//! A session binds an opaque random token to a user id. The browser only ever
//! holds the token, inside a cookie signed with the `SESSION_SECRET`-derived
//! key, so a forged cookie is rejected before the store is consulted.
//!
//! Lifetime is whatever the store grants: the Postgres table defaults
//! `expires_at` to 30 days after creation and nothing else expires sessions.

use std::fmt::Write;

use rand::Rng;
use sqlx::{PgPool, Row};
use uuid::Uuid;

pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Generate a cryptographically random 32-byte hex token.
#[must_use]
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    bytes_to_hex(&bytes)
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

/// Storage for live sessions.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Open a session for `user_id` and return its token.
    async fn create(&self, user_id: Uuid) -> Result<String, SessionError>;

    /// Resolve a token to the user it was issued for.
    async fn user_id(&self, token: &str) -> Result<Option<Uuid>, SessionError>;

    /// Forget a session. Unknown tokens are not an error.
    async fn delete(&self, token: &str) -> Result<(), SessionError>;
}

/// [`SessionStore`] backed by the `sessions` table.
#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl SessionStore for PgSessionStore {
    async fn create(&self, user_id: Uuid) -> Result<String, SessionError> {
        let token = generate_token();
        sqlx::query("INSERT INTO sessions (token, user_id) VALUES ($1, $2)")
            .bind(&token)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(token)
    }

    async fn user_id(&self, token: &str) -> Result<Option<Uuid>, SessionError> {
        let row = sqlx::query("SELECT user_id FROM sessions WHERE token = $1 AND expires_at > now()")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get("user_id")))
    }

    async fn delete(&self, token: &str) -> Result<(), SessionError> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
