//! User directory — maps a Google subject id to a local user record.
//!
//! DESIGN
//! ======
//! Lookup-or-create is the only write path. Records are created once, on the
//! first successful login for an `external_id`, and never updated afterwards:
//! a changed Google name or photo is not copied onto an existing user.
//!
//! Two first logins racing for the same `external_id` are settled by the
//! `users.google_id` unique constraint. The loser sees
//! [`DirectoryError::Conflict`] and re-reads the winner's row.

use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// A locally known user.
///
/// Serialized field names match what the frontend reads from `/api/user`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    #[serde(rename = "googleId")]
    pub external_id: String,
    #[serde(rename = "name")]
    pub display_name: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "photo")]
    pub avatar_url: Option<String>,
}

/// Profile reported by the identity provider, validated at the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    pub external_id: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}

impl ProviderProfile {
    /// Build a profile, rejecting a blank subject and dropping blank optional
    /// fields.
    #[must_use]
    pub fn new(
        external_id: &str,
        display_name: Option<String>,
        email: Option<String>,
        avatar_url: Option<String>,
    ) -> Option<Self> {
        let external_id = external_id.trim();
        if external_id.is_empty() {
            return None;
        }
        Some(Self {
            external_id: external_id.to_owned(),
            display_name: non_blank(display_name),
            email: non_blank(email),
            avatar_url: non_blank(avatar_url),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("user already exists for external id {0}")]
    Conflict(String),
    #[error("user for external id {0} vanished after insert conflict")]
    ConflictUnresolved(String),
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

/// Persistent store of users.
#[async_trait::async_trait]
pub trait UserDirectory: Send + Sync {
    /// Find the user created for a provider subject id.
    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<User>, DirectoryError>;

    /// Insert a new user. Fails with [`DirectoryError::Conflict`] when the
    /// `external_id` is already taken.
    async fn create(&self, profile: &ProviderProfile) -> Result<User, DirectoryError>;

    /// Rehydrate a user from the id stored in a session.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DirectoryError>;
}

/// Result of [`lookup_or_create`].
#[derive(Debug, Clone)]
pub struct Resolved {
    pub user: User,
    /// `true` when this call inserted the record.
    pub created: bool,
}

/// Return the user for `profile.external_id`, creating it on first sight.
///
/// # Errors
///
/// Propagates store failures. A lost insert race is not an error: the
/// existing record is returned with `created == false`.
pub async fn lookup_or_create(
    directory: &dyn UserDirectory,
    profile: &ProviderProfile,
) -> Result<Resolved, DirectoryError> {
    if let Some(user) = directory
        .find_by_external_id(&profile.external_id)
        .await?
    {
        return Ok(Resolved { user, created: false });
    }

    match directory.create(profile).await {
        Ok(user) => Ok(Resolved { user, created: true }),
        Err(DirectoryError::Conflict(external_id)) => {
            tracing::debug!(%external_id, "concurrent first login; reading winner");
            let user = directory
                .find_by_external_id(&external_id)
                .await?
                .ok_or(DirectoryError::ConflictUnresolved(external_id))?;
            Ok(Resolved { user, created: false })
        }
        Err(e) => Err(e),
    }
}

// =============================================================================
// POSTGRES
// =============================================================================

/// [`UserDirectory`] backed by the `users` table.
#[derive(Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        external_id: row.get("google_id"),
        display_name: row.get("name"),
        email: row.get("email"),
        avatar_url: row.get("photo"),
    }
}

#[async_trait::async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<User>, DirectoryError> {
        let row = sqlx::query("SELECT id, google_id, name, email, photo FROM users WHERE google_id = $1")
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(user_from_row))
    }

    async fn create(&self, profile: &ProviderProfile) -> Result<User, DirectoryError> {
        let row = sqlx::query(
            r"INSERT INTO users (id, google_id, name, email, photo)
              VALUES ($1, $2, $3, $4, $5)
              ON CONFLICT (google_id) DO NOTHING
              RETURNING id, google_id, name, email, photo",
        )
        .bind(Uuid::new_v4())
        .bind(&profile.external_id)
        .bind(&profile.display_name)
        .bind(&profile.email)
        .bind(&profile.avatar_url)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref()
            .map(user_from_row)
            .ok_or_else(|| DirectoryError::Conflict(profile.external_id.clone()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DirectoryError> {
        let row = sqlx::query("SELECT id, google_id, name, email, photo FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(user_from_row))
    }
}

#[cfg(test)]
#[path = "users_test.rs"]
mod tests;
