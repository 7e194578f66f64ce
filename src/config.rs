//! Process configuration parsed from environment variables.
//!
//! `main` loads `.env` through `dotenvy` before calling [`AppConfig::from_env`],
//! so local development can keep secrets out of the shell.

use crate::services::google::GoogleConfig;

pub const DEFAULT_PORT: u16 = 4000;
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:5173";
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {var}: {value}")]
    Invalid { var: &'static str, value: String },
}

/// Typed configuration for the whole server.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    /// Browser origin allowed by CORS and the base of the post-login redirects.
    pub frontend_url: String,
    pub session_secret: String,
    pub cookie_secure: bool,
    pub google: GoogleConfig,
}

impl AppConfig {
    /// Build config from the process environment.
    ///
    /// Required: `GOOGLE_CLIENT_ID`, `GOOGLE_CLIENT_SECRET`, `DATABASE_URL`,
    /// `SESSION_SECRET`.
    ///
    /// Optional: `PORT` (4000), `FRONTEND_URL` (`http://localhost:5173`),
    /// `GOOGLE_CALLBACK_URL`, `DB_MAX_CONNECTIONS` (5), `COOKIE_SECURE`
    /// (inferred from the callback URL scheme), and the Google endpoint
    /// overrides read by [`GoogleConfig::from_env`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a required variable is missing or a value
    /// does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match std::env::var("PORT") {
            Ok(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::Invalid { var: "PORT", value: raw })?,
            Err(_) => DEFAULT_PORT,
        };

        let database_url = required("DATABASE_URL")?;
        let session_secret = required("SESSION_SECRET")?;
        let frontend_url = std::env::var("FRONTEND_URL")
            .unwrap_or_else(|_| DEFAULT_FRONTEND_URL.to_owned())
            .trim_end_matches('/')
            .to_owned();
        let db_max_connections = env_parse("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS);

        let google = GoogleConfig::from_env(port)?;
        let cookie_secure = env_bool("COOKIE_SECURE").unwrap_or_else(|| google.callback_url.starts_with("https://"));

        Ok(Self { port, database_url, db_max_connections, frontend_url, session_secret, cookie_secure, google })
    }

    /// Where the browser lands after a successful login.
    #[must_use]
    pub fn success_redirect(&self) -> String {
        format!("{}/?status=success", self.frontend_url)
    }

    /// Where the browser lands after any failed login attempt.
    #[must_use]
    pub fn failure_redirect(&self) -> String {
        format!("{}/?status=failure", self.frontend_url)
    }
}

pub(crate) fn required(key: &'static str) -> Result<String, ConfigError> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(key))
}

pub(crate) fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .and_then(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}

pub(crate) fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
