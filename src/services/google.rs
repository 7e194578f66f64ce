//! Google OAuth2 client — consent URL, code exchange, userinfo fetch.

use reqwest::Url;
use serde::Deserialize;

use super::auth::{AuthError, IdentityProvider};
use super::users::ProviderProfile;
use crate::config::{ConfigError, required};

pub const DEFAULT_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";
pub const SCOPES: &str = "profile email";

/// Google OAuth configuration loaded from environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub callback_url: String,
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

impl GoogleConfig {
    /// Load from `GOOGLE_CLIENT_ID`, `GOOGLE_CLIENT_SECRET` and optional
    /// `GOOGLE_CALLBACK_URL`, `GOOGLE_AUTH_URL`, `GOOGLE_TOKEN_URL`,
    /// `GOOGLE_USERINFO_URL`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when the client id or secret is unset,
    /// or [`ConfigError::Invalid`] when the consent URL does not parse.
    pub fn from_env(port: u16) -> Result<Self, ConfigError> {
        let client_id = required("GOOGLE_CLIENT_ID")?;
        let client_secret = required("GOOGLE_CLIENT_SECRET")?;
        let callback_url = std::env::var("GOOGLE_CALLBACK_URL")
            .unwrap_or_else(|_| format!("http://localhost:{port}/auth/google/callback"));
        let auth_url = std::env::var("GOOGLE_AUTH_URL").unwrap_or_else(|_| DEFAULT_AUTH_URL.to_owned());
        if Url::parse(&auth_url).is_err() {
            return Err(ConfigError::Invalid { var: "GOOGLE_AUTH_URL", value: auth_url });
        }
        let token_url = std::env::var("GOOGLE_TOKEN_URL").unwrap_or_else(|_| DEFAULT_TOKEN_URL.to_owned());
        let userinfo_url = std::env::var("GOOGLE_USERINFO_URL").unwrap_or_else(|_| DEFAULT_USERINFO_URL.to_owned());
        Ok(Self { client_id, client_secret, callback_url, auth_url, token_url, userinfo_url })
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Subset of the OpenID userinfo document that a user record is built from.
#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    sub: String,
    name: Option<String>,
    email: Option<String>,
    picture: Option<String>,
}

/// [`IdentityProvider`] talking to Google over HTTPS.
pub struct GoogleProvider {
    config: GoogleConfig,
    http: reqwest::Client,
}

impl GoogleProvider {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: GoogleConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("campus/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { config, http })
    }

    async fn access_token(&self, code: &str) -> Result<String, AuthError> {
        let resp = self
            .http
            .post(&self.config.token_url)
            .header("Accept", "application/json")
            .form(&[
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.callback_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| AuthError::TokenExchange(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| AuthError::TokenExchange(e.to_string()))?;
        if !status.is_success() {
            return Err(AuthError::TokenExchange(format!("{status}: {body}")));
        }
        let token_resp: TokenResponse =
            serde_json::from_str(&body).map_err(|_| AuthError::TokenExchange(format!("unexpected response: {body}")))?;
        Ok(token_resp.access_token)
    }

    async fn userinfo(&self, access_token: &str) -> Result<GoogleUserInfo, AuthError> {
        let resp = self
            .http
            .get(&self.config.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthError::Profile(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(AuthError::Profile(format!("{status}: {body}")));
        }

        resp.json::<GoogleUserInfo>()
            .await
            .map_err(|e| AuthError::Profile(e.to_string()))
    }
}

#[async_trait::async_trait]
impl IdentityProvider for GoogleProvider {
    fn authorize_url(&self, state: &str) -> String {
        let params = [
            ("response_type", "code"),
            ("client_id", self.config.client_id.as_str()),
            ("redirect_uri", self.config.callback_url.as_str()),
            ("scope", SCOPES),
            ("state", state),
        ];
        match Url::parse_with_params(&self.config.auth_url, &params) {
            Ok(url) => url.into(),
            Err(e) => {
                tracing::error!(error = %e, auth_url = %self.config.auth_url, "invalid GOOGLE_AUTH_URL");
                self.config.auth_url.clone()
            }
        }
    }

    async fn exchange(&self, code: &str) -> Result<ProviderProfile, AuthError> {
        let access_token = self.access_token(code).await?;
        let info = self.userinfo(&access_token).await?;
        ProviderProfile::new(&info.sub, info.name, info.email, info.picture)
            .ok_or_else(|| AuthError::Profile("userinfo has empty subject".into()))
    }
}

#[cfg(test)]
#[path = "google_test.rs"]
mod tests;
