//! OAuth 2.0 sign-in against Google and GitHub.
//!
//! # Flow
//!
//! 1. `GET /api/auth/signin/{provider}` stores a random `state` in the session
//!    and redirects to [`OAuthClient::authorization_url`]
//! 2. The provider redirects back to `/api/auth/callback/{provider}`
//! 3. [`OAuthClient::exchange_code`] trades the code for an access token
//! 4. [`OAuthClient::fetch_profile`] loads the account ID, email, and name
//!
//! A provider is only available when both its client ID and secret are
//! configured.

use std::sync::Arc;

use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;

use crate::config::{OAuthClientConfig, OAuthConfig};

const USER_AGENT: &str = "Solemart/1.0";

/// Errors from the OAuth provider client.
#[derive(Debug, Error)]
pub enum OAuthError {
    /// The provider name is not one we support.
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    /// The provider is supported but has no credentials configured.
    #[error("provider not configured: {0}")]
    NotConfigured(&'static str),

    /// HTTP transport error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The token endpoint rejected the authorization code.
    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    /// The profile endpoint failed or returned unusable data.
    #[error("profile request failed: {0}")]
    Profile(String),

    /// The provider account has no usable email address.
    #[error("provider account has no verified email")]
    MissingEmail,
}

/// Supported OAuth providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OAuthProvider {
    Google,
    GitHub,
}

impl OAuthProvider {
    /// All supported providers, in display order.
    pub const ALL: [Self; 2] = [Self::Google, Self::GitHub];

    /// Identifier used in URLs and stored on linked accounts.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::GitHub => "github",
        }
    }

    /// Human-readable provider name.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Google => "Google",
            Self::GitHub => "GitHub",
        }
    }

    const fn authorize_endpoint(self) -> &'static str {
        match self {
            Self::Google => "https://accounts.google.com/o/oauth2/v2/auth",
            Self::GitHub => "https://github.com/login/oauth/authorize",
        }
    }

    const fn token_endpoint(self) -> &'static str {
        match self {
            Self::Google => "https://oauth2.googleapis.com/token",
            Self::GitHub => "https://github.com/login/oauth/access_token",
        }
    }

    const fn scope(self) -> &'static str {
        match self {
            Self::Google => "openid email profile",
            Self::GitHub => "read:user user:email",
        }
    }
}

impl std::fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OAuthProvider {
    type Err = OAuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "google" => Ok(Self::Google),
            "github" => Ok(Self::GitHub),
            other => Err(OAuthError::UnknownProvider(other.to_string())),
        }
    }
}

/// Identity returned by a provider after a successful sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthProfile {
    pub provider: OAuthProvider,
    /// Stable account identifier at the provider.
    pub provider_account_id: String,
    /// Email address as reported by the provider (not yet normalized).
    pub email: String,
    /// Display name, if the provider has one.
    pub name: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Provider Response Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    sub: String,
    email: Option<String>,
    #[serde(default)]
    email_verified: bool,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubUser {
    id: i64,
    login: String,
    name: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubEmail {
    email: String,
    primary: bool,
    verified: bool,
}

impl GoogleUserInfo {
    fn into_profile(self) -> Result<OAuthProfile, OAuthError> {
        let email = self
            .email
            .filter(|_| self.email_verified)
            .ok_or(OAuthError::MissingEmail)?;

        Ok(OAuthProfile {
            provider: OAuthProvider::Google,
            provider_account_id: self.sub,
            email,
            name: self.name.filter(|n| !n.trim().is_empty()),
        })
    }
}

impl GitHubUser {
    fn into_profile(self, emails: &[GitHubEmail]) -> Result<OAuthProfile, OAuthError> {
        let email = emails
            .iter()
            .find(|e| e.primary && e.verified)
            .map(|e| e.email.clone())
            .or(self.email)
            .ok_or(OAuthError::MissingEmail)?;

        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(self.login);

        Ok(OAuthProfile {
            provider: OAuthProvider::GitHub,
            provider_account_id: self.id.to_string(),
            email,
            name: Some(name),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Client
// ─────────────────────────────────────────────────────────────────────────────

/// HTTP client for the configured OAuth providers.
#[derive(Clone)]
pub struct OAuthClient {
    inner: Arc<OAuthClientInner>,
}

struct OAuthClientInner {
    http: reqwest::Client,
    config: OAuthConfig,
}

impl OAuthClient {
    /// Create a new OAuth client.
    #[must_use]
    pub fn new(config: &OAuthConfig) -> Self {
        Self {
            inner: Arc::new(OAuthClientInner {
                http: reqwest::Client::new(),
                config: config.clone(),
            }),
        }
    }

    /// Providers that have credentials configured.
    #[must_use]
    pub fn enabled_providers(&self) -> Vec<OAuthProvider> {
        OAuthProvider::ALL
            .into_iter()
            .filter(|p| self.credentials(*p).is_ok())
            .collect()
    }

    fn credentials(&self, provider: OAuthProvider) -> Result<&OAuthClientConfig, OAuthError> {
        let config = match provider {
            OAuthProvider::Google => self.inner.config.google.as_ref(),
            OAuthProvider::GitHub => self.inner.config.github.as_ref(),
        };
        config.ok_or(OAuthError::NotConfigured(provider.as_str()))
    }

    /// Build the provider authorization URL to redirect the browser to.
    ///
    /// # Errors
    ///
    /// Returns `OAuthError::NotConfigured` if the provider has no credentials.
    pub fn authorization_url(
        &self,
        provider: OAuthProvider,
        redirect_uri: &str,
        state: &str,
    ) -> Result<String, OAuthError> {
        let credentials = self.credentials(provider)?;

        Ok(format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}",
            provider.authorize_endpoint(),
            urlencoding::encode(&credentials.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(provider.scope()),
            urlencoding::encode(state),
        ))
    }

    /// Exchange an authorization code for an access token.
    ///
    /// # Errors
    ///
    /// Returns `OAuthError::TokenExchange` if the provider rejects the code.
    pub async fn exchange_code(
        &self,
        provider: OAuthProvider,
        code: &str,
        redirect_uri: &str,
    ) -> Result<String, OAuthError> {
        let credentials = self.credentials(provider)?;

        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.expose_secret()),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ];

        let response = self
            .inner
            .http
            .post(provider.token_endpoint())
            .header("Accept", "application/json")
            .header("User-Agent", USER_AGENT)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(OAuthError::TokenExchange(format!("{status}: {text}")));
        }

        // GitHub reports errors with a 200 status and an `error` field.
        let token: TokenResponse = response.json().await?;
        match token {
            TokenResponse {
                access_token: Some(access_token),
                ..
            } => Ok(access_token),
            TokenResponse {
                error,
                error_description,
                ..
            } => Err(OAuthError::TokenExchange(
                error_description
                    .or(error)
                    .unwrap_or_else(|| "no access token in response".to_string()),
            )),
        }
    }

    /// Fetch the signed-in account's profile.
    ///
    /// # Errors
    ///
    /// Returns `OAuthError::Profile` if the provider call fails and
    /// `OAuthError::MissingEmail` if no verified email is available.
    pub async fn fetch_profile(
        &self,
        provider: OAuthProvider,
        access_token: &str,
    ) -> Result<OAuthProfile, OAuthError> {
        match provider {
            OAuthProvider::Google => {
                let info: GoogleUserInfo = self
                    .get_json(
                        "https://openidconnect.googleapis.com/v1/userinfo",
                        access_token,
                    )
                    .await?;
                info.into_profile()
            }
            OAuthProvider::GitHub => {
                let user: GitHubUser = self
                    .get_json("https://api.github.com/user", access_token)
                    .await?;
                let emails: Vec<GitHubEmail> = self
                    .get_json("https://api.github.com/user/emails", access_token)
                    .await?;
                user.into_profile(&emails)
            }
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        access_token: &str,
    ) -> Result<T, OAuthError> {
        let response = self
            .inner
            .http
            .get(url)
            .bearer_auth(access_token)
            .header("Accept", "application/json")
            .header("User-Agent", USER_AGENT)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(OAuthError::Profile(format!("{url} ({status}): {text}")));
        }

        Ok(response.json().await?)
    }
}
