//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SOLEMART_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `SOLEMART_BASE_URL` - Public URL of the site (OAuth redirect URIs are built from it)
//! - `SOLEMART_SESSION_SECRET` - Session cookie signing key (min 64 chars, high entropy)
//!
//! ## Optional
//! - `SOLEMART_HOST` - Bind address (default: 127.0.0.1)
//! - `SOLEMART_PORT` - Listen port (default: 3000)
//! - `SOLEMART_CATALOG_LIMIT` - Max entries on `GET /api/products` (default: 100)
//! - `SOLEMART_PLACEHOLDER_IMAGE` - Image used when a product has none (default: `/shoes1.jpg`)
//! - `SOLEMART_TRUST_PROXY_HEADERS` - Key rate limits on client IP headers set by a
//!   trusted reverse proxy instead of the peer address (default: false)
//! - `GOOGLE_CLIENT_ID` / `GOOGLE_CLIENT_SECRET` - Enables Google sign-in
//! - `GITHUB_ID` / `GITHUB_SECRET` - Enables GitHub sign-in
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_SESSION_SECRET_LENGTH: usize = 64;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_CATALOG_LIMIT: i64 = 100;
const DEFAULT_PLACEHOLDER_IMAGE: &str = "/shoes1.jpg";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL (no trailing slash)
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Whether proxy-set client IP headers identify the caller for rate limiting
    pub trust_proxy_headers: bool,
    /// Catalog presentation settings
    pub catalog: CatalogConfig,
    /// OAuth providers that have both client ID and secret configured
    pub oauth: OAuthConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

/// Buyer-facing catalog settings.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Maximum number of entries returned by the catalog listing.
    pub listing_limit: i64,
    /// Image URL injected when a product has none stored.
    pub placeholder_image: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            listing_limit: DEFAULT_CATALOG_LIMIT,
            placeholder_image: DEFAULT_PLACEHOLDER_IMAGE.to_string(),
        }
    }
}

/// Client credentials for one OAuth provider.
///
/// Implements `Debug` manually to redact the client secret.
#[derive(Clone)]
pub struct OAuthClientConfig {
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: SecretString,
}

impl std::fmt::Debug for OAuthClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthClientConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// OAuth provider configuration. A provider is enabled only when both its
/// client ID and secret are set.
#[derive(Debug, Clone, Default)]
pub struct OAuthConfig {
    /// Google sign-in
    pub google: Option<OAuthClientConfig>,
    /// GitHub sign-in
    pub github: Option<OAuthClientConfig>,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("SOLEMART_DATABASE_URL")?;
        let host = get_env_or_default("SOLEMART_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("SOLEMART_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("SOLEMART_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("SOLEMART_PORT".to_string(), e.to_string()))?;
        let base_url = normalize_base_url(&get_required_env("SOLEMART_BASE_URL")?)?;
        let session_secret = get_validated_secret("SOLEMART_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "SOLEMART_SESSION_SECRET")?;

        let trust_proxy_headers = get_bool_env("SOLEMART_TRUST_PROXY_HEADERS", false)?;
        let catalog = CatalogConfig::from_env()?;
        let oauth = OAuthConfig::from_env();

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            trust_proxy_headers,
            catalog,
            oauth,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// OAuth callback URL for a provider, e.g. `{base_url}/api/auth/callback/google`.
    #[must_use]
    pub fn oauth_redirect_uri(&self, provider: &str) -> String {
        format!("{}/api/auth/callback/{provider}", self.base_url)
    }
}

impl CatalogConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let listing_limit = match get_optional_env("SOLEMART_CATALOG_LIMIT") {
            Some(raw) => {
                let limit = raw.parse::<i64>().map_err(|e| {
                    ConfigError::InvalidEnvVar("SOLEMART_CATALOG_LIMIT".to_string(), e.to_string())
                })?;
                if limit <= 0 {
                    return Err(ConfigError::InvalidEnvVar(
                        "SOLEMART_CATALOG_LIMIT".to_string(),
                        "must be positive".to_string(),
                    ));
                }
                limit
            }
            None => DEFAULT_CATALOG_LIMIT,
        };

        Ok(Self {
            listing_limit,
            placeholder_image: get_env_or_default(
                "SOLEMART_PLACEHOLDER_IMAGE",
                DEFAULT_PLACEHOLDER_IMAGE,
            ),
        })
    }
}

impl OAuthConfig {
    fn from_env() -> Self {
        Self {
            google: get_oauth_client("GOOGLE_CLIENT_ID", "GOOGLE_CLIENT_SECRET"),
            github: get_oauth_client("GITHUB_ID", "GITHUB_SECRET"),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Get a boolean environment variable (`true`/`false`/`1`/`0`).
fn get_bool_env(key: &str, default: bool) -> Result<bool, ConfigError> {
    get_optional_env(key).map_or(Ok(default), |raw| parse_bool(key, &raw))
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected true or false, got {raw:?}"),
        )),
    }
}

/// Both halves of an OAuth client must be present to enable the provider.
fn get_oauth_client(id_key: &str, secret_key: &str) -> Option<OAuthClientConfig> {
    let client_id = get_optional_env(id_key)?;
    let client_secret = get_optional_env(secret_key)?;
    Some(OAuthClientConfig {
        client_id,
        client_secret: SecretString::from(client_secret),
    })
}

/// Parse the base URL and strip any trailing slash.
fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let parsed = url::Url::parse(raw).map_err(|e| {
        ConfigError::InvalidEnvVar("SOLEMART_BASE_URL".to_string(), e.to_string())
    })?;
    if parsed.host_str().is_none() {
        return Err(ConfigError::InvalidEnvVar(
            "SOLEMART_BASE_URL".to_string(),
            "must have a host".to_string(),
        ));
    }
    Ok(raw.trim_end_matches('/').to_string())
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    pub(crate) fn test_config() -> ServerConfig {
        ServerConfig {
            database_url: SecretString::from("postgres://localhost/solemart_test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "https://shop.test".to_string(),
            session_secret: SecretString::from("k".repeat(64)),
            trust_proxy_headers: false,
            catalog: CatalogConfig::default(),
            oauth: OAuthConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    #[test]
    fn test_shannon_entropy_bounds() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("zzzzzz") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!(shannon_entropy("Qm7#vT2!pL9@xR4$") > MIN_ENTROPY_BITS_PER_CHAR);
    }

    #[test]
    fn test_validate_secret_strength_rejects_placeholders() {
        for candidate in ["your-session-key", "changeme-now-please", "MY_SECRET_VALUE"] {
            let err = validate_secret_strength(candidate, "TEST_VAR").unwrap_err();
            assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
        }
    }

    #[test]
    fn test_validate_secret_strength_rejects_low_entropy() {
        let result = validate_secret_strength(&"ab".repeat(20), "TEST_VAR");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_secret_strength_accepts_random() {
        let result = validate_secret_strength("Zr8$Kq1!wN5@hJ3#tB6&yV0*cM2^gF4", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_session_secret_length() {
        assert!(validate_session_secret(&SecretString::from("short"), "S").is_err());
        assert!(validate_session_secret(&SecretString::from("a".repeat(64)), "S").is_ok());
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("T", " TRUE ").unwrap());
        assert!(parse_bool("T", "1").unwrap());
        assert!(!parse_bool("T", "false").unwrap());
        assert!(matches!(
            parse_bool("T", "sometimes"),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url("https://shop.test/").unwrap(),
            "https://shop.test"
        );
        assert!(normalize_base_url("not a url").is_err());
    }

    #[test]
    fn test_socket_addr_and_redirect_uri() {
        let config = test_config();
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
        assert_eq!(
            config.oauth_redirect_uri("github"),
            "https://shop.test/api/auth/callback/github"
        );
    }

    #[test]
    fn test_catalog_defaults() {
        let catalog = CatalogConfig::default();
        assert_eq!(catalog.listing_limit, 100);
        assert_eq!(catalog.placeholder_image, "/shoes1.jpg");
    }

    #[test]
    fn test_oauth_client_debug_redacts_secret() {
        let client = OAuthClientConfig {
            client_id: "client-id-value".to_string(),
            client_secret: SecretString::from("super-hidden-client-secret"),
        };

        let debug_output = format!("{client:?}");
        assert!(debug_output.contains("client-id-value"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super-hidden-client-secret"));
    }
}

#[cfg(test)]
pub(crate) use tests::test_config;
