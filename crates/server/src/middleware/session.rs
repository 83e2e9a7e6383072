//! Session middleware configuration.
//!
//! Sets up signed-cookie sessions using tower-sessions. Production uses the
//! `PostgreSQL` store; tests plug in `MemoryStore`.

use secrecy::ExposeSecret;
use tower_sessions::cookie::Key;
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};

use crate::config::ServerConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "solemart_session";

/// Session expiry after inactivity, in seconds (30 days).
const SESSION_EXPIRY_SECONDS: i64 = 30 * 24 * 60 * 60;

/// Error building the session layer.
#[derive(Debug, thiserror::Error)]
#[error("session secret cannot be used as a signing key: {0}")]
pub struct SessionKeyError(String);

/// Create the session layer for `store`.
///
/// The cookie is `HttpOnly`, `Secure`, `SameSite=Lax`, scoped to `/`, and
/// signed with the configured session secret.
///
/// # Errors
///
/// Returns `SessionKeyError` if the secret is too short to derive a key.
pub fn create_session_layer<S>(
    store: S,
    config: &ServerConfig,
) -> Result<SessionManagerLayer<S, SignedCookie>, SessionKeyError>
where
    S: SessionStore + Clone,
{
    let key = Key::try_from(config.session_secret.expose_secret().as_bytes())
        .map_err(|e| SessionKeyError(e.to_string()))?;

    Ok(SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(true)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(key))
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;
    use tower_sessions::MemoryStore;

    use super::*;
    use crate::config::test_config;

    #[test]
    fn test_rejects_short_secret() {
        let mut config = test_config();
        config.session_secret = SecretString::from("too-short");
        assert!(create_session_layer(MemoryStore::default(), &config).is_err());
    }

    #[test]
    fn test_accepts_configured_secret() {
        assert!(create_session_layer(MemoryStore::default(), &test_config()).is_ok());
    }
}
