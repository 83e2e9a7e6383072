//! Authentication extractors.
//!
//! The session token ([`SessionUser`]) is read from the session on every
//! request that needs identity. Once it is older than
//! `SESSION_TOKEN_REFRESH_SECS` it is re-issued with the role currently stored
//! in the database; a token whose user has been deleted ends the session.

use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::Utc;
use tower_sessions::Session;

use crate::error::{AppError, set_sentry_user};
use crate::models::session::{SessionUser, keys};
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Extractor that requires a signed-in user.
///
/// Rejects with `401 {"error": "Unauthorized"}` before the handler runs, so
/// no handler code (and no database write) executes for anonymous callers.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireUser(user): RequireUser) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireUser(pub SessionUser);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        load_session_user(parts, state)
            .await?
            .map(Self)
            .ok_or_else(AppError::unauthenticated)
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireUser`, this does not reject anonymous requests.
pub struct OptionalUser(pub Option<SessionUser>);

impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(load_session_user(parts, state).await?))
    }
}

async fn load_session_user(
    parts: &Parts,
    state: &AppState,
) -> Result<Option<SessionUser>, AppError> {
    // Set by SessionManagerLayer; absent only if the layer is missing.
    let Some(session) = parts.extensions.get::<Session>() else {
        return Ok(None);
    };

    let Some(token) = session.get::<SessionUser>(keys::CURRENT_USER).await? else {
        return Ok(None);
    };

    let now = Utc::now();
    if !token.needs_refresh(now) {
        return Ok(Some(token));
    }

    match AuthService::new(state.pool())
        .refresh_session(&token, now)
        .await?
    {
        Some(fresh) => {
            session.insert(keys::CURRENT_USER, &fresh).await?;
            set_sentry_user(&fresh.id, Some(fresh.email.as_str()));
            Ok(Some(fresh))
        }
        None => {
            tracing::info!(user_id = %token.id, "Session user no longer exists");
            session.flush().await?;
            Ok(None)
        }
    }
}

/// Store a freshly issued session token, rotating the session ID.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &SessionUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(keys::CURRENT_USER, user).await
}

/// End the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be deleted.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
