//! Authentication route handlers.
//!
//! Credential sign-up/sign-in, session inspection, logout, and the OAuth
//! authorization-code flow for the configured providers.

use axum::{
    Json,
    extract::{Query, State},
    http::{StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use rand::{Rng, distr::Alphanumeric};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::{OptionalUser, clear_current_user, set_current_user};
use crate::models::session::keys;
use crate::models::{SessionUser, User, UserResponse};
use crate::services::auth::{AuthError, AuthService};
use crate::services::oauth::OAuthProvider;
use crate::state::AppState;

const OAUTH_STATE_LENGTH: usize = 32;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Credential sign-in body. Both fields are optional so that a missing field
/// produces the sign-in message rather than a deserialization error.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Credential sign-up body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

/// `{"user": ...}` envelope used by every auth endpoint that returns a user.
#[derive(Debug, Serialize)]
pub struct UserEnvelope {
    pub user: Option<UserResponse>,
}

impl From<&User> for UserEnvelope {
    fn from(user: &User) -> Self {
        Self {
            user: Some(UserResponse::from(user)),
        }
    }
}

/// A sign-in method shown to clients.
#[derive(Debug, Serialize)]
pub struct ProviderInfo {
    pub id: &'static str,
    pub name: &'static str,
}

/// Query parameters on the provider redirect back to us.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn generate_oauth_state() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(OAUTH_STATE_LENGTH)
        .map(char::from)
        .collect()
}

/// `302 Found` to an absolute or relative URL.
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, location.to_string())]).into_response()
}

fn parse_provider(name: &str) -> Result<OAuthProvider> {
    name.parse::<OAuthProvider>()
        .map_err(|e| AppError::Auth(AuthError::OAuth(e)))
}

async fn start_session(session: &Session, user: &User) -> Result<()> {
    let token = SessionUser::issue(user, Utc::now());
    set_current_user(session, &token).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}

// =============================================================================
// Credentials
// =============================================================================

/// Create a credential account and sign it in.
///
/// # Route
///
/// `POST /api/auth/register`
#[instrument(skip(state, session, body))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<Response> {
    let (Some(email), Some(password)) = (
        non_empty(body.email.as_deref()),
        non_empty(body.password.as_deref()),
    ) else {
        return Err(AppError::Validation(
            "Please enter email and password".to_string(),
        ));
    };

    let user = AuthService::new(state.pool())
        .register_with_password(email, password, body.name.as_deref())
        .await?;

    start_session(&session, &user).await?;

    Ok((StatusCode::CREATED, Json(UserEnvelope::from(&user))).into_response())
}

/// Sign in with email and password.
///
/// # Route
///
/// `POST /api/auth/login`
#[instrument(skip(state, session, body))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<UserEnvelope>> {
    let (Some(email), Some(password)) = (
        non_empty(body.email.as_deref()),
        non_empty(body.password.as_deref()),
    ) else {
        return Err(AppError::Validation(
            "Please enter email and password".to_string(),
        ));
    };

    let user = AuthService::new(state.pool())
        .login_with_password(email, password)
        .await
        .inspect_err(|e| {
            if matches!(e, AuthError::InvalidCredentials) {
                tracing::info!("Credential sign-in rejected");
            }
        })?;

    start_session(&session, &user).await?;
    tracing::info!(user_id = %user.id, "User signed in with credentials");

    Ok(Json(UserEnvelope::from(&user)))
}

/// End the session.
///
/// # Route
///
/// `POST /api/auth/logout`
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Json<serde_json::Value>> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(Json(json!({ "success": true })))
}

/// Current session user with any profile name parts, or `{"user": null}`.
///
/// # Route
///
/// `GET /api/auth/session`
#[instrument(skip(state, user))]
pub async fn session_info(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
) -> Result<Json<UserEnvelope>> {
    let Some(token) = user else {
        return Ok(Json(UserEnvelope { user: None }));
    };

    let auth = AuthService::new(state.pool());
    let Some(user) = auth.current_user(&token).await? else {
        return Ok(Json(UserEnvelope { user: None }));
    };
    let profile = auth.profile(&user).await?;

    Ok(Json(UserEnvelope {
        user: Some(UserResponse::from(&user).with_profile(profile.as_ref())),
    }))
}

/// Sign-in methods available on this deployment.
///
/// # Route
///
/// `GET /api/auth/providers`
pub async fn providers(State(state): State<AppState>) -> Json<Vec<ProviderInfo>> {
    let mut list = vec![ProviderInfo {
        id: "credentials",
        name: "Credentials",
    }];
    list.extend(
        state
            .oauth()
            .enabled_providers()
            .into_iter()
            .map(|p| ProviderInfo {
                id: p.as_str(),
                name: p.display_name(),
            }),
    );
    Json(list)
}

// =============================================================================
// OAuth
// =============================================================================

/// Redirect the browser to the provider's consent page.
///
/// # Route
///
/// `GET /api/auth/signin/{provider}`
#[instrument(skip(state, session))]
pub async fn oauth_signin(
    State(state): State<AppState>,
    session: Session,
    ApiPath(provider): ApiPath<String>,
) -> Result<Response> {
    let provider = parse_provider(&provider)?;
    let oauth_state = generate_oauth_state();
    let redirect_uri = state.config().oauth_redirect_uri(provider.as_str());

    let url = state
        .oauth()
        .authorization_url(provider, &redirect_uri, &oauth_state)
        .map_err(AuthError::from)?;

    session.insert(keys::OAUTH_STATE, &oauth_state).await?;

    Ok(found(&url))
}

/// Complete the authorization-code flow and sign the user in.
///
/// # Route
///
/// `GET /api/auth/callback/{provider}`
#[instrument(skip(state, session, query))]
pub async fn oauth_callback(
    State(state): State<AppState>,
    session: Session,
    ApiPath(provider): ApiPath<String>,
    Query(query): Query<CallbackQuery>,
) -> Result<Response> {
    let provider = parse_provider(&provider)?;

    if let Some(error) = query.error {
        let description = query.error_description.unwrap_or_default();
        tracing::warn!(%provider, %error, %description, "Provider denied authorization");
        return Err(AppError::Unauthorized("Sign-in was cancelled".to_string()));
    }

    let Some(code) = query.code else {
        return Err(AppError::Validation("code required".to_string()));
    };

    // One-time use: removed whether or not it matches.
    let stored_state: Option<String> = session.remove(keys::OAUTH_STATE).await?;
    if stored_state.is_none() || stored_state != query.state {
        tracing::warn!(%provider, "OAuth state mismatch");
        return Err(AuthError::InvalidSessionState.into());
    }

    let redirect_uri = state.config().oauth_redirect_uri(provider.as_str());
    let oauth = state.oauth();

    let access_token = oauth
        .exchange_code(provider, &code, &redirect_uri)
        .await
        .map_err(AuthError::from)?;
    let profile = oauth
        .fetch_profile(provider, &access_token)
        .await
        .map_err(AuthError::from)?;

    let user = AuthService::new(state.pool())
        .sign_in_with_oauth(&profile)
        .await?;

    start_session(&session, &user).await?;
    tracing::info!(user_id = %user.id, %provider, "User signed in with OAuth");

    let base_url = &state.config().base_url;
    Ok(found(if base_url.is_empty() { "/" } else { base_url }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::oauth::OAuthError;

    #[test]
    fn test_oauth_state_is_alphanumeric() {
        let a = generate_oauth_state();
        let b = generate_oauth_state();
        assert_eq!(a.len(), OAUTH_STATE_LENGTH);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_non_empty_treats_blank_as_missing() {
        assert_eq!(non_empty(Some("a@b.co")), Some("a@b.co"));
        assert_eq!(non_empty(Some("   ")), None);
        assert_eq!(non_empty(None), None);
    }

    #[test]
    fn test_found_uses_302() {
        let response = found("https://accounts.example/authorize");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(LOCATION).and_then(|v| v.to_str().ok()),
            Some("https://accounts.example/authorize")
        );
    }

    #[test]
    fn test_parse_provider_unknown_is_not_found() {
        assert!(matches!(parse_provider("github"), Ok(OAuthProvider::GitHub)));
        assert!(matches!(
            parse_provider("apple"),
            Err(AppError::Auth(AuthError::OAuth(OAuthError::UnknownProvider(_))))
        ));
    }
}
