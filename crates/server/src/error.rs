//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers return `Result<T, AppError>`,
//! and every failure reaches the client as `{"error": "<message>"}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::oauth::OAuthError;

const INTERNAL_MESSAGE: &str = "Internal server error";

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Payload failed schema or range validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found. Holds what was missing, e.g. `"Product"`.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Write conflicts with existing data.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Shorthand for the common "nobody signed in" rejection.
    #[must_use]
    pub fn unauthenticated() -> Self {
        Self::Unauthorized("Unauthorized".to_string())
    }

    /// Error mapper that names the missing resource on `RepositoryError::NotFound`.
    ///
    /// ```rust,ignore
    /// repo.delete(id).await.map_err(AppError::not_found_as("Product"))?;
    /// ```
    pub fn not_found_as(what: &'static str) -> impl FnOnce(RepositoryError) -> Self {
        move |err| match err {
            RepositoryError::NotFound => Self::NotFound(what.to_string()),
            other => Self::Database(other),
        }
    }

    /// HTTP status and client-safe message.
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::NotFound(what) => (StatusCode::NOT_FOUND, format!("{what} not found")),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            Self::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "Rate limited".to_string()),
            Self::Database(err) => repository_status(err),
            Self::Auth(err) => auth_status(err),
            Self::Session(_) | Self::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string())
            }
        }
    }
}

fn repository_status(err: &RepositoryError) -> (StatusCode, String) {
    match err {
        RepositoryError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
        RepositoryError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
        RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string())
        }
    }
}

fn auth_status(err: &AuthError) -> (StatusCode, String) {
    match err {
        AuthError::InvalidCredentials => {
            (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
        }
        AuthError::UserAlreadyExists => (
            StatusCode::CONFLICT,
            "An account with this email already exists".to_string(),
        ),
        AuthError::WeakPassword(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        AuthError::InvalidEmail(_) => {
            (StatusCode::BAD_REQUEST, "Invalid email address".to_string())
        }
        AuthError::InvalidSessionState => (
            StatusCode::UNAUTHORIZED,
            "Session expired, please try again".to_string(),
        ),
        AuthError::OAuth(OAuthError::UnknownProvider(_) | OAuthError::NotConfigured(_)) => {
            (StatusCode::NOT_FOUND, "Provider not found".to_string())
        }
        AuthError::OAuth(OAuthError::MissingEmail) => (
            StatusCode::UNAUTHORIZED,
            "Provider account has no verified email".to_string(),
        ),
        AuthError::OAuth(_) => (StatusCode::BAD_GATEWAY, "External service error".to_string()),
        AuthError::Repository(repo) => repository_status(repo),
        AuthError::PasswordHash => {
            (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string())
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("Product".to_string());
        assert_eq!(err.to_string(), "Not found: Product");

        let err = AppError::Validation("productId required".to_string());
        assert_eq!(err.to_string(), "Validation error: productId required");
    }

    #[tokio::test]
    async fn test_app_error_status_codes() {
        let cases = [
            (AppError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (AppError::NotFound("Cart item".into()), StatusCode::NOT_FOUND),
            (AppError::unauthenticated(), StatusCode::UNAUTHORIZED),
            (AppError::Conflict("dup".into()), StatusCode::CONFLICT),
            (AppError::RateLimited, StatusCode::TOO_MANY_REQUESTS),
            (AppError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (
                AppError::Database(RepositoryError::NotFound),
                StatusCode::NOT_FOUND,
            ),
            (
                AppError::Database(RepositoryError::Conflict("Product already exists".into())),
                StatusCode::CONFLICT,
            ),
            (
                AppError::Auth(AuthError::InvalidCredentials),
                StatusCode::UNAUTHORIZED,
            ),
            (
                AppError::Auth(AuthError::UserAlreadyExists),
                StatusCode::CONFLICT,
            ),
            (
                AppError::Auth(AuthError::OAuth(OAuthError::UnknownProvider("x".into()))),
                StatusCode::NOT_FOUND,
            ),
        ];

        for (err, expected) in cases {
            let (status, body) = render(err).await;
            assert_eq!(status, expected);
            assert!(body["error"].is_string());
        }
    }

    #[tokio::test]
    async fn test_body_is_json_error() {
        let (_, body) = render(AppError::NotFound("Product".to_string())).await;
        assert_eq!(body, serde_json::json!({"error": "Product not found"}));
    }

    #[tokio::test]
    async fn test_not_found_as_names_the_resource() {
        let err = AppError::not_found_as("Cart item")(RepositoryError::NotFound);
        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Cart item not found");

        let passthrough =
            AppError::not_found_as("Product")(RepositoryError::Conflict("Product already exists".into()));
        assert!(matches!(passthrough, AppError::Database(RepositoryError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let (status, body) = render(AppError::Database(RepositoryError::DataCorruption(
            "secret column detail".to_string(),
        )))
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
    }
}
