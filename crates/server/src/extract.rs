//! Request extractors that reject with the JSON error shape.
//!
//! axum's own `Json` and `Path` reject with plain-text bodies; these wrappers
//! turn every rejection into `400 {"error": ...}` via [`AppError::Validation`].

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Request, rejection::JsonRejection},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// JSON body extractor with JSON error responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

fn json_rejection_message(rejection: &JsonRejection) -> String {
    match rejection {
        JsonRejection::JsonDataError(err) => err.body_text(),
        JsonRejection::JsonSyntaxError(_) => "Malformed JSON body".to_string(),
        JsonRejection::MissingJsonContentType(_) => {
            "Expected request with `Content-Type: application/json`".to_string()
        }
        other => other.body_text(),
    }
}

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(AppError::Validation(json_rejection_message(&rejection))),
        }
    }
}

/// Path parameter extractor with JSON error responses.
#[derive(Debug, Clone, Copy)]
pub struct ApiPath<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<T>::from_request_parts(parts, state)
            .await
            .map(|Path(value)| Self(value))
            .map_err(|rejection| AppError::Validation(rejection.body_text()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{body::Body, http::header::CONTENT_TYPE};
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Payload {
        quantity: i32,
    }

    fn json_request(body: &'static str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_accepts_valid_json() {
        let ApiJson(payload) = ApiJson::<Payload>::from_request(json_request(r#"{"quantity":3}"#), &())
            .await
            .unwrap();
        assert_eq!(payload.quantity, 3);
    }

    #[tokio::test]
    async fn test_wrong_type_is_validation_error() {
        let err = ApiJson::<Payload>::from_request(json_request(r#"{"quantity":"many"}"#), &())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("quantity")));
    }

    #[tokio::test]
    async fn test_malformed_json_is_validation_error() {
        let err = ApiJson::<Payload>::from_request(json_request("{"), &())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg == "Malformed JSON body"));
    }

    #[tokio::test]
    async fn test_missing_content_type_is_validation_error() {
        let req = Request::builder()
            .method("POST")
            .uri("/")
            .body(Body::from(r#"{"quantity":1}"#))
            .unwrap();
        let err = ApiJson::<Payload>::from_request(req, &()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
