//! Integration tests for Solemart.
//!
//! # Running Tests
//!
//! ```bash
//! # Apply migrations and start the server against a scratch database
//! solemart-cli migrate
//! solemart-server &
//!
//! # Run the ignored end-to-end tests
//! cargo test -p solemart-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `SOLEMART_TEST_BASE_URL` - server under test (default `http://localhost:3000`)
//! - `SOLEMART_DATABASE_URL` - database for tests that talk to `PostgreSQL` directly
//!
//! The session cookie is always `Secure`, so [`TestClient`] carries it by hand
//! instead of relying on a cookie jar (which would drop it over plain HTTP).

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use reqwest::{
    Client, Method, StatusCode,
    header::{COOKIE, SET_COOKIE},
};
use secrecy::SecretString;
use serde_json::{Value, json};
use sqlx::PgPool;
use uuid::Uuid;

use solemart_server::middleware::session::SESSION_COOKIE_NAME;

/// Base URL of the server under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("SOLEMART_TEST_BASE_URL")
        .unwrap_or_else(|_| "http://localhost:3000".to_string())
        .trim_end_matches('/')
        .to_string()
}

/// Pool for tests that exercise repositories directly.
pub async fn test_pool() -> PgPool {
    let url = std::env::var("SOLEMART_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("SOLEMART_DATABASE_URL must be set for database tests");
    solemart_server::db::create_pool(&SecretString::from(url))
        .await
        .expect("Failed to connect to test database")
}

/// An email no other test run will use.
#[must_use]
pub fn unique_email() -> String {
    format!("it-{}@solemart.test", Uuid::new_v4().simple())
}

/// A product name no other test run will use.
#[must_use]
pub fn unique_product_name(prefix: &str) -> String {
    format!("{prefix} {}", Uuid::new_v4().simple())
}

/// A valid full product payload.
#[must_use]
pub fn product_payload(name: &str) -> Value {
    json!({
        "name": name,
        "price": 49.95,
        "category": "Running",
        "description": "Integration test shoe",
        "quantity": 7,
        "seller_id": "seller-it",
        "image_url": "/shoes1.jpg"
    })
}

/// HTTP client that keeps the session cookie between requests.
pub struct TestClient {
    http: Client,
    base_url: String,
    session_cookie: Option<String>,
}

impl Default for TestClient {
    fn default() -> Self {
        Self::new()
    }
}

impl TestClient {
    /// Anonymous client.
    #[must_use]
    pub fn new() -> Self {
        Self {
            http: Client::builder()
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url(),
            session_cookie: None,
        }
    }

    /// Register a fresh user and keep its session. Returns the client and
    /// the `user` object from the response.
    pub async fn signed_in() -> (Self, Value) {
        let mut client = Self::new();
        let email = unique_email();
        let (status, body) = client
            .send(
                Method::POST,
                "/api/auth/register",
                Some(&json!({"email": email, "password": "integration-pass-1"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        (client, body["user"].clone())
    }

    /// Whether a session cookie is currently held.
    #[must_use]
    pub const fn has_session(&self) -> bool {
        self.session_cookie.is_some()
    }

    /// Send a request and return the status and JSON body (`Null` if the
    /// body is not JSON).
    pub async fn send(&mut self, method: Method, path: &str, body: Option<&Value>) -> (StatusCode, Value) {
        let response = self.send_raw(method, path, body).await;
        let status = response.status();
        let text = response.text().await.expect("Failed to read body");
        (status, serde_json::from_str(&text).unwrap_or(Value::Null))
    }

    /// Send a request and return the raw response, updating the session cookie.
    pub async fn send_raw(
        &mut self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> reqwest::Response {
        let mut request = self.http.request(method, format!("{}{path}", self.base_url));
        if let Some(cookie) = &self.session_cookie {
            request = request.header(COOKIE, cookie);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.expect("Request failed");
        self.capture_session_cookie(&response);
        response
    }

    fn capture_session_cookie(&mut self, response: &reqwest::Response) {
        let prefix = format!("{SESSION_COOKIE_NAME}=");
        for header in response.headers().get_all(SET_COOKIE) {
            let Ok(value) = header.to_str() else { continue };
            let Some(pair) = value.split(';').next() else { continue };
            if !pair.starts_with(&prefix) {
                continue;
            }
            // An emptied value (or Max-Age=0) is the server ending the session.
            let cleared = pair.len() == prefix.len() || value.contains("Max-Age=0");
            self.session_cookie = (!cleared).then(|| pair.to_string());
        }
    }

    pub async fn get(&mut self, path: &str) -> (StatusCode, Value) {
        self.send(Method::GET, path, None).await
    }

    pub async fn post(&mut self, path: &str, body: &Value) -> (StatusCode, Value) {
        self.send(Method::POST, path, Some(body)).await
    }

    pub async fn put(&mut self, path: &str, body: &Value) -> (StatusCode, Value) {
        self.send(Method::PUT, path, Some(body)).await
    }

    pub async fn patch(&mut self, path: &str, body: &Value) -> (StatusCode, Value) {
        self.send(Method::PATCH, path, Some(body)).await
    }

    pub async fn delete(&mut self, path: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, path, None).await
    }
}
