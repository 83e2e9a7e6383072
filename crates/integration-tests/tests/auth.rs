//! End-to-end tests for credential auth and sessions.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`solemart-cli migrate`)
//! - The server running (`cargo run -p solemart-server`)

use reqwest::StatusCode;
use serde_json::json;

use solemart_integration_tests::{TestClient, unique_email};

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_register_signs_in() {
    let (mut client, user) = TestClient::signed_in().await;
    assert_eq!(user["role"], "USER");
    assert!(client.has_session());

    let (status, body) = client.get("/api/auth/session").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], user["id"]);
    assert_eq!(body["user"]["email"], user["email"]);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_register_duplicate_email_conflicts() {
    let email = unique_email();
    let payload = json!({"email": email, "password": "integration-pass-1"});

    let (status, _) = TestClient::new().post("/api/auth/register", &payload).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = TestClient::new().post("/api/auth/register", &payload).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_login_logout_round() {
    let email = unique_email();
    let password = "integration-pass-1";
    TestClient::new()
        .post(
            "/api/auth/register",
            &json!({"email": email, "password": password, "name": "Ada Lovelace"}),
        )
        .await;

    let mut client = TestClient::new();
    let (status, body) = client
        .post("/api/auth/login", &json!({"email": email, "password": password}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["name"], "Ada Lovelace");

    let (status, body) = client.post("/api/auth/logout", &json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true}));

    let (_, body) = client.get("/api/auth/session").await;
    assert_eq!(body, json!({"user": null}));
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_login_failures_are_indistinguishable() {
    let email = unique_email();
    TestClient::new()
        .post(
            "/api/auth/register",
            &json!({"email": email, "password": "integration-pass-1"}),
        )
        .await;

    let wrong_password = TestClient::new()
        .post("/api/auth/login", &json!({"email": email, "password": "nope-nope-nope"}))
        .await;
    let unknown_user = TestClient::new()
        .post(
            "/api/auth/login",
            &json!({"email": unique_email(), "password": "integration-pass-1"}),
        )
        .await;

    assert_eq!(wrong_password.0, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password, unknown_user);
    assert_eq!(wrong_password.1["error"], "Invalid credentials");
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_providers_always_include_credentials() {
    let (status, body) = TestClient::new().get("/api/auth/providers").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["id"], "credentials");
}
