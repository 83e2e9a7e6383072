//! OAuth account resolution: user creation, email linking, and profile
//! attachment.
//!
//! Drives `AuthService::sign_in_with_oauth` with hand-built provider profiles,
//! so only the database is required (no provider, no running server).

use uuid::Uuid;

use solemart_integration_tests::{test_pool, unique_email};
use solemart_server::db::UserRepository;
use solemart_server::services::auth::AuthService;
use solemart_server::services::oauth::{OAuthProfile, OAuthProvider};

fn profile(provider: OAuthProvider, email: &str, name: &str) -> OAuthProfile {
    OAuthProfile {
        provider,
        provider_account_id: Uuid::new_v4().simple().to_string(),
        email: email.to_string(),
        name: Some(name.to_string()),
    }
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_first_sign_in_creates_verified_user_with_profile() {
    let pool = test_pool().await;
    let auth = AuthService::new(&pool);
    let google = profile(OAuthProvider::Google, &unique_email(), "Ada  King Lovelace");

    let user = auth.sign_in_with_oauth(&google).await.expect("sign in");
    assert!(user.email_verified_at.is_some());
    assert_eq!(user.name.as_deref(), Some("Ada  King Lovelace"));

    let stored = UserRepository::new(&pool)
        .get_profile(user.id)
        .await
        .expect("profile query")
        .expect("profile created");
    assert_eq!(stored.first_name, "Ada");
    assert_eq!(stored.last_name.as_deref(), Some("King Lovelace"));
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_repeat_sign_in_keeps_user_and_profile() {
    let pool = test_pool().await;
    let auth = AuthService::new(&pool);
    let mut google = profile(OAuthProvider::Google, &unique_email(), "Ada Lovelace");

    let first = auth.sign_in_with_oauth(&google).await.expect("first sign in");

    google.name = Some("Someone Else".to_string());
    let second = auth.sign_in_with_oauth(&google).await.expect("second sign in");
    assert_eq!(second.id, first.id);
    assert_eq!(second.name.as_deref(), Some("Ada Lovelace"));

    let stored = auth.profile(&second).await.expect("profile query").expect("profile");
    assert_eq!(stored.first_name, "Ada");
    assert_eq!(stored.last_name.as_deref(), Some("Lovelace"));
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_new_provider_links_to_credential_account_by_email() {
    let pool = test_pool().await;
    let auth = AuthService::new(&pool);
    let email = unique_email();

    let registered = auth
        .register_with_password(&email, "integration-pass-1", Some("Grace Hopper"))
        .await
        .expect("register");
    assert!(registered.email_verified_at.is_none());

    let github = profile(OAuthProvider::GitHub, &email.to_uppercase(), "Amazing Grace");
    let linked = auth.sign_in_with_oauth(&github).await.expect("sign in");

    assert_eq!(linked.id, registered.id);
    assert_eq!(linked.name.as_deref(), Some("Grace Hopper"));
    assert!(linked.email_verified_at.is_some());

    // No profile existed, so the provider's name parts are attached.
    let stored = auth.profile(&linked).await.expect("profile query").expect("profile");
    assert_eq!(stored.first_name, "Amazing");
    assert_eq!(stored.last_name.as_deref(), Some("Grace"));
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_second_provider_does_not_overwrite_profile() {
    let pool = test_pool().await;
    let auth = AuthService::new(&pool);
    let email = unique_email();

    let google = profile(OAuthProvider::Google, &email, "Ada King Lovelace");
    let user = auth.sign_in_with_oauth(&google).await.expect("google sign in");

    let github = profile(OAuthProvider::GitHub, &email, "Countess Lovelace");
    let linked = auth.sign_in_with_oauth(&github).await.expect("github sign in");
    assert_eq!(linked.id, user.id);

    let stored = auth.profile(&linked).await.expect("profile query").expect("profile");
    assert_eq!(stored.first_name, "Ada");
    assert_eq!(stored.last_name.as_deref(), Some("King Lovelace"));
}
