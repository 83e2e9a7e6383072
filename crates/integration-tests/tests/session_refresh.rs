//! Role changes reach session tokens on refresh.
//!
//! Talks to `PostgreSQL` directly through the server's repositories, so only
//! the database is required (not a running server).

use chrono::{Duration, Utc};

use solemart_core::{Email, UserRole};
use solemart_integration_tests::{test_pool, unique_email};
use solemart_server::db::UserRepository;
use solemart_server::models::SessionUser;
use solemart_server::models::session::SESSION_TOKEN_REFRESH_SECS;
use solemart_server::services::auth::AuthService;

#[tokio::test]
#[ignore = "Requires database"]
async fn test_refresh_picks_up_new_role() {
    let pool = test_pool().await;
    let auth = AuthService::new(&pool);

    let email = unique_email();
    let user = auth
        .register_with_password(&email, "integration-pass-1", None)
        .await
        .expect("register");
    let issued_at = Utc::now() - Duration::seconds(SESSION_TOKEN_REFRESH_SECS + 1);
    let token = SessionUser::issue(&user, issued_at);
    assert_eq!(token.role, UserRole::User);
    assert!(token.needs_refresh(Utc::now()));

    UserRepository::new(&pool)
        .set_role(&Email::parse(&email).expect("email"), UserRole::Seller)
        .await
        .expect("set role");

    let refreshed = auth
        .refresh_session(&token, Utc::now())
        .await
        .expect("refresh")
        .expect("user still exists");
    assert_eq!(refreshed.role, UserRole::Seller);
    assert!(!refreshed.needs_refresh(Utc::now()));
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_login_after_register_returns_same_user() {
    let pool = test_pool().await;
    let auth = AuthService::new(&pool);
    let email = unique_email();

    let created = auth
        .register_with_password(&email, "integration-pass-1", Some("  Grace Hopper "))
        .await
        .expect("register");
    assert_eq!(created.name.as_deref(), Some("Grace Hopper"));

    let logged_in = auth
        .login_with_password(&email.to_uppercase(), "integration-pass-1")
        .await
        .expect("login");
    assert_eq!(logged_in.id, created.id);
}
