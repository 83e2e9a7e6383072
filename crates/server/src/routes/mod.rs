//! HTTP route handlers for the Solemart API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                      - Liveness
//! GET    /health/ready                - Database readiness
//!
//! # Auth
//! POST   /api/auth/register           - Create credential account
//! POST   /api/auth/login              - Credential sign-in
//! POST   /api/auth/logout             - End session
//! GET    /api/auth/session            - Current user or null
//! GET    /api/auth/providers          - Available sign-in methods
//! GET    /api/auth/signin/{provider}  - Redirect to OAuth provider
//! GET    /api/auth/callback/{provider} - OAuth redirect target
//!
//! # Catalog
//! GET    /api/products                - Normalized catalog listing
//!
//! # Products by name
//! GET    /api/buyer/products          - All products
//! POST   /api/buyer/products          - Create
//! PUT    /api/buyer/products          - Replace (located by name)
//! PATCH  /api/buyer/products          - Merge fields (located by name)
//! GET    /api/buyer/products/{id}     - One product
//!
//! # Products by id
//! GET    /api/seller/products         - All products
//! GET    /api/seller/products/{id}    - One product
//! PUT    /api/seller/products/{id}    - Replace
//! PATCH  /api/seller/products/{id}    - Merge fields
//! DELETE /api/seller/products/{id}    - Delete
//!
//! # Cart (requires auth)
//! GET    /api/cart                    - Cart with product summaries
//! POST   /api/cart                    - Add or merge a line
//! PATCH  /api/cart                    - Set line quantity
//! DELETE /api/cart?itemId=X           - Remove a line
//! DELETE /api/cart/items              - Remove all lines
//! ```

pub mod auth;
pub mod buyer_products;
pub mod cart;
pub mod health;
pub mod products;
pub mod seller_products;

use axum::{
    Router,
    middleware::from_fn,
    routing::{delete, get, post},
};

use crate::middleware::rate_limit::ClientIpKeyExtractor;
use crate::middleware::{api_rate_limiter, auth_rate_limiter, json_rate_limit_middleware};
use crate::state::AppState;

/// Create the health check router.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/session", get(auth::session_info))
        .route("/providers", get(auth::providers))
        .route("/signin/{provider}", get(auth::oauth_signin))
        .route("/callback/{provider}", get(auth::oauth_callback))
}

/// Create the name-addressed product routes router.
pub fn buyer_product_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(buyer_products::index)
                .post(buyer_products::create)
                .put(buyer_products::replace)
                .patch(buyer_products::patch),
        )
        .route("/{id}", get(buyer_products::show))
}

/// Create the id-addressed product routes router.
pub fn seller_product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(seller_products::index))
        .route(
            "/{id}",
            get(seller_products::show)
                .put(seller_products::replace)
                .patch(seller_products::patch)
                .delete(seller_products::delete),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(cart::show)
                .post(cart::add)
                .patch(cart::update)
                .delete(cart::remove),
        )
        .route("/items", delete(cart::clear))
}

/// Catalog, product management, and cart routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(products::index))
        .nest("/api/buyer/products", buyer_product_routes())
        .nest("/api/seller/products", seller_product_routes())
        .nest("/api/cart", cart_routes())
}

/// Create all routes, without rate limiting.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health_routes())
        .nest("/api/auth", auth_routes())
        .merge(api_routes())
}

/// Create all routes with per-IP rate limits on the auth and API groups.
///
/// Requires the server to be started with `ConnectInfo<SocketAddr>`. Client
/// IP headers are honored only when `trust_proxy_headers` is set.
pub fn rate_limited_routes(trust_proxy_headers: bool) -> Router<AppState> {
    let key_extractor = ClientIpKeyExtractor::new(trust_proxy_headers);

    Router::new()
        .merge(health_routes())
        .nest("/api/auth", auth_routes().layer(auth_rate_limiter(key_extractor)))
        .merge(api_routes().layer(api_rate_limiter(key_extractor)))
        .layer(from_fn(json_rate_limit_middleware))
}
