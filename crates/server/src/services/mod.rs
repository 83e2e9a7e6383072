//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Credential and OAuth sign-in, session token refresh
//! - `oauth` - HTTP client for the Google and GitHub OAuth endpoints

pub mod auth;
pub mod oauth;
