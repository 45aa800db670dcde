//! Authentication for the flipbook gate.
//!
//! This module provides:
//! - Email allowlist with display names
//! - Local email/password accounts
//! - Google ID token verification via tokeninfo
//! - Session token (JWT) creation and validation
//! - `require_auth` middleware for protecting routes

pub mod allowlist;
pub mod clock;
pub mod credentials;
pub mod google;
mod handlers;
pub mod jwt;
mod middleware;
pub mod types;

pub use credentials::hash_password;
pub use handlers::{allowlist_summary, check_email, google_auth, login, verify};
pub use middleware::{extract_auth_user, extract_bearer, require_auth};
