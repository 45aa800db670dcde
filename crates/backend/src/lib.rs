//! Flipgate: login, Google allowlist sign-in and session tokens in front of
//! a single gated flipbook URL.
//!
//! The binary entry point (`main.rs`) is a thin wrapper around [`build_app`].

pub mod auth;
pub mod config;
pub mod error;
pub mod flipbook;
pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::build_app;
pub use state::AppState;
