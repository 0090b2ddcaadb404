//! # Questlog
//!
//! `questlog` is a small JSON API for tracking video games and their
//! achievements per user. It handles cookie-based session authentication,
//! per-user game/achievement CRUD, an append-only action log, and profile
//! settings.
//!
//! ## Authentication
//!
//! Passwords are hashed with bcrypt before storage; sessions are signed,
//! self-contained tokens carried in an `HttpOnly` cookie. There is no
//! server-side session table: expiry and logout (cookie clearing) are the
//! only termination mechanisms.
//!
//! The request path uses a two-tier check: the route guard only requires
//! the session cookie to be *present*, while every protected handler
//! verifies the token signature and expiry before touching data. See
//! [`api::guard`] for the rationale.
//!
//! ## Ownership
//!
//! Games and achievements are scoped to their owning user. Requests for
//! resources the caller does not own return `404 Not Found` rather than
//! `403 Forbidden` to prevent resource enumeration.

pub mod api;
pub mod auth;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
