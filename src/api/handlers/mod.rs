//! API handlers for Questlog.
//!
//! Each module owns its route handlers plus the sqlx helpers they need.
//! Protected handlers resolve the caller through
//! [`auth::principal::require_auth`] before touching data.

pub mod achievements;
pub mod action_log;
pub mod auth;
pub mod games;
pub mod health;
pub mod me;
pub mod root;
