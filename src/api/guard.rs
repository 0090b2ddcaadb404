//! Route guard: public vs. protected access decided before a handler runs.
//!
//! Two-tier check, on purpose: this middleware only requires the session
//! cookie to be *present*, so anonymous traffic is turned away cheaply at
//! the edge without paying for signature verification. Every protected
//! handler then verifies the token through the codec
//! (`handlers::auth::principal::require_auth`) before touching data. The
//! two checks are not equivalent and must not be merged: a present-but-
//! invalid cookie passes this gate and is rejected by the handler.

use axum::{
    extract::{Extension, Request},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;

use crate::auth::{cookie::extract_session_token, AuthState};

/// Paths served without any cookie inspection. `/login` and `/signup` stay
/// public so the redirect target can never redirect to itself.
const PUBLIC_PATHS: &[&str] = &[
    "/",
    "/health",
    "/login",
    "/signup",
    "/v1/auth/signup",
    "/v1/auth/login",
    // The probe answers "no session" itself (204); redirecting it would
    // hide that answer from the frontend.
    "/v1/auth/session",
];

/// Namespace for unauthenticated endpoints added later.
const PUBLIC_PREFIX: &str = "/v1/public/";

#[must_use]
pub fn is_public(path: &str) -> bool {
    PUBLIC_PATHS.contains(&path) || path.starts_with(PUBLIC_PREFIX)
}

/// Evaluated fresh on every request; holds no per-session state.
pub async fn route_guard(
    Extension(auth_state): Extension<Arc<AuthState>>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path();
    if is_public(path) || path == auth_state.config().login_path() {
        return next.run(request).await;
    }

    if extract_session_token(request.headers()).is_none() {
        return Redirect::temporary(auth_state.config().login_path()).into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_paths_are_allow_listed() {
        assert!(is_public("/"));
        assert!(is_public("/health"));
        assert!(is_public("/login"));
        assert!(is_public("/signup"));
        assert!(is_public("/v1/auth/signup"));
        assert!(is_public("/v1/auth/login"));
    }

    #[test]
    fn public_prefix_matches_namespace_only() {
        assert!(is_public("/v1/public/motd"));
        assert!(!is_public("/v1/publicity"));
    }

    #[test]
    fn session_probe_is_public() {
        assert!(is_public("/v1/auth/session"));
    }

    #[test]
    fn protected_paths_are_not_public() {
        assert!(!is_public("/v1/games"));
        assert!(!is_public("/v1/auth/logout"));
        assert!(!is_public("/v1/action-log"));
        assert!(!is_public("/v1/me"));
    }
}
