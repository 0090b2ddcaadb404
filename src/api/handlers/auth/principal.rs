//! Authenticated principal extraction.
//!
//! This is the strict tier of the two-tier check: the route guard only
//! gated on cookie presence, so every protected handler resolves the caller
//! here — token extracted, signature and expiry verified through the codec
//! — before any data access.

use axum::http::{HeaderMap, StatusCode};
use uuid::Uuid;

use crate::auth::{cookie::extract_session_token, AuthState};

/// Authenticated user context derived from the session token claims.
#[derive(Clone, Debug)]
pub struct Principal {
    pub user_id: Uuid,
    pub email: String,
}

/// Resolve the session token into a principal, or return 401.
///
/// Any failure — missing cookie, bad signature, expired token, malformed
/// user id — collapses into the same 401 so no detail leaks to the client.
pub fn require_auth(headers: &HeaderMap, auth_state: &AuthState) -> Result<Principal, StatusCode> {
    let token = extract_session_token(headers).ok_or(StatusCode::UNAUTHORIZED)?;
    let claims = auth_state
        .codec()
        .verify(&token)
        .ok_or(StatusCode::UNAUTHORIZED)?;
    let user_id = Uuid::parse_str(&claims.user_id).map_err(|_| StatusCode::UNAUTHORIZED)?;

    Ok(Principal {
        user_id,
        email: claims.email,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthConfig, AuthState};
    use axum::http::{header::COOKIE, HeaderValue};
    use secrecy::SecretString;

    fn test_state() -> AuthState {
        AuthState::new(
            AuthConfig::new("http://localhost:3000".to_string()),
            &SecretString::from("test-secret".to_string()),
        )
    }

    fn cookie_headers(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let value = format!("session_token={token}");
        headers.insert(COOKIE, HeaderValue::from_str(&value).expect("ascii"));
        headers
    }

    #[test]
    fn valid_token_yields_principal() -> anyhow::Result<()> {
        let state = test_state();
        let user_id = Uuid::new_v4();
        let token = state.codec().issue(user_id, "alice@example.com")?;

        let principal =
            require_auth(&cookie_headers(&token), &state).expect("principal expected");
        assert_eq!(principal.user_id, user_id);
        assert_eq!(principal.email, "alice@example.com");
        Ok(())
    }

    #[test]
    fn missing_cookie_is_unauthorized() {
        let state = test_state();
        let result = require_auth(&HeaderMap::new(), &state);
        assert_eq!(result.map(|p| p.user_id), Err(StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn garbage_token_is_unauthorized() {
        let state = test_state();
        let result = require_auth(&cookie_headers("not-a-token"), &state);
        assert_eq!(result.map(|p| p.user_id), Err(StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn token_from_other_secret_is_unauthorized() -> anyhow::Result<()> {
        let state = test_state();
        let other = AuthState::new(
            AuthConfig::new("http://localhost:3000".to_string()),
            &SecretString::from("other-secret".to_string()),
        );
        let token = other.codec().issue(Uuid::new_v4(), "alice@example.com")?;

        let result = require_auth(&cookie_headers(&token), &state);
        assert_eq!(result.map(|p| p.user_id), Err(StatusCode::UNAUTHORIZED));
        Ok(())
    }
}
