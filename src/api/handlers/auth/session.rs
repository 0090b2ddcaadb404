//! Session probe: report the caller's identity if the token verifies.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use super::types::SessionResponse;
use crate::auth::{cookie::extract_session_token, AuthState};

#[utoipa::path(
    get,
    path = "/v1/auth/session",
    responses(
        (status = 200, description = "Session is active", body = SessionResponse),
        (status = 204, description = "No active session")
    ),
    tag = "auth"
)]
pub async fn session(headers: HeaderMap, auth_state: Extension<Arc<AuthState>>) -> impl IntoResponse {
    // Missing or invalid tokens are both "no session" to avoid leaking
    // auth state details.
    let Some(token) = extract_session_token(&headers) else {
        return StatusCode::NO_CONTENT.into_response();
    };

    match auth_state.codec().verify(&token) {
        Some(claims) => {
            let response = SessionResponse {
                user_id: claims.user_id,
                email: claims.email,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        None => StatusCode::NO_CONTENT.into_response(),
    }
}
