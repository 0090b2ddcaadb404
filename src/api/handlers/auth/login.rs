//! Login endpoint: verify credentials and establish a session.

use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, error, instrument};

use super::{
    storage::lookup_user_by_email,
    types::{LoginRequest, UserResponse},
    utils::{normalize_email, valid_email, valid_password},
};
use crate::{
    api::handlers::action_log::record_action,
    auth::{cookie::session_cookie, password::verify_password, AuthState},
};

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful, session established", body = UserResponse),
        (status = 400, description = "Invalid email or password format"),
        (status = 401, description = "Invalid credentials"),
    ),
    tag = "auth"
)]
// Payload is skipped from the span: it carries the plaintext password.
#[instrument(skip_all)]
pub async fn login(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let Some(Json(payload)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let email = normalize_email(&payload.email);
    if !valid_email(&email) {
        return (StatusCode::BAD_REQUEST, "Invalid email".to_string()).into_response();
    }

    if !valid_password(&payload.password) {
        return (StatusCode::BAD_REQUEST, "Invalid password".to_string()).into_response();
    }

    // Unknown email and wrong password produce the same response so the
    // endpoint cannot be used to enumerate accounts.
    let user = match lookup_user_by_email(&pool, &email).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            debug!("Unknown email");
            return (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string()).into_response();
        }
        Err(err) => {
            error!("Failed to lookup user: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error logging in".to_string(),
            )
                .into_response();
        }
    };

    let password = payload.password;
    let password_hash = user.password_hash.clone();
    let verified =
        match tokio::task::spawn_blocking(move || verify_password(&password, &password_hash)).await
        {
            Ok(verified) => verified,
            Err(err) => {
                error!("Password verification task failed: {err}");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error logging in".to_string(),
                )
                    .into_response();
            }
        };

    if !verified {
        debug!("Password mismatch");
        return (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string()).into_response();
    }

    record_action(&pool, user.id, "login", json!({ "email": user.email })).await;

    let token = match auth_state.codec().issue(user.id, &user.email) {
        Ok(token) => token,
        Err(err) => {
            error!("Failed to issue session token: {err}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let mut headers = HeaderMap::new();
    match session_cookie(auth_state.config(), &token) {
        Ok(cookie) => {
            headers.insert(SET_COOKIE, cookie);
        }
        Err(err) => {
            error!("Failed to build session cookie: {err}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }

    let response = UserResponse {
        id: user.id.to_string(),
        email: user.email,
    };
    (StatusCode::OK, headers, Json(response)).into_response()
}
