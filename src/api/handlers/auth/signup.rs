//! Signup endpoint: create an account and establish a session.

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
    storage::{insert_user, SignupOutcome},
    types::{SignupRequest, UserResponse},
    utils::{normalize_email, valid_email, valid_password},
};
use crate::{
    api::handlers::action_log::record_action,
    auth::{cookie::session_cookie, password::hash_password, AuthState},
};

#[utoipa::path(
    post,
    path = "/v1/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created and session established", body = UserResponse),
        (status = 400, description = "Invalid email or password"),
        (status = 409, description = "Email already in use"),
    ),
    tag = "auth"
)]
// Payload is skipped from the span: it carries the plaintext password.
#[instrument(skip_all)]
pub async fn signup(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<SignupRequest>>,
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

    // bcrypt blocks for tens of milliseconds; keep it off the async workers.
    let password = payload.password;
    let password_hash =
        match tokio::task::spawn_blocking(move || hash_password(&password)).await {
            Ok(Ok(hash)) => hash,
            Ok(Err(err)) => {
                error!("Failed to hash password: {err}");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error creating user".to_string(),
                )
                    .into_response();
            }
            Err(err) => {
                error!("Password hashing task failed: {err}");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error creating user".to_string(),
                )
                    .into_response();
            }
        };

    let user = match insert_user(&pool, &email, &password_hash).await {
        Ok(SignupOutcome::Created(user)) => user,
        Ok(SignupOutcome::Conflict) => {
            debug!("Email already registered");
            return (StatusCode::CONFLICT, "Email already in use".to_string()).into_response();
        }
        Err(err) => {
            error!("Failed to create user: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error creating user".to_string(),
            )
                .into_response();
        }
    };

    record_action(&pool, user.id, "signup", json!({ "email": user.email })).await;

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
    (StatusCode::CREATED, headers, Json(response)).into_response()
}
