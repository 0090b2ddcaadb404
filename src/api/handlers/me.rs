//! Authenticated self-service endpoints (profile settings).
//!
//! Flow Overview:
//! 1) Verify the session token and resolve the principal.
//! 2) Apply the allow-listed update against the user record.
//!
//! Changing the email does not reissue the session token; the `email`
//! claim refreshes at the next login.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use super::auth::{
    principal::require_auth,
    utils::{is_unique_violation, normalize_email, valid_email, valid_password},
};
use crate::auth::{password::hash_password, AuthState};

#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub id: String,
    pub email: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateEmailRequest {
    pub email: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdatePasswordRequest {
    pub password: String,
}

#[utoipa::path(
    get,
    path = "/v1/me",
    responses(
        (status = 200, description = "Return the authenticated user profile.", body = MeResponse),
        (status = 401, description = "Missing or invalid session token."),
    ),
    tag = "me"
)]
pub async fn get_me(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &auth_state) {
        Ok(principal) => principal,
        Err(status) => return status.into_response(),
    };

    match fetch_profile(&pool, principal.user_id).await {
        Ok(Some(profile)) => (StatusCode::OK, Json(profile)).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!("Failed to fetch profile: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[utoipa::path(
    put,
    path = "/v1/me/email",
    request_body = UpdateEmailRequest,
    responses(
        (status = 200, description = "Email updated.", body = MeResponse),
        (status = 400, description = "Invalid email."),
        (status = 401, description = "Missing or invalid session token."),
        (status = 409, description = "Email already in use."),
    ),
    tag = "me"
)]
pub async fn update_email(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<UpdateEmailRequest>>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &auth_state) {
        Ok(principal) => principal,
        Err(status) => return status.into_response(),
    };

    let Some(Json(payload)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let email = normalize_email(&payload.email);
    if !valid_email(&email) {
        return (StatusCode::BAD_REQUEST, "Invalid email".to_string()).into_response();
    }

    match persist_email(&pool, principal.user_id, &email).await {
        Ok(Some(profile)) => (StatusCode::OK, Json(profile)).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) if is_unique_violation(&err) => {
            (StatusCode::CONFLICT, "Email already in use".to_string()).into_response()
        }
        Err(err) => {
            error!("Failed to update email: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[utoipa::path(
    put,
    path = "/v1/me/password",
    request_body = UpdatePasswordRequest,
    responses(
        (status = 204, description = "Password updated."),
        (status = 400, description = "Invalid password."),
        (status = 401, description = "Missing or invalid session token."),
    ),
    tag = "me"
)]
pub async fn update_password(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<UpdatePasswordRequest>>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &auth_state) {
        Ok(principal) => principal,
        Err(status) => return status.into_response(),
    };

    let Some(Json(payload)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    if !valid_password(&payload.password) {
        return (StatusCode::BAD_REQUEST, "Invalid password".to_string()).into_response();
    }

    // Same blocking-thread treatment as signup; the cost factor is the point.
    let password = payload.password;
    let password_hash =
        match tokio::task::spawn_blocking(move || hash_password(&password)).await {
            Ok(Ok(hash)) => hash,
            Ok(Err(err)) => {
                error!("Failed to hash password: {err}");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
            Err(err) => {
                error!("Password hashing task failed: {err}");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        };

    match persist_password(&pool, principal.user_id, &password_hash).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!("Failed to update password: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn fetch_profile(pool: &PgPool, user_id: Uuid) -> Result<Option<MeResponse>, sqlx::Error> {
    let query = r#"
        SELECT
            id::text AS id,
            email,
            to_char(created_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at,
            to_char(updated_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS updated_at
        FROM users
        WHERE id = $1
        LIMIT 1
    "#;
    let row = sqlx::query(query).bind(user_id).fetch_optional(pool).await?;
    Ok(row.map(|row| MeResponse {
        id: row.get("id"),
        email: row.get("email"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }))
}

async fn persist_email(
    pool: &PgPool,
    user_id: Uuid,
    email: &str,
) -> Result<Option<MeResponse>, sqlx::Error> {
    let query = r#"
        UPDATE users
        SET email = $1, updated_at = NOW()
        WHERE id = $2
        RETURNING
            id::text AS id,
            email,
            to_char(created_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at,
            to_char(updated_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS updated_at
    "#;
    let row = sqlx::query(query)
        .bind(email)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|row| MeResponse {
        id: row.get("id"),
        email: row.get("email"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }))
}

async fn persist_password(
    pool: &PgPool,
    user_id: Uuid,
    password_hash: &str,
) -> Result<bool, sqlx::Error> {
    let query = "UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2";
    let result = sqlx::query(query)
        .bind(password_hash)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
