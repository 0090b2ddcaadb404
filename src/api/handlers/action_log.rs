//! Append-only action log: shared recorder plus the listing endpoint.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use sqlx::{PgPool, Row};
use std::sync::Arc;
use tracing::{error, Instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use super::auth::principal::require_auth;
use crate::auth::AuthState;

/// How many entries the listing endpoint returns.
const LOG_PAGE_SIZE: i64 = 100;

/// Record a user action. Best-effort: the primary mutation has already
/// committed, so a failed log write is logged and swallowed rather than
/// failing the request.
pub(crate) async fn record_action(
    pool: &PgPool,
    user_id: Uuid,
    action: &str,
    metadata: serde_json::Value,
) {
    let payload = match serde_json::to_string(&metadata) {
        Ok(payload) => payload,
        Err(err) => {
            error!("Failed to serialize metadata for action {action}: {err}");
            return;
        }
    };

    let query = r"
        INSERT INTO action_log (user_id, action, metadata)
        VALUES ($1, $2, $3::jsonb)
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    if let Err(err) = sqlx::query(query)
        .bind(user_id)
        .bind(action)
        .bind(payload)
        .execute(pool)
        .instrument(span)
        .await
    {
        error!("Failed to record action {action}: {err}");
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ActionLogEntry {
    pub id: String,
    pub action: String,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<serde_json::Value>,
    pub created_at: String,
}

#[utoipa::path(
    get,
    path = "/v1/action-log",
    responses(
        (status = 200, description = "Latest actions for the authenticated user, newest first.", body = [ActionLogEntry]),
        (status = 401, description = "Missing or invalid session token."),
    ),
    tag = "log"
)]
pub async fn list_action_log(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &auth_state) {
        Ok(principal) => principal,
        Err(status) => return status.into_response(),
    };

    match fetch_log(&pool, principal.user_id).await {
        Ok(entries) => (StatusCode::OK, Json(entries)).into_response(),
        Err(err) => {
            error!("Failed to list action log: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn fetch_log(pool: &PgPool, user_id: Uuid) -> Result<Vec<ActionLogEntry>, sqlx::Error> {
    let query = r#"
        SELECT
            id::text AS id,
            action,
            metadata::text AS metadata,
            to_char(created_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at
        FROM action_log
        WHERE user_id = $1
        ORDER BY created_at DESC
        LIMIT $2
    "#;
    let rows = sqlx::query(query)
        .bind(user_id)
        .bind(LOG_PAGE_SIZE)
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let metadata: Option<String> = row.get("metadata");
            ActionLogEntry {
                id: row.get("id"),
                action: row.get("action"),
                metadata: metadata.and_then(|raw| serde_json::from_str(&raw).ok()),
                created_at: row.get("created_at"),
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_serializes_metadata_inline() -> anyhow::Result<()> {
        let entry = ActionLogEntry {
            id: Uuid::nil().to_string(),
            action: "add_game".to_string(),
            metadata: Some(serde_json::json!({ "title": "Hollow Knight" })),
            created_at: "2026-01-01T00:00:00Z".to_string(),
        };
        let value = serde_json::to_value(&entry)?;
        assert_eq!(
            value
                .get("metadata")
                .and_then(|m| m.get("title"))
                .and_then(|t| t.as_str()),
            Some("Hollow Knight")
        );
        Ok(())
    }

    #[test]
    fn entry_allows_missing_metadata() -> anyhow::Result<()> {
        let entry = ActionLogEntry {
            id: Uuid::nil().to_string(),
            action: "login".to_string(),
            metadata: None,
            created_at: "2026-01-01T00:00:00Z".to_string(),
        };
        let value = serde_json::to_value(&entry)?;
        assert!(value.get("metadata").is_some_and(serde_json::Value::is_null));
        Ok(())
    }
}
