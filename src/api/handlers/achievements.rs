//! Achievement endpoints: create, toggle completion, delete.
//!
//! Ownership is always checked through the parent game; a miss returns
//! `404 Not Found`, never `403`.

use axum::{
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use sqlx::{PgPool, Row};
use std::sync::Arc;
use tracing::{error, Instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{
    action_log::record_action, auth::principal::require_auth, games::AchievementResponse,
};
use crate::auth::AuthState;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateAchievementRequest {
    pub title: String,
}

#[utoipa::path(
    post,
    path = "/v1/games/{id}/achievements",
    params(("id" = String, Path, description = "Game id")),
    request_body = CreateAchievementRequest,
    responses(
        (status = 201, description = "Achievement created.", body = AchievementResponse),
        (status = 400, description = "Missing or empty title."),
        (status = 401, description = "Missing or invalid session token."),
        (status = 404, description = "No such game for this user."),
    ),
    tag = "games"
)]
pub async fn create_achievement(
    Path(game_id): Path<Uuid>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<CreateAchievementRequest>>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &auth_state) {
        Ok(principal) => principal,
        Err(status) => return status.into_response(),
    };

    let Some(Json(payload)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let title = payload.title.trim().to_string();
    if title.is_empty() {
        return (StatusCode::BAD_REQUEST, "Invalid title".to_string()).into_response();
    }

    match owns_game(&pool, principal.user_id, game_id).await {
        Ok(true) => {}
        Ok(false) => return StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!("Failed to check game ownership: {err}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }

    let achievement = match insert_achievement(&pool, game_id, &title).await {
        Ok(achievement) => achievement,
        Err(err) => {
            error!("Failed to create achievement: {err}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    record_action(
        &pool,
        principal.user_id,
        "add_achievement",
        json!({ "achievementId": achievement.id, "gameId": game_id.to_string(), "title": title }),
    )
    .await;

    (StatusCode::CREATED, Json(achievement)).into_response()
}

#[utoipa::path(
    post,
    path = "/v1/achievements/{id}/toggle",
    params(("id" = String, Path, description = "Achievement id")),
    responses(
        (status = 200, description = "Completion flag flipped.", body = AchievementResponse),
        (status = 401, description = "Missing or invalid session token."),
        (status = 404, description = "No such achievement for this user."),
    ),
    tag = "games"
)]
pub async fn toggle_achievement(
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &auth_state) {
        Ok(principal) => principal,
        Err(status) => return status.into_response(),
    };

    let owned = match lookup_owned_achievement(&pool, principal.user_id, id).await {
        Ok(Some(owned)) => owned,
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!("Failed to lookup achievement: {err}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let updated = match flip_completed(&pool, id).await {
        Ok(updated) => updated,
        Err(err) => {
            error!("Failed to toggle achievement: {err}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let action = if updated.completed {
        "mark_completed"
    } else {
        "mark_incomplete"
    };
    record_action(
        &pool,
        principal.user_id,
        action,
        json!({ "achievementId": id.to_string(), "gameId": owned.game_id.to_string() }),
    )
    .await;

    (StatusCode::OK, Json(updated)).into_response()
}

#[utoipa::path(
    delete,
    path = "/v1/achievements/{id}",
    params(("id" = String, Path, description = "Achievement id")),
    responses(
        (status = 204, description = "Achievement deleted."),
        (status = 401, description = "Missing or invalid session token."),
        (status = 404, description = "No such achievement for this user."),
    ),
    tag = "games"
)]
pub async fn delete_achievement(
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &auth_state) {
        Ok(principal) => principal,
        Err(status) => return status.into_response(),
    };

    let owned = match lookup_owned_achievement(&pool, principal.user_id, id).await {
        Ok(Some(owned)) => owned,
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!("Failed to lookup achievement: {err}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    if let Err(err) = sqlx::query("DELETE FROM achievements WHERE id = $1")
        .bind(id)
        .execute(&pool.0)
        .await
    {
        error!("Failed to delete achievement: {err}");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    record_action(
        &pool,
        principal.user_id,
        "delete_achievement",
        json!({ "achievementId": id.to_string(), "gameId": owned.game_id.to_string() }),
    )
    .await;

    StatusCode::NO_CONTENT.into_response()
}

struct OwnedAchievement {
    game_id: Uuid,
}

async fn owns_game(pool: &PgPool, user_id: Uuid, game_id: Uuid) -> Result<bool, sqlx::Error> {
    let row = sqlx::query("SELECT 1 FROM games WHERE id = $1 AND user_id = $2")
        .bind(game_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.is_some())
}

async fn lookup_owned_achievement(
    pool: &PgPool,
    user_id: Uuid,
    achievement_id: Uuid,
) -> Result<Option<OwnedAchievement>, sqlx::Error> {
    let query = r"
        SELECT achievements.game_id
        FROM achievements
        JOIN games ON games.id = achievements.game_id
        WHERE achievements.id = $1 AND games.user_id = $2
        LIMIT 1
    ";
    let row = sqlx::query(query)
        .bind(achievement_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|row| OwnedAchievement {
        game_id: row.get("game_id"),
    }))
}

async fn insert_achievement(
    pool: &PgPool,
    game_id: Uuid,
    title: &str,
) -> Result<AchievementResponse, sqlx::Error> {
    let query = r#"
        INSERT INTO achievements (game_id, title)
        VALUES ($1, $2)
        RETURNING
            id::text AS id,
            title,
            completed,
            to_char(created_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at
    "#;
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(game_id)
        .bind(title)
        .fetch_one(pool)
        .instrument(span)
        .await?;

    Ok(AchievementResponse {
        id: row.get("id"),
        title: row.get("title"),
        completed: row.get("completed"),
        created_at: row.get("created_at"),
    })
}

async fn flip_completed(pool: &PgPool, id: Uuid) -> Result<AchievementResponse, sqlx::Error> {
    let query = r#"
        UPDATE achievements
        SET completed = NOT completed
        WHERE id = $1
        RETURNING
            id::text AS id,
            title,
            completed,
            to_char(created_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at
    "#;
    let row = sqlx::query(query).bind(id).fetch_one(pool).await?;

    Ok(AchievementResponse {
        id: row.get("id"),
        title: row.get("title"),
        completed: row.get("completed"),
        created_at: row.get("created_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_achievement_request_rejects_unknown_fields() {
        let result: Result<CreateAchievementRequest, _> =
            serde_json::from_value(json!({ "title": "Speedrun", "completed": true }));
        assert!(result.is_err());
    }
}
