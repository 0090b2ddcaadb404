//! Game endpoints: list with nested achievements, create, delete.
//!
//! Games belong to the authenticated user; requests for another user's
//! game return `404 Not Found` so ids cannot be probed.

use axum::{
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, Instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{
    action_log::record_action,
    auth::{principal::require_auth, utils::is_unique_violation},
};
use crate::auth::AuthState;

#[derive(Debug, Serialize, ToSchema)]
pub struct AchievementResponse {
    pub id: String,
    pub title: String,
    pub completed: bool,
    pub created_at: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GameResponse {
    pub id: String,
    pub title: String,
    pub created_at: String,
    pub achievements: Vec<AchievementResponse>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateGameRequest {
    pub title: String,
}

#[utoipa::path(
    get,
    path = "/v1/games",
    responses(
        (status = 200, description = "The user's games, newest first, achievements nested oldest first.", body = [GameResponse]),
        (status = 401, description = "Missing or invalid session token."),
    ),
    tag = "games"
)]
pub async fn list_games(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &auth_state) {
        Ok(principal) => principal,
        Err(status) => return status.into_response(),
    };

    match fetch_games(&pool, principal.user_id).await {
        Ok(games) => (StatusCode::OK, Json(games)).into_response(),
        Err(err) => {
            error!("Failed to list games: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/v1/games",
    request_body = CreateGameRequest,
    responses(
        (status = 201, description = "Game created.", body = GameResponse),
        (status = 400, description = "Missing or empty title."),
        (status = 401, description = "Missing or invalid session token."),
        (status = 409, description = "The user already has a game with this title."),
    ),
    tag = "games"
)]
pub async fn create_game(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<CreateGameRequest>>,
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

    let game = match insert_game(&pool, principal.user_id, &title).await {
        Ok(Some(game)) => game,
        Ok(None) => {
            return (StatusCode::CONFLICT, "Duplicate game".to_string()).into_response();
        }
        Err(err) => {
            error!("Failed to create game: {err}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    record_action(
        &pool,
        principal.user_id,
        "add_game",
        json!({ "gameId": game.id, "title": title }),
    )
    .await;

    (StatusCode::CREATED, Json(game)).into_response()
}

#[utoipa::path(
    delete,
    path = "/v1/games/{id}",
    params(("id" = String, Path, description = "Game id")),
    responses(
        (status = 204, description = "Game and its achievements deleted."),
        (status = 401, description = "Missing or invalid session token."),
        (status = 404, description = "No such game for this user."),
    ),
    tag = "games"
)]
pub async fn delete_game(
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &auth_state) {
        Ok(principal) => principal,
        Err(status) => return status.into_response(),
    };

    match delete_game_owned(&pool, principal.user_id, id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!("Failed to delete game: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn fetch_games(pool: &PgPool, user_id: Uuid) -> Result<Vec<GameResponse>, sqlx::Error> {
    let query = r#"
        SELECT
            id,
            id::text AS id_text,
            title,
            to_char(created_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at
        FROM games
        WHERE user_id = $1
        ORDER BY created_at DESC
    "#;
    let rows = sqlx::query(query).bind(user_id).fetch_all(pool).await?;

    let mut index_by_game: HashMap<Uuid, usize> = HashMap::new();
    let mut games: Vec<GameResponse> = Vec::with_capacity(rows.len());
    for row in rows {
        let game_id: Uuid = row.get("id");
        index_by_game.insert(game_id, games.len());
        games.push(GameResponse {
            id: row.get("id_text"),
            title: row.get("title"),
            created_at: row.get("created_at"),
            achievements: Vec::new(),
        });
    }

    let query = r#"
        SELECT
            achievements.game_id,
            achievements.id::text AS id,
            achievements.title,
            achievements.completed,
            to_char(achievements.created_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at
        FROM achievements
        JOIN games ON games.id = achievements.game_id
        WHERE games.user_id = $1
        ORDER BY achievements.created_at ASC
    "#;
    let rows = sqlx::query(query).bind(user_id).fetch_all(pool).await?;

    for row in rows {
        let game_id: Uuid = row.get("game_id");
        if let Some(&index) = index_by_game.get(&game_id) {
            games[index].achievements.push(AchievementResponse {
                id: row.get("id"),
                title: row.get("title"),
                completed: row.get("completed"),
                created_at: row.get("created_at"),
            });
        }
    }

    Ok(games)
}

/// Insert a game; `None` means the per-user title uniqueness was violated.
async fn insert_game(
    pool: &PgPool,
    user_id: Uuid,
    title: &str,
) -> Result<Option<GameResponse>, sqlx::Error> {
    let query = r#"
        INSERT INTO games (user_id, title)
        VALUES ($1, $2)
        RETURNING
            id::text AS id,
            title,
            to_char(created_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at
    "#;
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(user_id)
        .bind(title)
        .fetch_one(pool)
        .instrument(span)
        .await;

    match row {
        Ok(row) => Ok(Some(GameResponse {
            id: row.get("id"),
            title: row.get("title"),
            created_at: row.get("created_at"),
            achievements: Vec::new(),
        })),
        Err(err) if is_unique_violation(&err) => Ok(None),
        Err(err) => Err(err),
    }
}

/// Delete a game owned by the user, its achievements, and write the log
/// entry in the same transaction. `false` means not found (or not owned).
async fn delete_game_owned(pool: &PgPool, user_id: Uuid, game_id: Uuid) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let owned = sqlx::query("SELECT 1 FROM games WHERE id = $1 AND user_id = $2")
        .bind(game_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;
    if owned.is_none() {
        tx.rollback().await?;
        return Ok(false);
    }

    sqlx::query("DELETE FROM achievements WHERE game_id = $1")
        .bind(game_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM games WHERE id = $1")
        .bind(game_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO action_log (user_id, action, metadata)
        VALUES ($1, 'delete_game', $2::jsonb)
        "#,
    )
    .bind(user_id)
    .bind(json!({ "gameId": game_id.to_string() }).to_string())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(true)
}
