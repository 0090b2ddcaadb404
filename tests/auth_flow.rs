//! End-to-end signup/login/CRUD flow against a real Postgres database.
//!
//! These tests need provisioned infrastructure: set `QUESTLOG_TEST_DSN` to
//! a database the suite may write to and the schema from `db/sql` is
//! applied idempotently at startup. Without the variable every test is a
//! no-op skip, so the suite stays green in environments without Postgres.

use axum::{
    body::{to_bytes, Body},
    http::{
        header::{CONTENT_TYPE, COOKIE, SET_COOKIE},
        Request, StatusCode,
    },
    middleware, Extension, Router,
};
use questlog::{
    api,
    api::guard::route_guard,
    auth::{AuthConfig, AuthState},
};
use secrecy::SecretString;
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower::util::ServiceExt;
use uuid::Uuid;

const SCHEMA_SQL: &str = include_str!("../db/sql/01_questlog.sql");

async fn test_app() -> Option<Router> {
    let Ok(dsn) = std::env::var("QUESTLOG_TEST_DSN") else {
        eprintln!("QUESTLOG_TEST_DSN not set; skipping");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&dsn)
        .await
        .expect("connect to test database");

    sqlx::raw_sql(SCHEMA_SQL)
        .execute(&pool)
        .await
        .expect("apply schema");

    let auth_state = Arc::new(AuthState::new(
        AuthConfig::new("http://localhost:3000".to_string()),
        &SecretString::from("test-secret".to_string()),
    ));

    let (router, _spec) = api::router().split_for_parts();
    Some(
        router
            .layer(middleware::from_fn(route_guard))
            .layer(Extension(auth_state))
            .layer(Extension(pool)),
    )
}

fn json_request(method: &str, uri: &str, body: &Value, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn bare_request(method: &str, uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder.body(Body::empty()).expect("request")
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

/// Extract the `name=value` pair from a `Set-Cookie` header.
fn cookie_pair(response: &axum::response::Response) -> Option<String> {
    response
        .headers()
        .get(SET_COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .next()
        .map(str::to_string)
}

#[tokio::test]
async fn signup_duplicate_login_and_crud_round_trip() {
    let Some(app) = test_app().await else {
        return;
    };

    let email = format!("{}@example.com", Uuid::new_v4());
    let signup_body = json!({ "email": email, "password": "password123" });

    // Signup establishes a session.
    let response = app
        .clone()
        .oneshot(json_request("POST", "/v1/auth/signup", &signup_body, None))
        .await
        .expect("signup response");
    assert_eq!(response.status(), StatusCode::CREATED);
    let session = cookie_pair(&response).expect("session cookie set");
    assert!(session.starts_with("session_token="));

    // Second signup with the same email: conflict, no session established.
    let response = app
        .clone()
        .oneshot(json_request("POST", "/v1/auth/signup", &signup_body, None))
        .await
        .expect("duplicate signup response");
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert!(response.headers().get(SET_COOKIE).is_none());

    // Wrong password and unknown email produce the same generic rejection.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/auth/login",
            &json!({ "email": email, "password": "wrong-password" }),
            None,
        ))
        .await
        .expect("bad login response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/auth/login",
            &json!({ "email": format!("{}@example.com", Uuid::new_v4()), "password": "password123" }),
            None,
        ))
        .await
        .expect("unknown email response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Valid login refreshes the session.
    let response = app
        .clone()
        .oneshot(json_request("POST", "/v1/auth/login", &signup_body, None))
        .await
        .expect("login response");
    assert_eq!(response.status(), StatusCode::OK);
    let session = cookie_pair(&response).expect("session cookie set");

    // Create a game.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/games",
            &json!({ "title": "Hollow Knight" }),
            Some(&session),
        ))
        .await
        .expect("create game response");
    assert_eq!(response.status(), StatusCode::CREATED);
    let game = body_json(response).await;
    let game_id = game
        .get("id")
        .and_then(Value::as_str)
        .expect("game id")
        .to_string();

    // Same title again for the same user: duplicate.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/games",
            &json!({ "title": "Hollow Knight" }),
            Some(&session),
        ))
        .await
        .expect("duplicate game response");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Nest an achievement and toggle it.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/v1/games/{game_id}/achievements"),
            &json!({ "title": "Defeat the Radiance" }),
            Some(&session),
        ))
        .await
        .expect("create achievement response");
    assert_eq!(response.status(), StatusCode::CREATED);
    let achievement = body_json(response).await;
    let achievement_id = achievement
        .get("id")
        .and_then(Value::as_str)
        .expect("achievement id")
        .to_string();
    assert_eq!(achievement.get("completed"), Some(&Value::Bool(false)));

    let response = app
        .clone()
        .oneshot(bare_request(
            "POST",
            &format!("/v1/achievements/{achievement_id}/toggle"),
            Some(&session),
        ))
        .await
        .expect("toggle response");
    assert_eq!(response.status(), StatusCode::OK);
    let toggled = body_json(response).await;
    assert_eq!(toggled.get("completed"), Some(&Value::Bool(true)));

    // The dashboard listing nests the achievement under the game.
    let response = app
        .clone()
        .oneshot(bare_request("GET", "/v1/games", Some(&session)))
        .await
        .expect("list games response");
    assert_eq!(response.status(), StatusCode::OK);
    let games = body_json(response).await;
    let listed = games
        .as_array()
        .and_then(|games| {
            games
                .iter()
                .find(|game| game.get("id").and_then(Value::as_str) == Some(&game_id))
        })
        .expect("created game listed");
    assert_eq!(
        listed
            .get("achievements")
            .and_then(Value::as_array)
            .map(Vec::len),
        Some(1)
    );

    // The action log recorded the whole story.
    let response = app
        .clone()
        .oneshot(bare_request("GET", "/v1/action-log", Some(&session)))
        .await
        .expect("action log response");
    assert_eq!(response.status(), StatusCode::OK);
    let log = body_json(response).await;
    let actions: Vec<&str> = log
        .as_array()
        .expect("log array")
        .iter()
        .filter_map(|entry| entry.get("action").and_then(Value::as_str))
        .collect();
    for expected in ["signup", "login", "add_game", "add_achievement", "mark_completed"] {
        assert!(actions.contains(&expected), "missing action {expected}");
    }

    // Logout clears the cookie.
    let response = app
        .clone()
        .oneshot(bare_request("POST", "/v1/auth/logout", Some(&session)))
        .await
        .expect("logout response");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let cleared = response
        .headers()
        .get(SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .expect("clear cookie");
    assert!(cleared.contains("Max-Age=0"));
}

#[tokio::test]
async fn settings_update_email_and_password() {
    let Some(app) = test_app().await else {
        return;
    };

    let email = format!("{}@example.com", Uuid::new_v4());
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/auth/signup",
            &json!({ "email": email, "password": "password123" }),
            None,
        ))
        .await
        .expect("signup response");
    assert_eq!(response.status(), StatusCode::CREATED);
    let session = cookie_pair(&response).expect("session cookie set");

    // Update the email.
    let new_email = format!("{}@example.com", Uuid::new_v4());
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/v1/me/email",
            &json!({ "email": new_email }),
            Some(&session),
        ))
        .await
        .expect("update email response");
    assert_eq!(response.status(), StatusCode::OK);
    let profile = body_json(response).await;
    assert_eq!(
        profile.get("email").and_then(Value::as_str),
        Some(new_email.as_str())
    );

    // Update the password, then log in with the new pair.
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/v1/me/password",
            &json!({ "password": "correct-horse-battery" }),
            Some(&session),
        ))
        .await
        .expect("update password response");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/auth/login",
            &json!({ "email": new_email, "password": "correct-horse-battery" }),
            None,
        ))
        .await
        .expect("login response");
    assert_eq!(response.status(), StatusCode::OK);

    // The old password no longer works.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/auth/login",
            &json!({ "email": new_email, "password": "password123" }),
            None,
        ))
        .await
        .expect("old password response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn ownership_is_enforced_with_not_found() {
    let Some(app) = test_app().await else {
        return;
    };

    // Two users; the second must not see or mutate the first one's game.
    let owner_email = format!("{}@example.com", Uuid::new_v4());
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/auth/signup",
            &json!({ "email": owner_email, "password": "password123" }),
            None,
        ))
        .await
        .expect("owner signup");
    let owner_session = cookie_pair(&response).expect("owner session");

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/games",
            &json!({ "title": "Outer Wilds" }),
            Some(&owner_session),
        ))
        .await
        .expect("owner game");
    let game_id = body_json(response)
        .await
        .get("id")
        .and_then(Value::as_str)
        .expect("game id")
        .to_string();

    let intruder_email = format!("{}@example.com", Uuid::new_v4());
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/auth/signup",
            &json!({ "email": intruder_email, "password": "password123" }),
            None,
        ))
        .await
        .expect("intruder signup");
    let intruder_session = cookie_pair(&response).expect("intruder session");

    let response = app
        .clone()
        .oneshot(bare_request(
            "DELETE",
            &format!("/v1/games/{game_id}"),
            Some(&intruder_session),
        ))
        .await
        .expect("intruder delete");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Owner can still delete it.
    let response = app
        .clone()
        .oneshot(bare_request(
            "DELETE",
            &format!("/v1/games/{game_id}"),
            Some(&owner_session),
        ))
        .await
        .expect("owner delete");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}
