//! Database helpers for account records.

use anyhow::{Context, Result};
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::utils::is_unique_violation;

/// Outcome when attempting to create a new user.
#[derive(Debug)]
pub(super) enum SignupOutcome {
    Created(UserRecord),
    Conflict,
}

/// Account fields needed by signup and login.
#[derive(Debug)]
pub(crate) struct UserRecord {
    pub(crate) id: Uuid,
    pub(crate) email: String,
    pub(crate) password_hash: String,
}

pub(super) async fn insert_user(
    pool: &PgPool,
    email: &str,
    password_hash: &str,
) -> Result<SignupOutcome> {
    let query = r"
        INSERT INTO users (email, password_hash)
        VALUES ($1, $2)
        RETURNING id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .bind(password_hash)
        .fetch_one(pool)
        .instrument(span)
        .await;

    match row {
        Ok(row) => Ok(SignupOutcome::Created(UserRecord {
            id: row.get("id"),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
        })),
        Err(err) => {
            if is_unique_violation(&err) {
                return Ok(SignupOutcome::Conflict);
            }
            Err(err).context("failed to insert user")
        }
    }
}

pub(super) async fn lookup_user_by_email(pool: &PgPool, email: &str) -> Result<Option<UserRecord>> {
    let query = "SELECT id, email, password_hash FROM users WHERE email = $1 LIMIT 1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup user by email")?;

    Ok(row.map(|row| UserRecord {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
    }))
}

#[cfg(test)]
mod tests {
    use super::{SignupOutcome, UserRecord};
    use uuid::Uuid;

    #[test]
    fn signup_outcome_debug_names() {
        let created = SignupOutcome::Created(UserRecord {
            id: Uuid::nil(),
            email: "a@example.com".to_string(),
            password_hash: "hash".to_string(),
        });
        assert!(format!("{created:?}").starts_with("Created"));
        assert_eq!(format!("{:?}", SignupOutcome::Conflict), "Conflict");
    }

    #[test]
    fn user_record_holds_values() {
        let record = UserRecord {
            id: Uuid::nil(),
            email: "a@example.com".to_string(),
            password_hash: "hash".to_string(),
        };
        assert_eq!(record.id, Uuid::nil());
        assert_eq!(record.email, "a@example.com");
        assert_eq!(record.password_hash, "hash");
    }
}
