//! Database operations for the `users` table.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::DbError;

/// A row from the `users` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Fields required to register a user. The password must already be hashed.
#[derive(Debug, Clone, Copy)]
pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
}

/// Inserts a user and returns the stored row.
///
/// # Errors
///
/// Returns [`DbError::Conflict`] if the email is already registered, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn create_user(pool: &SqlitePool, user: NewUser<'_>) -> Result<UserRow, DbError> {
    let row = sqlx::query_as::<_, UserRow>(
        "INSERT INTO users (name, email, password_hash, created_at) \
         VALUES (?1, ?2, ?3, ?4) \
         RETURNING id, name, email, password_hash, created_at",
    )
    .bind(user.name)
    .bind(user.email)
    .bind(user.password_hash)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            DbError::Conflict(format!("email '{}' already registered", user.email))
        }
        other => DbError::Sqlx(other),
    })?;

    Ok(row)
}

/// Returns the user with the given email, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_user_by_email(pool: &SqlitePool, email: &str) -> Result<Option<UserRow>, DbError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, name, email, password_hash, created_at \
         FROM users \
         WHERE email = ?1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns the user with the given id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_user_by_id(pool: &SqlitePool, id: i64) -> Result<Option<UserRow>, DbError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, name, email, password_hash, created_at \
         FROM users \
         WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
