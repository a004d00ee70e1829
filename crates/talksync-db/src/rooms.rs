//! Database operations for the `rooms` table.
//!
//! Rooms are identified by name. The pipeline only ever creates rooms; it
//! never updates or deletes them.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `rooms` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RoomRow {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Bulk-inserts rooms by name, tolerating concurrent inserts of the same
/// name. `descriptions` must be parallel to `names`.
///
/// Returns the number of rows actually inserted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_missing_rooms(
    pool: &PgPool,
    names: &[String],
    descriptions: &[String],
) -> Result<u64, DbError> {
    let result = sqlx::query(
        "INSERT INTO rooms (name, description) \
         SELECT * FROM UNNEST($1::TEXT[], $2::TEXT[]) \
         ON CONFLICT (name) DO NOTHING",
    )
    .bind(names)
    .bind(descriptions)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Returns a room by its unique name, or `None`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_room_by_name(pool: &PgPool, name: &str) -> Result<Option<RoomRow>, DbError> {
    let row = sqlx::query_as::<_, RoomRow>(
        "SELECT id, name, description, created_at FROM rooms WHERE name = $1",
    )
    .bind(name)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Creates a room, tolerating a concurrent insert of the same name, and
/// returns the winning row either way.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert or the follow-up select fails,
/// or [`DbError::NotFound`] if the row vanished between the two.
pub async fn create_room(pool: &PgPool, name: &str, description: &str) -> Result<RoomRow, DbError> {
    let inserted = sqlx::query_as::<_, RoomRow>(
        "INSERT INTO rooms (name, description) VALUES ($1, $2) \
         ON CONFLICT (name) DO NOTHING \
         RETURNING id, name, description, created_at",
    )
    .bind(name)
    .bind(description)
    .fetch_optional(pool)
    .await?;

    match inserted {
        Some(row) => Ok(row),
        None => get_room_by_name(pool, name).await?.ok_or(DbError::NotFound),
    }
}
