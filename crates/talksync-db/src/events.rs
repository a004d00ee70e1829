//! Database operations for the `events` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `events` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EventRow {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub year: i32,
    pub pretalx_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Returns an event by its unique slug, or `None`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_event_by_slug(pool: &PgPool, slug: &str) -> Result<Option<EventRow>, DbError> {
    let row = sqlx::query_as::<_, EventRow>(
        "SELECT id, slug, name, year, pretalx_url, created_at, updated_at \
         FROM events WHERE slug = $1",
    )
    .bind(slug)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Gets the event for `slug`, creating it when missing.
///
/// Returns `(event, created)`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if a query fails, or [`DbError::NotFound`] if
/// the row vanished between a losing insert and the follow-up select.
pub async fn get_or_create_event(
    pool: &PgPool,
    slug: &str,
    name: &str,
    year: i32,
    pretalx_url: &str,
) -> Result<(EventRow, bool), DbError> {
    let inserted = sqlx::query_as::<_, EventRow>(
        "INSERT INTO events (slug, name, year, pretalx_url) VALUES ($1, $2, $3, $4) \
         ON CONFLICT (slug) DO NOTHING \
         RETURNING id, slug, name, year, pretalx_url, created_at, updated_at",
    )
    .bind(slug)
    .bind(name)
    .bind(year)
    .bind(pretalx_url)
    .fetch_optional(pool)
    .await?;

    match inserted {
        Some(row) => Ok((row, true)),
        None => {
            let row = get_event_by_slug(pool, slug).await?.ok_or(DbError::NotFound)?;
            Ok((row, false))
        }
    }
}

/// Updates an event's display name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn update_event_name(pool: &PgPool, event_id: i64, name: &str) -> Result<(), DbError> {
    sqlx::query("UPDATE events SET name = $2, updated_at = NOW() WHERE id = $1")
        .bind(event_id)
        .bind(name)
        .execute(pool)
        .await?;
    Ok(())
}
