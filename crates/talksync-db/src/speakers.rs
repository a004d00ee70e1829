//! Database operations for the `speakers` table.
//!
//! Speakers are identified by their upstream Pretalx code. The pipeline
//! creates and updates speakers but never deletes them — talks merely attach
//! and detach them.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `speakers` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SpeakerRow {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub biography: String,
    pub avatar_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile fields for a speaker about to be inserted.
#[derive(Debug, Clone)]
pub struct NewSpeaker {
    pub code: String,
    pub name: String,
    pub biography: String,
    pub avatar_url: String,
}

/// Returns all speakers whose upstream code is in `codes`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_speakers_by_codes(
    pool: &PgPool,
    codes: &[String],
) -> Result<Vec<SpeakerRow>, DbError> {
    let rows = sqlx::query_as::<_, SpeakerRow>(
        "SELECT id, code, name, biography, avatar_url, created_at, updated_at \
         FROM speakers WHERE code = ANY($1)",
    )
    .bind(codes)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Bulk-inserts speakers, skipping codes that already exist (racing inserts
/// of the same code must not error).
///
/// Returns the number of rows actually inserted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_missing_speakers(
    pool: &PgPool,
    speakers: &[NewSpeaker],
) -> Result<u64, DbError> {
    let codes: Vec<&str> = speakers.iter().map(|s| s.code.as_str()).collect();
    let names: Vec<&str> = speakers.iter().map(|s| s.name.as_str()).collect();
    let biographies: Vec<&str> = speakers.iter().map(|s| s.biography.as_str()).collect();
    let avatars: Vec<&str> = speakers.iter().map(|s| s.avatar_url.as_str()).collect();

    let result = sqlx::query(
        "INSERT INTO speakers (code, name, biography, avatar_url) \
         SELECT * FROM UNNEST($1::TEXT[], $2::TEXT[], $3::TEXT[], $4::TEXT[]) \
         ON CONFLICT (code) DO NOTHING",
    )
    .bind(codes)
    .bind(names)
    .bind(biographies)
    .bind(avatars)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Overwrites name/biography/avatar for the speaker with `code`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn update_speaker_profile(
    pool: &PgPool,
    code: &str,
    name: &str,
    biography: &str,
    avatar_url: &str,
) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE speakers \
         SET name = $2, biography = $3, avatar_url = $4, updated_at = NOW() \
         WHERE code = $1",
    )
    .bind(code)
    .bind(name)
    .bind(biography)
    .bind(avatar_url)
    .execute(pool)
    .await?;
    Ok(())
}

/// Returns a speaker by upstream code, or `None`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_speaker_by_code(pool: &PgPool, code: &str) -> Result<Option<SpeakerRow>, DbError> {
    let row = sqlx::query_as::<_, SpeakerRow>(
        "SELECT id, code, name, biography, avatar_url, created_at, updated_at \
         FROM speakers WHERE code = $1",
    )
    .bind(code)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Creates a speaker, tolerating a concurrent insert of the same code, and
/// returns the winning row either way.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert or follow-up select fails, or
/// [`DbError::NotFound`] if the row vanished between the two.
pub async fn create_speaker(pool: &PgPool, speaker: &NewSpeaker) -> Result<SpeakerRow, DbError> {
    let inserted = sqlx::query_as::<_, SpeakerRow>(
        "INSERT INTO speakers (code, name, biography, avatar_url) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (code) DO NOTHING \
         RETURNING id, code, name, biography, avatar_url, created_at, updated_at",
    )
    .bind(&speaker.code)
    .bind(&speaker.name)
    .bind(&speaker.biography)
    .bind(&speaker.avatar_url)
    .fetch_optional(pool)
    .await?;

    match inserted {
        Some(row) => Ok(row),
        None => get_speaker_by_code(pool, &speaker.code)
            .await?
            .ok_or(DbError::NotFound),
    }
}
