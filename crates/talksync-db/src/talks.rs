//! Database operations for `talks` and the `talk_speakers` join table.
//!
//! A talk's `pretalx_link` is its sole upstream identity key; the schema
//! enforces at most one talk per link.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

const TALK_COLUMNS: &str = "id, public_id, presentation_type, title, abstract, description, \
     start_time, duration_minutes, room_id, track, external_image_url, image, pretalx_link, \
     event_id, created_at, updated_at";

/// A row from the `talks` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TalkRow {
    pub id: i64,
    pub public_id: Uuid,
    pub presentation_type: String,
    pub title: String,
    #[sqlx(rename = "abstract")]
    pub abstract_text: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub duration_minutes: i32,
    pub room_id: Option<i64>,
    pub track: String,
    pub external_image_url: String,
    /// Path of the generated card image under the media root; empty when
    /// none has been generated yet.
    pub image: String,
    pub pretalx_link: String,
    pub event_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Returns the talk identified by its upstream `pretalx_link`, or `None`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_talk_by_pretalx_link(
    pool: &PgPool,
    pretalx_link: &str,
) -> Result<Option<TalkRow>, DbError> {
    let row = sqlx::query_as::<_, TalkRow>(&format!(
        "SELECT {TALK_COLUMNS} FROM talks WHERE pretalx_link = $1"
    ))
    .bind(pretalx_link)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Inserts a new talk and returns the full row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (including a duplicate
/// `pretalx_link`).
#[allow(clippy::too_many_arguments)] // full talk creation; no sensible grouping
pub async fn insert_talk(
    pool: &PgPool,
    presentation_type: &str,
    title: &str,
    abstract_text: &str,
    description: &str,
    start_time: DateTime<Utc>,
    duration_minutes: i32,
    room_id: Option<i64>,
    track: &str,
    external_image_url: &str,
    pretalx_link: &str,
    event_id: Option<i64>,
) -> Result<TalkRow, DbError> {
    let row = sqlx::query_as::<_, TalkRow>(&format!(
        "INSERT INTO talks \
           (presentation_type, title, abstract, description, start_time, duration_minutes, \
            room_id, track, external_image_url, pretalx_link, event_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
         RETURNING {TALK_COLUMNS}"
    ))
    .bind(presentation_type)
    .bind(title)
    .bind(abstract_text)
    .bind(description)
    .bind(start_time)
    .bind(duration_minutes)
    .bind(room_id)
    .bind(track)
    .bind(external_image_url)
    .bind(pretalx_link)
    .bind(event_id)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Overwrites a talk's mutable fields and returns the fresh row.
///
/// The caller decides the preserve-on-empty rules (duration/room/image URL);
/// this function writes exactly what it is given.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
#[allow(clippy::too_many_arguments)] // full talk overwrite; no sensible grouping
pub async fn update_talk(
    pool: &PgPool,
    talk_id: i64,
    presentation_type: &str,
    title: &str,
    abstract_text: &str,
    description: &str,
    start_time: DateTime<Utc>,
    duration_minutes: i32,
    room_id: Option<i64>,
    track: &str,
    external_image_url: &str,
    event_id: Option<i64>,
) -> Result<TalkRow, DbError> {
    let row = sqlx::query_as::<_, TalkRow>(&format!(
        "UPDATE talks \
         SET presentation_type = $2, title = $3, abstract = $4, description = $5, \
             start_time = $6, duration_minutes = $7, room_id = $8, track = $9, \
             external_image_url = $10, event_id = $11, updated_at = NOW() \
         WHERE id = $1 \
         RETURNING {TALK_COLUMNS}"
    ))
    .bind(talk_id)
    .bind(presentation_type)
    .bind(title)
    .bind(abstract_text)
    .bind(description)
    .bind(start_time)
    .bind(duration_minutes)
    .bind(room_id)
    .bind(track)
    .bind(external_image_url)
    .bind(event_id)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Deletes a talk; speaker attachments cascade, speaker rows survive.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_talk(pool: &PgPool, talk_id: i64) -> Result<(), DbError> {
    sqlx::query("DELETE FROM talks WHERE id = $1")
        .bind(talk_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Records the generated card image path for a talk.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn set_talk_image(pool: &PgPool, talk_id: i64, image: &str) -> Result<(), DbError> {
    sqlx::query("UPDATE talks SET image = $2, updated_at = NOW() WHERE id = $1")
        .bind(talk_id)
        .bind(image)
        .execute(pool)
        .await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// talk_speakers operations
// ---------------------------------------------------------------------------

/// Attaches a speaker to a talk; attaching twice is a no-op.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn attach_speaker(pool: &PgPool, talk_id: i64, speaker_id: i64) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO talk_speakers (talk_id, speaker_id) VALUES ($1, $2) \
         ON CONFLICT DO NOTHING",
    )
    .bind(talk_id)
    .bind(speaker_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Detaches the speakers with the given upstream codes from a talk.
/// The speaker rows themselves are left untouched.
///
/// Returns the number of attachments removed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn detach_speakers_by_codes(
    pool: &PgPool,
    talk_id: i64,
    codes: &[String],
) -> Result<u64, DbError> {
    let result = sqlx::query(
        "DELETE FROM talk_speakers \
         WHERE talk_id = $1 \
           AND speaker_id IN (SELECT id FROM speakers WHERE code = ANY($2))",
    )
    .bind(talk_id)
    .bind(codes)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Returns the upstream codes of all speakers attached to a talk.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_talk_speaker_codes(pool: &PgPool, talk_id: i64) -> Result<Vec<String>, DbError> {
    let codes = sqlx::query_scalar::<_, String>(
        "SELECT s.code FROM speakers s \
         JOIN talk_speakers ts ON ts.speaker_id = s.id \
         WHERE ts.talk_id = $1 \
         ORDER BY s.code",
    )
    .bind(talk_id)
    .fetch_all(pool)
    .await?;
    Ok(codes)
}

/// Returns all speakers attached to a talk, ordered by attachment insertion.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_talk_speakers(
    pool: &PgPool,
    talk_id: i64,
) -> Result<Vec<crate::SpeakerRow>, DbError> {
    let rows = sqlx::query_as::<_, crate::SpeakerRow>(
        "SELECT s.id, s.code, s.name, s.biography, s.avatar_url, s.created_at, s.updated_at \
         FROM speakers s \
         JOIN talk_speakers ts ON ts.speaker_id = s.id \
         WHERE ts.talk_id = $1 \
         ORDER BY s.id",
    )
    .bind(talk_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
