//! Room handling: one bulk insert up front, plus a per-talk lookup fallback.

use std::collections::BTreeSet;

use sqlx::PgPool;
use talksync_db::RoomRow;
use talksync_pretalx::{Submission, SubmissionData};

use super::context::{ImportContext, LogStyle, VerbosityLevel};

fn room_description(name: &str) -> String {
    format!("Room imported from Pretalx: {name}")
}

/// Creates every room referenced by an importable submission in one bulk
/// insert. Names already present are left untouched.
pub(super) async fn batch_create_rooms(
    pool: &PgPool,
    submissions: &[Submission],
    ctx: &ImportContext,
) -> anyhow::Result<()> {
    let names: BTreeSet<String> = submissions
        .iter()
        .filter(|sub| sub.state.is_importable())
        .filter_map(|sub| {
            let data = SubmissionData::from_submission(sub, &ctx.base_url, &ctx.event_slug);
            (!data.room.is_empty()).then_some(data.room)
        })
        .collect();
    if names.is_empty() {
        return Ok(());
    }

    let names: Vec<String> = names.into_iter().collect();
    let descriptions: Vec<String> = names.iter().map(|n| room_description(n)).collect();
    let inserted = talksync_db::insert_missing_rooms(pool, &names, &descriptions).await?;
    if inserted > 0 {
        ctx.log(
            &format!("Batch created {inserted} rooms"),
            VerbosityLevel::Detailed,
            LogStyle::Success,
        );
    }
    Ok(())
}

/// Resolves a room by name, creating it when missing. Empty names resolve to
/// `None`. In dry-run mode a missing room yields an unsaved placeholder row.
pub(super) async fn get_or_create_room(
    pool: &PgPool,
    room_name: &str,
    ctx: &ImportContext,
) -> anyhow::Result<Option<RoomRow>> {
    if room_name.is_empty() {
        return Ok(None);
    }

    if let Some(existing) = talksync_db::get_room_by_name(pool, room_name).await? {
        ctx.log(
            &format!("Using existing room: {room_name}"),
            VerbosityLevel::Detailed,
            LogStyle::Plain,
        );
        return Ok(Some(existing));
    }

    if ctx.dry_run {
        ctx.log(
            &format!("Would create room: {room_name} (dry run)"),
            VerbosityLevel::Detailed,
            LogStyle::Success,
        );
        return Ok(Some(RoomRow {
            id: 0,
            name: room_name.to_owned(),
            description: String::new(),
            created_at: chrono::Utc::now(),
        }));
    }

    let room = talksync_db::create_room(pool, room_name, &room_description(room_name)).await?;
    ctx.log(
        &format!("Created room: {room_name}"),
        VerbosityLevel::Detailed,
        LogStyle::Success,
    );
    Ok(Some(room))
}
