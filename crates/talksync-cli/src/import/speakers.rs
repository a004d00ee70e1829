//! Speaker handling: one batched create/update pass up front, plus a
//! per-speaker fallback used while syncing talk attachments.

use std::collections::BTreeMap;

use sqlx::PgPool;
use talksync_db::{NewSpeaker, SpeakerRow};
use talksync_pretalx::{Submission, SubmissionSpeaker};

use super::context::{ImportContext, LogStyle, VerbosityLevel};

fn new_speaker(speaker: &SubmissionSpeaker) -> NewSpeaker {
    NewSpeaker {
        code: speaker.code.clone(),
        name: speaker.name.clone(),
        biography: speaker.biography.clone().unwrap_or_default(),
        avatar_url: speaker.avatar_url.clone().unwrap_or_default(),
    }
}

fn profile_differs(existing: &SpeakerRow, speaker: &SubmissionSpeaker) -> bool {
    existing.name != speaker.name
        || existing.biography != speaker.biography.as_deref().unwrap_or_default()
        || existing.avatar_url != speaker.avatar_url.as_deref().unwrap_or_default()
}

/// Unique speakers across all importable submissions, keyed by upstream code.
/// Later occurrences of the same code win, which is harmless because the API
/// serves identical speaker payloads per event.
pub(super) fn collect_speakers_from_submissions(
    submissions: &[Submission],
) -> BTreeMap<String, &SubmissionSpeaker> {
    submissions
        .iter()
        .filter(|sub| sub.state.is_importable())
        .flat_map(|sub| &sub.speakers)
        .map(|speaker| (speaker.code.clone(), speaker))
        .collect()
}

/// Creates all missing speakers in one bulk insert and rewrites the profile
/// of every existing speaker whose name, biography, or avatar changed
/// upstream. `--no-update` suppresses the rewrite, never the insert.
pub(super) async fn batch_upsert_speakers(
    pool: &PgPool,
    submissions: &[Submission],
    ctx: &ImportContext,
) -> anyhow::Result<()> {
    let speakers = collect_speakers_from_submissions(submissions);
    if speakers.is_empty() {
        return Ok(());
    }

    let codes: Vec<String> = speakers.keys().cloned().collect();
    let existing: BTreeMap<String, SpeakerRow> =
        talksync_db::list_speakers_by_codes(pool, &codes)
            .await?
            .into_iter()
            .map(|row| (row.code.clone(), row))
            .collect();

    let mut to_create = Vec::new();
    let mut to_update = Vec::new();
    for (code, speaker) in &speakers {
        match existing.get(code) {
            None => to_create.push(new_speaker(speaker)),
            Some(row) if !ctx.no_update && profile_differs(row, speaker) => {
                to_update.push(*speaker);
            }
            Some(_) => {}
        }
    }

    if !to_create.is_empty() {
        let inserted = talksync_db::insert_missing_speakers(pool, &to_create).await?;
        ctx.log(
            &format!("Batch created {inserted} speakers"),
            VerbosityLevel::Detailed,
            LogStyle::Success,
        );
    }

    if !to_update.is_empty() {
        for speaker in &to_update {
            talksync_db::update_speaker_profile(
                pool,
                &speaker.code,
                &speaker.name,
                speaker.biography.as_deref().unwrap_or_default(),
                speaker.avatar_url.as_deref().unwrap_or_default(),
            )
            .await?;
        }
        ctx.log(
            &format!("Batch updated {} speakers", to_update.len()),
            VerbosityLevel::Detailed,
            LogStyle::Success,
        );
    }

    Ok(())
}

/// Resolves one speaker by code, creating or refreshing the row as the run
/// flags allow. In dry-run mode a missing speaker yields an unsaved
/// placeholder row.
pub(super) async fn get_or_create_speaker(
    pool: &PgPool,
    speaker: &SubmissionSpeaker,
    ctx: &ImportContext,
) -> anyhow::Result<SpeakerRow> {
    if let Some(existing) = talksync_db::get_speaker_by_code(pool, &speaker.code).await? {
        if ctx.no_update {
            ctx.log(
                &format!(
                    "Skipping update for existing speaker: {} (--no-update)",
                    speaker.name
                ),
                VerbosityLevel::Detailed,
                LogStyle::Warning,
            );
            return Ok(existing);
        }
        if !ctx.dry_run && profile_differs(&existing, speaker) {
            talksync_db::update_speaker_profile(
                pool,
                &speaker.code,
                &speaker.name,
                speaker.biography.as_deref().unwrap_or_default(),
                speaker.avatar_url.as_deref().unwrap_or_default(),
            )
            .await?;
            ctx.log(
                &format!("Updated speaker: {}", speaker.name),
                VerbosityLevel::Detailed,
                LogStyle::Success,
            );
        }
        return Ok(existing);
    }

    if ctx.dry_run {
        ctx.log(
            &format!("Would create speaker: {} (dry run)", speaker.name),
            VerbosityLevel::Detailed,
            LogStyle::Success,
        );
        let now = chrono::Utc::now();
        return Ok(SpeakerRow {
            id: 0,
            code: speaker.code.clone(),
            name: speaker.name.clone(),
            biography: speaker.biography.clone().unwrap_or_default(),
            avatar_url: speaker.avatar_url.clone().unwrap_or_default(),
            created_at: now,
            updated_at: now,
        });
    }

    let created = talksync_db::create_speaker(pool, &new_speaker(speaker)).await?;
    ctx.log(
        &format!("Created speaker: {}", speaker.name),
        VerbosityLevel::Detailed,
        LogStyle::Success,
    );
    Ok(created)
}
