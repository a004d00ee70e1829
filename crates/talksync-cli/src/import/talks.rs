//! Talk create/update and the speaker-set sync that follows an update.

use sqlx::PgPool;
use talksync_core::{default_track_for, PresentationType};
use talksync_db::TalkRow;
use talksync_pretalx::{SubmissionData, SubmissionSpeaker};

use super::context::{ImportContext, LogStyle, VerbosityLevel};
use super::{rooms, speakers};

/// Pretalx submission-type labels and the presentation type each maps to.
/// Labels not listed here fall back to `Talk` with a warning.
const PRETALX_TYPE_MAPPING: &[(&str, PresentationType)] = &[
    ("Invited Talk", PresentationType::Talk),
    ("Keynote", PresentationType::Keynote),
    ("Kids Workshop", PresentationType::Kids),
    ("Lightning Talks", PresentationType::Lightning),
    ("Panel", PresentationType::Panel),
    ("Plenary Session [Organizers]", PresentationType::Plenary),
    ("Sponsored Talk (Keystone)", PresentationType::Tutorial),
    ("Sponsored Talk (long)", PresentationType::Talk),
    ("Sponsored Talk", PresentationType::Talk),
    ("Talk (long) [Sponsored]", PresentationType::Talk),
    ("Talk (long)", PresentationType::Talk),
    ("Talk [Sponsored]", PresentationType::Talk),
    ("Talk", PresentationType::Talk),
    ("Tutorial [Sponsored]", PresentationType::Tutorial),
    ("Tutorial", PresentationType::Tutorial),
];

/// Maps a Pretalx submission-type label to a [`PresentationType`]. Empty and
/// unrecognized labels default to `Talk` with a warning.
pub(super) fn map_presentation_type(
    submission_type: &str,
    submission_code: &str,
    ctx: &ImportContext,
) -> PresentationType {
    if submission_type.is_empty() {
        ctx.log(
            &format!("Empty presentation type for submission {submission_code}, defaulting to 'Talk'"),
            VerbosityLevel::Detailed,
            LogStyle::Warning,
        );
        return PresentationType::Talk;
    }

    match PRETALX_TYPE_MAPPING
        .iter()
        .find(|(label, _)| *label == submission_type)
    {
        Some((_, mapped)) => *mapped,
        None => {
            ctx.log(
                &format!(
                    "Unrecognized presentation type '{submission_type}' for \
                     submission {submission_code}, defaulting to 'Talk'"
                ),
                VerbosityLevel::Detailed,
                LogStyle::Warning,
            );
            PresentationType::Talk
        }
    }
}

/// Inserts a new talk from extracted submission data.
pub(super) async fn create_talk(
    pool: &PgPool,
    data: &SubmissionData,
    ctx: &ImportContext,
) -> anyhow::Result<TalkRow> {
    let presentation_type = map_presentation_type(&data.submission_type, &data.code, ctx);
    let room = rooms::get_or_create_room(pool, &data.room, ctx).await?;
    let duration_minutes = data
        .duration_minutes
        .unwrap_or_else(|| presentation_type.default_duration_minutes());

    let talk = talksync_db::insert_talk(
        pool,
        presentation_type.as_str(),
        &data.title,
        &data.abstract_text,
        &data.description,
        data.start_time,
        duration_minutes,
        room.map(|r| r.id),
        &default_track_for(presentation_type, &data.track),
        &data.image_url,
        &data.pretalx_link,
        ctx.event_id,
    )
    .await?;

    ctx.log(
        &format!("Created talk: {}", data.title),
        VerbosityLevel::Detailed,
        LogStyle::Success,
    );
    Ok(talk)
}

/// Overwrites an existing talk with fresh submission data and syncs its
/// speaker set.
///
/// Preserve-on-empty rules: a missing duration, room, or external image URL
/// keeps the stored value. Room assignments routinely disappear from the
/// upstream schedule for a while and come back.
pub(super) async fn update_talk(
    pool: &PgPool,
    existing: &TalkRow,
    data: &SubmissionData,
    submission_speakers: &[SubmissionSpeaker],
    ctx: &ImportContext,
) -> anyhow::Result<TalkRow> {
    let presentation_type = map_presentation_type(&data.submission_type, &data.code, ctx);
    let room_id = if data.room.is_empty() {
        existing.room_id
    } else {
        rooms::get_or_create_room(pool, &data.room, ctx)
            .await?
            .map(|r| r.id)
    };
    let duration_minutes = data.duration_minutes.unwrap_or(existing.duration_minutes);
    let external_image_url = if data.image_url.is_empty() {
        existing.external_image_url.as_str()
    } else {
        data.image_url.as_str()
    };

    let talk = talksync_db::update_talk(
        pool,
        existing.id,
        presentation_type.as_str(),
        &data.title,
        &data.abstract_text,
        &data.description,
        data.start_time,
        duration_minutes,
        room_id,
        &default_track_for(presentation_type, &data.track),
        external_image_url,
        ctx.event_id.or(existing.event_id),
    )
    .await?;

    ctx.log(
        &format!("Updated talk: {}", talk.title),
        VerbosityLevel::Detailed,
        LogStyle::Success,
    );

    sync_talk_speakers(pool, &talk, submission_speakers, ctx).await?;
    Ok(talk)
}

/// Attaches every submission speaker to a freshly created talk.
pub(super) async fn add_speakers_to_talk(
    pool: &PgPool,
    talk: &TalkRow,
    submission_speakers: &[SubmissionSpeaker],
    ctx: &ImportContext,
) -> anyhow::Result<()> {
    for speaker in submission_speakers {
        let row = speakers::get_or_create_speaker(pool, speaker, ctx).await?;
        talksync_db::attach_speaker(pool, talk.id, row.id).await?;
    }
    if !submission_speakers.is_empty() {
        ctx.log(
            &format!(
                "Added {} speakers to talk: {}",
                submission_speakers.len(),
                talk.title
            ),
            VerbosityLevel::Detailed,
            LogStyle::Success,
        );
    }
    Ok(())
}

/// Converges a talk's attached speaker set on the submission's current one:
/// missing speakers are attached, dropped ones detached. Suppressed entirely
/// by `--dry-run` and `--no-update`.
pub(super) async fn sync_talk_speakers(
    pool: &PgPool,
    talk: &TalkRow,
    submission_speakers: &[SubmissionSpeaker],
    ctx: &ImportContext,
) -> anyhow::Result<()> {
    if ctx.dry_run {
        ctx.log(
            &format!("Would update speakers for talk: {} (dry run)", talk.title),
            VerbosityLevel::Detailed,
            LogStyle::Plain,
        );
        return Ok(());
    }
    if ctx.no_update {
        ctx.log(
            &format!(
                "Skipping speaker updates due to --no-update flag: {}",
                talk.title
            ),
            VerbosityLevel::Detailed,
            LogStyle::Warning,
        );
        return Ok(());
    }

    let current_codes = talksync_db::list_talk_speaker_codes(pool, talk.id).await?;

    let mut added = 0usize;
    for speaker in submission_speakers {
        if current_codes.contains(&speaker.code) {
            continue;
        }
        let row = speakers::get_or_create_speaker(pool, speaker, ctx).await?;
        talksync_db::attach_speaker(pool, talk.id, row.id).await?;
        added += 1;
    }
    if added > 0 {
        ctx.log(
            &format!("Added {added} speakers to talk: {}", talk.title),
            VerbosityLevel::Detailed,
            LogStyle::Success,
        );
    }

    let to_remove: Vec<String> = current_codes
        .into_iter()
        .filter(|code| !submission_speakers.iter().any(|s| &s.code == code))
        .collect();
    if !to_remove.is_empty() {
        let removed = talksync_db::detach_speakers_by_codes(pool, talk.id, &to_remove).await?;
        ctx.log(
            &format!("Removed {removed} speakers from talk: {}", talk.title),
            VerbosityLevel::Detailed,
            LogStyle::Success,
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use talksync_cards::CardFormat;

    fn quiet_ctx() -> ImportContext {
        ImportContext {
            verbosity: VerbosityLevel::Minimal,
            dry_run: false,
            no_update: false,
            skip_images: true,
            image_format: CardFormat::Webp,
            base_url: "https://pretalx.com".to_owned(),
            event_slug: "ev".to_owned(),
            event_name: String::new(),
            pretalx_event_url: "https://pretalx.com/ev".to_owned(),
            event_id: None,
        }
    }

    #[test]
    fn known_labels_map_to_their_type() {
        let ctx = quiet_ctx();
        assert_eq!(
            map_presentation_type("Keynote", "ABC", &ctx),
            PresentationType::Keynote
        );
        assert_eq!(
            map_presentation_type("Sponsored Talk (Keystone)", "ABC", &ctx),
            PresentationType::Tutorial
        );
        assert_eq!(
            map_presentation_type("Lightning Talks", "ABC", &ctx),
            PresentationType::Lightning
        );
    }

    #[test]
    fn empty_and_unknown_labels_default_to_talk() {
        let ctx = quiet_ctx();
        assert_eq!(map_presentation_type("", "ABC", &ctx), PresentationType::Talk);
        assert_eq!(
            map_presentation_type("Interpretive Dance", "ABC", &ctx),
            PresentationType::Talk
        );
    }
}
