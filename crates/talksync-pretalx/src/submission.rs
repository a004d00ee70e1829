//! Extraction of clean, flat [`SubmissionData`] from a raw [`Submission`],
//! plus lightning-talk / announcement classification.

use chrono::{DateTime, Utc};

use talksync_core::{
    far_future, truncate_chars, MAX_ROOM_NAME_LENGTH, MAX_TALK_TITLE_LENGTH,
    MAX_TRACK_NAME_LENGTH,
};

use crate::types::{LocalizedString, Submission};

/// Flat, truncated representation of one submission, safe to persist.
///
/// Constructed fresh per submission per run; never stored. Every upstream
/// field may be absent and degrades to an empty or sentinel value.
#[derive(Debug, Clone)]
pub struct SubmissionData {
    pub code: String,
    /// Truncated to 250 chars. Empty when the submission has no title.
    pub title: String,
    pub abstract_text: String,
    pub description: String,
    /// English room name, truncated to 50 chars; empty when unassigned.
    pub room: String,
    /// English track name, truncated to 100 chars; empty when absent.
    pub track: String,
    /// First slot's start, or the far-future sentinel when unscheduled.
    pub start_time: DateTime<Utc>,
    pub duration_minutes: Option<i32>,
    /// English submission-type label; empty when absent.
    pub submission_type: String,
    /// `{base_url}/{event_slug}/talk/{code}` — the upstream identity key.
    pub pretalx_link: String,
    pub image_url: String,
}

impl SubmissionData {
    #[must_use]
    pub fn from_submission(submission: &Submission, base_url: &str, event_slug: &str) -> Self {
        let base_url = base_url.trim_end_matches('/');
        Self {
            code: submission.code.clone(),
            title: submission
                .title
                .as_deref()
                .map(|t| truncate_chars(t, MAX_TALK_TITLE_LENGTH))
                .unwrap_or_default(),
            abstract_text: submission.abstract_text.clone().unwrap_or_default(),
            description: submission.description.clone().unwrap_or_default(),
            room: extract_room(submission),
            track: extract_track(submission),
            start_time: extract_start_time(submission),
            duration_minutes: submission
                .duration
                .filter(|&m| m > 0)
                .and_then(|m| i32::try_from(m).ok()),
            submission_type: extract_submission_type(submission),
            pretalx_link: format!("{base_url}/{event_slug}/talk/{}", submission.code),
            image_url: submission.image.clone().unwrap_or_default(),
        }
    }
}

fn extract_room(submission: &Submission) -> String {
    submission
        .slots
        .first()
        .and_then(|slot| slot.room.as_ref())
        .and_then(LocalizedString::en)
        .map(|name| truncate_chars(name, MAX_ROOM_NAME_LENGTH))
        .unwrap_or_default()
}

fn extract_track(submission: &Submission) -> String {
    submission
        .track
        .as_ref()
        .and_then(LocalizedString::en)
        .map(|name| truncate_chars(name, MAX_TRACK_NAME_LENGTH))
        .unwrap_or_default()
}

fn extract_start_time(submission: &Submission) -> DateTime<Utc> {
    submission
        .slots
        .first()
        .and_then(|slot| slot.start)
        .unwrap_or_else(far_future)
}

fn extract_submission_type(submission: &Submission) -> String {
    submission
        .submission_type
        .as_ref()
        .and_then(LocalizedString::en)
        .unwrap_or_default()
        .to_owned()
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

const LIGHTNING_TERMS: &[&str] = &[
    "lightning",
    "lightning talk",
    "lightning talks",
    "lightning talks (1/2)",
    "lightning talks (2/2)",
];

const ANNOUNCEMENT_TERMS: &[&str] = &["opening session", "closing session"];

fn matches_terms(submission: &Submission, terms: &[&str]) -> bool {
    let localized = [
        submission.track.as_ref().and_then(LocalizedString::en),
        submission.title.as_deref(),
        submission.submission_type.as_ref().and_then(LocalizedString::en),
    ];
    localized
        .into_iter()
        .flatten()
        .any(|field| terms.contains(&field.to_lowercase().as_str()))
}

/// True when the track, title, or submission type marks a lightning talk.
#[must_use]
pub fn is_lightning_talk(submission: &Submission) -> bool {
    matches_terms(submission, LIGHTNING_TERMS)
}

/// True for opening/closing-session announcements.
#[must_use]
pub fn is_announcement(submission: &Submission) -> bool {
    matches_terms(submission, ANNOUNCEMENT_TERMS)
}
