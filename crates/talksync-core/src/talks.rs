//! Domain constants and the presentation-type enum shared across the pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum length of a talk title; longer upstream titles are truncated.
pub const MAX_TALK_TITLE_LENGTH: usize = 250;
/// Maximum length of a room name.
pub const MAX_ROOM_NAME_LENGTH: usize = 50;
/// Maximum length of a track name.
pub const MAX_TRACK_NAME_LENGTH: usize = 100;

/// Track assigned to lightning talks that carry none upstream.
pub const LIGHTNING_TRACK: &str = "Lightning Talks";
/// Track assigned to every other talk that carries none upstream.
pub const DEFAULT_TRACK: &str = "No track";

/// Sentinel start time for talks without a schedule slot (2050-01-01T00:00:00Z).
///
/// Keeping a single fixed value guarantees a stable sort order for
/// schedule-less talks.
#[must_use]
pub fn far_future() -> DateTime<Utc> {
    DateTime::from_timestamp(2_524_608_000, 0).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Truncate `s` to at most `max` characters (not bytes).
#[must_use]
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// The kind of a talk as stored on the `talks` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PresentationType {
    Keynote,
    Kids,
    Lightning,
    Panel,
    Plenary,
    #[default]
    Talk,
    Tutorial,
}

impl PresentationType {
    /// The string form persisted in `talks.presentation_type`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Keynote => "Keynote",
            Self::Kids => "Kids",
            Self::Lightning => "Lightning",
            Self::Panel => "Panel",
            Self::Plenary => "Plenary",
            Self::Talk => "Talk",
            Self::Tutorial => "Tutorial",
        }
    }

    /// Default duration in minutes when the submission carries none.
    #[must_use]
    pub fn default_duration_minutes(self) -> i32 {
        match self {
            Self::Keynote | Self::Panel | Self::Tutorial => 45,
            Self::Kids | Self::Talk => 30,
            Self::Lightning | Self::Plenary => 0,
        }
    }
}

impl std::fmt::Display for PresentationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Track to persist for a talk: the extracted track when present, otherwise
/// a per-type default.
#[must_use]
pub fn default_track_for(presentation_type: PresentationType, extracted: &str) -> String {
    if !extracted.is_empty() {
        return extracted.to_owned();
    }
    match presentation_type {
        PresentationType::Lightning => LIGHTNING_TRACK.to_owned(),
        _ => DEFAULT_TRACK.to_owned(),
    }
}
