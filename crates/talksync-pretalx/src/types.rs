//! Typed payloads for the Pretalx submissions API.
//!
//! Every field that the upstream API may omit (or that varies across API
//! versions) is optional here; the extractor degrades absence to empty or
//! sentinel values instead of failing.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Workflow state of a submission on the Pretalx side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum State {
    Submitted,
    Accepted,
    Confirmed,
    Rejected,
    Withdrawn,
    Canceled,
    Deleted,
    /// Any state this client does not know about. Never importable.
    #[serde(other)]
    Unknown,
}

impl State {
    /// Only confirmed and accepted submissions become talks.
    #[must_use]
    pub fn is_importable(self) -> bool {
        matches!(self, Self::Confirmed | Self::Accepted)
    }
}

/// A string that the API serves either as a plain string or as a
/// locale-keyed map (`{"en": "...", "de": "..."}`), depending on endpoint
/// and API version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocalizedString {
    Plain(String),
    ByLocale(BTreeMap<String, String>),
}

impl LocalizedString {
    /// The English text, if any.
    #[must_use]
    pub fn en(&self) -> Option<&str> {
        match self {
            Self::Plain(s) => Some(s.as_str()),
            Self::ByLocale(map) => map.get("en").map(String::as_str),
        }
    }
}

/// A speaker as embedded in a submission payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionSpeaker {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub biography: Option<String>,
    #[serde(default, alias = "avatar")]
    pub avatar_url: Option<String>,
}

/// A schedule slot: room assignment plus start/end times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    #[serde(default)]
    pub room: Option<LocalizedString>,
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
}

/// One raw submission record as served by the API. Read-only upstream data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub code: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, rename = "abstract")]
    pub abstract_text: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub state: State,
    #[serde(default)]
    pub speakers: Vec<SubmissionSpeaker>,
    #[serde(default)]
    pub slots: Vec<Slot>,
    #[serde(default)]
    pub track: Option<LocalizedString>,
    #[serde(default)]
    pub submission_type: Option<LocalizedString>,
    /// Duration in minutes.
    #[serde(default)]
    pub duration: Option<i64>,
    #[serde(default)]
    pub image: Option<String>,
}

/// Event metadata from the event detail endpoint. Only the display name is
/// consumed; everything else upstream serves is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct EventDetails {
    #[serde(default)]
    pub name: Option<LocalizedString>,
}

/// One page of the paginated submissions listing.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionsPage {
    pub count: i64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub results: Vec<Submission>,
}
