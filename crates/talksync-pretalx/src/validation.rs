//! Import eligibility checks for submissions.
//!
//! Validation never raises and never logs: it returns a [`ValidationReport`]
//! carrying a hard importability verdict plus a list of soft issues, so the
//! caller decides how to surface them. Checks run independently — a report
//! can be non-importable and still carry additional warnings.

use talksync_core::MAX_TALK_TITLE_LENGTH;

use crate::submission::{is_announcement, is_lightning_talk};
use crate::types::Submission;

/// A single soft or hard finding about a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    /// Hard failure: nothing to import without a title.
    MissingTitle,
    /// The title will be silently truncated to the maximum length.
    TitleTooLong { chars: usize },
    /// No speakers listed. `exempt` is true for lightning talks and
    /// announcements, which are allowed to have none.
    NoSpeakers { exempt: bool },
    /// Informational: no room assigned yet.
    NoRoom,
}

/// Outcome of validating one submission.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub importable: bool,
    pub issues: Vec<ValidationIssue>,
}

/// Validate `submission` for import.
///
/// `allow_missing_speakers` mirrors the site-wide permissive setting: when
/// set, speaker-less submissions are importable even if they are neither
/// lightning talks nor announcements (a warning issue is recorded either
/// way).
#[must_use]
pub fn validate(submission: &Submission, allow_missing_speakers: bool) -> ValidationReport {
    let mut issues = Vec::new();
    let mut importable = true;

    match submission.title.as_deref() {
        None | Some("") => {
            issues.push(ValidationIssue::MissingTitle);
            importable = false;
        }
        Some(title) => {
            let chars = title.chars().count();
            if chars > MAX_TALK_TITLE_LENGTH {
                issues.push(ValidationIssue::TitleTooLong { chars });
            }
        }
    }

    if submission.speakers.is_empty() {
        let exempt = is_lightning_talk(submission) || is_announcement(submission);
        issues.push(ValidationIssue::NoSpeakers { exempt });
        if !exempt && !allow_missing_speakers {
            importable = false;
        }
    }

    let has_room = submission
        .slots
        .first()
        .is_some_and(|slot| slot.room.is_some());
    if !has_room {
        issues.push(ValidationIssue::NoRoom);
    }

    ValidationReport { importable, issues }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LocalizedString, Slot, State, SubmissionSpeaker};

    fn speaker() -> SubmissionSpeaker {
        SubmissionSpeaker {
            code: "SPK1".to_owned(),
            name: "Ada".to_owned(),
            biography: None,
            avatar_url: None,
        }
    }

    fn submission(title: Option<&str>) -> Submission {
        Submission {
            code: "ABC".to_owned(),
            title: title.map(str::to_owned),
            abstract_text: None,
            description: None,
            state: State::Confirmed,
            speakers: vec![speaker()],
            slots: vec![Slot {
                room: Some(LocalizedString::Plain("Main Hall".to_owned())),
                start: None,
                end: None,
            }],
            track: None,
            submission_type: None,
            duration: None,
            image: None,
        }
    }

    #[test]
    fn missing_title_is_not_importable() {
        let report = validate(&submission(None), false);
        assert!(!report.importable);
        assert!(report.issues.contains(&ValidationIssue::MissingTitle));
    }

    #[test]
    fn title_at_the_boundary_has_no_issue() {
        let long = "x".repeat(250);
        let report = validate(&submission(Some(&long)), false);
        assert!(report.importable);
        assert!(report.issues.is_empty());

        let too_long = "x".repeat(251);
        let report = validate(&submission(Some(&too_long)), false);
        assert!(report.importable, "long titles are truncated, not rejected");
        assert!(report
            .issues
            .contains(&ValidationIssue::TitleTooLong { chars: 251 }));
    }

    #[test]
    fn speakerless_lightning_talk_is_exempt() {
        let mut sub = submission(Some("Quick tips"));
        sub.speakers.clear();
        sub.submission_type = Some(LocalizedString::Plain("Lightning Talks".to_owned()));
        let report = validate(&sub, false);
        assert!(report.importable);
        assert!(report
            .issues
            .contains(&ValidationIssue::NoSpeakers { exempt: true }));
    }

    #[test]
    fn speakerless_regular_talk_needs_the_permissive_setting() {
        let mut sub = submission(Some("A talk"));
        sub.speakers.clear();
        sub.submission_type = Some(LocalizedString::Plain("Talk".to_owned()));

        let strict = validate(&sub, false);
        assert!(!strict.importable);

        let permissive = validate(&sub, true);
        assert!(permissive.importable);
        assert!(permissive
            .issues
            .contains(&ValidationIssue::NoSpeakers { exempt: false }));
    }

    #[test]
    fn missing_room_warns_but_does_not_block() {
        let mut sub = submission(Some("A talk"));
        sub.slots.clear();
        let report = validate(&sub, false);
        assert!(report.importable);
        assert!(report.issues.contains(&ValidationIssue::NoRoom));
    }

    #[test]
    fn checks_run_independently() {
        // No title AND no speakers: both issues present.
        let mut sub = submission(None);
        sub.speakers.clear();
        let report = validate(&sub, false);
        assert!(!report.importable);
        assert!(report.issues.contains(&ValidationIssue::MissingTitle));
        assert!(report
            .issues
            .iter()
            .any(|i| matches!(i, ValidationIssue::NoSpeakers { .. })));
    }
}
