//! Client for the Pretalx submissions API.
//!
//! Wraps the upstream REST API with token auth, request throttling,
//! exponential-backoff retry, and an optional on-disk snapshot for local
//! development. Also hosts the submission extractor ([`SubmissionData`]) and
//! the import validator ([`validation`]), which are pure functions over the
//! typed payloads in [`types`].

pub mod cache;
pub mod client;
pub mod error;
mod retry;
pub mod submission;
mod throttle;
pub mod types;
pub mod validation;

pub use client::PretalxClient;
pub use error::PretalxError;
pub use submission::{is_announcement, is_lightning_talk, SubmissionData};
pub use types::{EventDetails, LocalizedString, Slot, State, Submission, SubmissionSpeaker};
pub use validation::{validate, ValidationIssue, ValidationReport};
