//! On-disk snapshot of the last fetched submission set.
//!
//! Serialized as JSON next to the working directory. Strictly a local
//! development convenience to avoid hammering the API between runs; both
//! read and write failures degrade to a live fetch.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::Submission;

#[derive(Serialize, Deserialize)]
struct Snapshot {
    count: i64,
    submissions: Vec<Submission>,
}

/// Reads a previously stored snapshot. Any read or parse failure returns
/// `None` so the caller falls back to a live fetch.
pub(crate) fn load(path: &Path) -> Option<(i64, Vec<Submission>)> {
    let raw = fs::read(path).ok()?;
    match serde_json::from_slice::<Snapshot>(&raw) {
        Ok(snapshot) => Some((snapshot.count, snapshot.submissions)),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "ignoring unreadable submissions snapshot");
            None
        }
    }
}

/// Best-effort persist of a fetched submission set. Failures are logged and
/// swallowed — the live result is still returned to the caller.
pub(crate) fn store(path: &Path, result: &(i64, Vec<Submission>)) {
    let snapshot = Snapshot {
        count: result.0,
        submissions: result.1.clone(),
    };
    let write = serde_json::to_vec(&snapshot)
        .map_err(std::io::Error::other)
        .and_then(|bytes| fs::write(path, bytes));
    if let Err(err) = write {
        tracing::warn!(path = %path.display(), error = %err, "failed to store submissions snapshot");
    }
}
