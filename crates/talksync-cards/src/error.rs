use std::path::PathBuf;

use thiserror::Error;

/// Errors from card generation.
///
/// Font problems are deliberately fatal: without the configured font the
/// title block cannot be rendered or measured, so the pipeline surfaces the
/// misconfiguration instead of silently skipping images.
#[derive(Debug, Error)]
pub enum CardError {
    #[error("card font is not configured or does not exist: {path:?}")]
    FontMissing { path: Option<PathBuf> },

    #[error("failed to load card font from {path}: not a valid font file")]
    FontInvalid { path: PathBuf },

    #[error("failed to load card template {path}: {source}")]
    Template {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to encode card as {format}: {reason}")]
    Encode { format: &'static str, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
