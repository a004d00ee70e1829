//! The `import` command: one-way sync of talks and speakers from a Pretalx
//! event into the local database, with optional social-card generation.

mod context;
mod events;
mod images;
mod rooms;
mod runner;
mod speakers;
mod talks;

use clap::{Args, ValueEnum};
use sqlx::PgPool;
use talksync_cards::CardFormat;
use talksync_core::AppConfig;

/// Output format for generated talk cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ImageFormatArg {
    Webp,
    #[value(alias = "jpg")]
    Jpeg,
}

impl From<ImageFormatArg> for CardFormat {
    fn from(value: ImageFormatArg) -> Self {
        match value {
            ImageFormatArg::Webp => Self::Webp,
            ImageFormatArg::Jpeg => Self::Jpeg,
        }
    }
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Event slug on the Pretalx side (derived from the event URL if omitted)
    #[arg(long)]
    pub event_slug: Option<String>,

    /// Display name used when creating a new event row
    #[arg(long)]
    pub event_name: Option<String>,

    /// Full Pretalx event URL, e.g. https://pretalx.com/pycon-2026
    #[arg(long)]
    pub pretalx_event_url: Option<String>,

    /// API token for the Pretalx API
    #[arg(long, env = "TALKSYNC_PRETALX_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Simulate the import without saving to the database
    #[arg(long)]
    pub dry_run: bool,

    /// Skip updating existing talks and speakers
    #[arg(long)]
    pub no_update: bool,

    /// Skip generating/updating talk social images
    #[arg(long)]
    pub skip_images: bool,

    /// Output format for generated talk images
    #[arg(long, value_enum, default_value_t = ImageFormatArg::Webp)]
    pub image_format: ImageFormatArg,

    /// Total attempts per API request, first try included
    /// (defaults to TALKSYNC_MAX_ATTEMPTS)
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Output detail from 0 (silent) to 4 (trace)
    #[arg(short, long, default_value_t = 1)]
    pub verbosity: u8,
}

/// Runs the import end to end.
///
/// # Errors
///
/// Returns an error when the event cannot be resolved, the API fetch fails
/// after retries, card generation is misconfigured, or a database operation
/// outside the per-submission loop fails.
pub async fn run(pool: &PgPool, config: &AppConfig, args: &ImportArgs) -> anyhow::Result<()> {
    runner::run_import(pool, config, args).await
}
