//! Shared, read-only context threaded through the import pipeline.

use talksync_cards::CardFormat;

/// How chatty the import run is. Levels are cumulative; `--verbosity 0`
/// silences everything but the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum VerbosityLevel {
    Minimal,
    Normal,
    Detailed,
    Debug,
    Trace,
}

impl From<u8> for VerbosityLevel {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Minimal,
            1 => Self::Normal,
            2 => Self::Detailed,
            3 => Self::Debug,
            _ => Self::Trace,
        }
    }
}

/// Rendering of a log line; errors go to stderr, everything else to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStyle {
    Plain,
    Success,
    Warning,
    Error,
}

/// Run-scoped flags and event identity, fixed once the event is resolved.
#[derive(Debug, Clone)]
pub struct ImportContext {
    pub verbosity: VerbosityLevel,
    pub dry_run: bool,
    pub no_update: bool,
    pub skip_images: bool,
    pub image_format: CardFormat,
    /// Pretalx API base URL, no trailing slash.
    pub base_url: String,
    /// Event slug on the Pretalx side.
    pub event_slug: String,
    /// Display name supplied on the command line; may be empty.
    pub event_name: String,
    /// Full event URL used to build talk links.
    pub pretalx_event_url: String,
    /// Local `events` row id; `None` in dry-run when the event does not
    /// exist yet.
    pub event_id: Option<i64>,
}

impl ImportContext {
    /// Emits `message` when the run's verbosity is at least `min_level`.
    pub fn log(&self, message: &str, min_level: VerbosityLevel, style: LogStyle) {
        if self.verbosity < min_level {
            return;
        }
        match style {
            LogStyle::Plain => println!("{message}"),
            LogStyle::Success => println!("[ok] {message}"),
            LogStyle::Warning => println!("[warn] {message}"),
            LogStyle::Error => eprintln!("[error] {message}"),
        }
    }
}
