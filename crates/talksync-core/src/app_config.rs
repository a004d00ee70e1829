//! Runtime configuration read from `TALKSYNC_*` environment variables.

use std::env;
use std::path::PathBuf;

const DEFAULT_BASE_URL: &str = "https://pretalx.com";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CALLS_PER_SECOND: u32 = 2;
const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_PREFETCH_CONCURRENCY: usize = 8;
const DEFAULT_MEDIA_ROOT: &str = "media";
const DEFAULT_ASSETS_DIR: &str = "assets/img";
const DEFAULT_SNAPSHOT_PATH: &str = ".pretalx_cache.json";

#[derive(Clone)]
pub struct AppConfig {
    /// Base URL of the Pretalx instance, no trailing slash.
    pub pretalx_base_url: String,
    pub pretalx_api_token: Option<String>,
    pub request_timeout_secs: u64,
    pub calls_per_second: u32,
    pub max_attempts: u32,
    /// Allow importing submissions that have no speakers and are neither
    /// lightning talks nor announcements.
    pub import_talks_without_speakers: bool,
    /// Use the on-disk submissions snapshot instead of hitting the API on
    /// every run. Local development only.
    pub snapshot_submissions: bool,
    pub snapshot_path: PathBuf,
    pub prefetch_concurrency: usize,
    /// Directory for generated card images and the avatar disk cache.
    pub media_root: PathBuf,
    /// Directory holding `{event_slug}/talk_template.png` card templates.
    pub assets_dir: PathBuf,
    /// TrueType font used for card titles and speaker names. Card generation
    /// refuses to run without it.
    pub card_font: Option<PathBuf>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("pretalx_base_url", &self.pretalx_base_url)
            .field(
                "pretalx_api_token",
                &self.pretalx_api_token.as_ref().map(|_| "[redacted]"),
            )
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("calls_per_second", &self.calls_per_second)
            .field("max_attempts", &self.max_attempts)
            .field(
                "import_talks_without_speakers",
                &self.import_talks_without_speakers,
            )
            .field("snapshot_submissions", &self.snapshot_submissions)
            .field("snapshot_path", &self.snapshot_path)
            .field("prefetch_concurrency", &self.prefetch_concurrency)
            .field("media_root", &self.media_root)
            .field("assets_dir", &self.assets_dir)
            .field("card_font", &self.card_font)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            pretalx_base_url: DEFAULT_BASE_URL.to_owned(),
            pretalx_api_token: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            calls_per_second: DEFAULT_CALLS_PER_SECOND,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            import_talks_without_speakers: false,
            snapshot_submissions: false,
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_PATH),
            prefetch_concurrency: DEFAULT_PREFETCH_CONCURRENCY,
            media_root: PathBuf::from(DEFAULT_MEDIA_ROOT),
            assets_dir: PathBuf::from(DEFAULT_ASSETS_DIR),
            card_font: None,
        }
    }
}

impl AppConfig {
    /// Build a config from the process environment, falling back to defaults
    /// for anything unset or unparseable.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            pretalx_base_url: read_string("TALKSYNC_PRETALX_BASE_URL", DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_owned(),
            pretalx_api_token: env::var("TALKSYNC_PRETALX_API_TOKEN").ok(),
            request_timeout_secs: read_u64(
                "TALKSYNC_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            ),
            calls_per_second: read_u32("TALKSYNC_CALLS_PER_SECOND", DEFAULT_CALLS_PER_SECOND),
            max_attempts: read_u32("TALKSYNC_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS),
            import_talks_without_speakers: read_bool("TALKSYNC_IMPORT_TALKS_WITHOUT_SPEAKERS"),
            snapshot_submissions: read_bool("TALKSYNC_SNAPSHOT_SUBMISSIONS"),
            snapshot_path: read_path("TALKSYNC_SNAPSHOT_PATH", DEFAULT_SNAPSHOT_PATH),
            prefetch_concurrency: read_usize(
                "TALKSYNC_PREFETCH_CONCURRENCY",
                DEFAULT_PREFETCH_CONCURRENCY,
            ),
            media_root: read_path("TALKSYNC_MEDIA_ROOT", DEFAULT_MEDIA_ROOT),
            assets_dir: read_path("TALKSYNC_ASSETS_DIR", DEFAULT_ASSETS_DIR),
            card_font: env::var("TALKSYNC_CARD_FONT").ok().map(PathBuf::from),
        }
    }
}

fn read_string(var: &str, default: &str) -> String {
    env::var(var).unwrap_or_else(|_| default.to_owned())
}

fn read_path(var: &str, default: &str) -> PathBuf {
    env::var(var).map_or_else(|_| PathBuf::from(default), PathBuf::from)
}

fn read_u32(var: &str, default: u32) -> u32 {
    env::var(var)
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(default)
}

fn read_u64(var: &str, default: u64) -> u64 {
    env::var(var)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn read_usize(var: &str, default: usize) -> usize {
    env::var(var)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
}

fn read_bool(var: &str) -> bool {
    env::var(var)
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}
