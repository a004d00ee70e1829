//! HTTP client for the Pretalx submissions endpoint.
//!
//! Drives the paginated `results`/`next` listing with per-request throttling
//! and exponential-backoff retry. Typed status handling: 5xx and 429 are
//! retried, other non-2xx statuses are returned as
//! [`PretalxError::UnexpectedStatus`] immediately.

use std::path::Path;
use std::time::Duration;

use reqwest::Client;

use crate::cache;
use crate::error::PretalxError;
use crate::retry::retry_with_backoff;
use crate::throttle::Throttle;
use crate::types::{EventDetails, Submission, SubmissionsPage};

/// Maximum number of pages to follow before returning an error.
/// Prevents infinite loops on a cycling `next` cursor.
///
/// Note: each page request may itself be retried up to `max_attempts` times,
/// so the worst-case request count is `MAX_PAGES * max_attempts`.
const MAX_PAGES: usize = 200;

/// Page size requested from the API.
const PAGE_LIMIT: u32 = 50;

pub struct PretalxClient {
    client: Client,
    /// Instance base URL without trailing slash, e.g. `https://pretalx.com`.
    base_url: String,
    /// Total attempts per page request (first try included).
    max_attempts: u32,
    backoff_base_secs: u64,
    throttle: Throttle,
}

impl PretalxClient {
    /// Creates a client with token auth, timeout, retry policy, and
    /// outbound throttling.
    ///
    /// `max_attempts` is the total number of tries per page request;
    /// `calls_per_second` caps the outbound request rate (0 disables
    /// throttling, useful in tests).
    ///
    /// # Errors
    ///
    /// Returns [`PretalxError::InvalidBaseUrl`] for a base URL without an
    /// http(s) scheme, or [`PretalxError::Http`] if the underlying
    /// `reqwest::Client` cannot be constructed.
    pub fn new(
        base_url: &str,
        api_token: Option<&str>,
        timeout_secs: u64,
        max_attempts: u32,
        backoff_base_secs: u64,
        calls_per_second: u32,
    ) -> Result<Self, PretalxError> {
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(PretalxError::InvalidBaseUrl {
                url: base_url.to_owned(),
                reason: "expected an http:// or https:// URL".to_owned(),
            });
        }

        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(token) = api_token {
            if let Ok(mut value) =
                reqwest::header::HeaderValue::from_str(&format!("Token {token}"))
            {
                value.set_sensitive(true);
                headers.insert(reqwest::header::AUTHORIZATION, value);
            }
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .default_headers(headers)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            max_attempts,
            backoff_base_secs,
            throttle: Throttle::new(calls_per_second),
        })
    }

    /// Fetches the full submission set for `event_slug`.
    ///
    /// Returns the upstream total count and every submission across all
    /// pages, in listing order.
    ///
    /// # Errors
    ///
    /// - [`PretalxError::Http`] — network failure after all retries.
    /// - [`PretalxError::UnexpectedStatus`] — non-2xx status (5xx/429
    ///   retried first, other 4xx immediate).
    /// - [`PretalxError::Deserialize`] — unparseable page after all retries.
    /// - [`PretalxError::PaginationLimit`] — `next` cursor never ended.
    pub async fn fetch_submissions(
        &self,
        event_slug: &str,
    ) -> Result<(i64, Vec<Submission>), PretalxError> {
        let mut url = format!(
            "{}/api/events/{event_slug}/submissions/?limit={PAGE_LIMIT}",
            self.base_url
        );
        let mut submissions = Vec::new();
        let mut count = 0i64;

        for _ in 0..MAX_PAGES {
            let page = self.fetch_page(&url, event_slug).await?;
            count = page.count;
            submissions.extend(page.results);
            match page.next {
                Some(next) => url = next,
                None => return Ok((count, submissions)),
            }
        }

        Err(PretalxError::PaginationLimit {
            pages: MAX_PAGES,
            event: event_slug.to_owned(),
        })
    }

    /// Like [`fetch_submissions`](Self::fetch_submissions), but serves from
    /// the on-disk snapshot at `snapshot_path` when present, and persists a
    /// fresh fetch there for the next run. Local development only — snapshot
    /// write failures are logged and do not fail the fetch.
    pub async fn fetch_submissions_cached(
        &self,
        event_slug: &str,
        snapshot_path: &Path,
    ) -> Result<(i64, Vec<Submission>), PretalxError> {
        if let Some(snapshot) = cache::load(snapshot_path) {
            tracing::info!(path = %snapshot_path.display(), "using submissions snapshot");
            return Ok(snapshot);
        }
        let result = self.fetch_submissions(event_slug).await?;
        cache::store(snapshot_path, &result);
        Ok(result)
    }

    /// Fetches event metadata for `event_slug`, with the same throttling and
    /// retry policy as submission pages.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`fetch_submissions`](Self::fetch_submissions),
    /// minus pagination.
    pub async fn fetch_event(&self, event_slug: &str) -> Result<EventDetails, PretalxError> {
        let url = format!("{}/api/events/{event_slug}/", self.base_url);
        self.throttle.acquire().await;
        retry_with_backoff(self.max_attempts, self.backoff_base_secs, || {
            let url = url.as_str();
            async move {
                let response = self
                    .client
                    .get(url)
                    .header(reqwest::header::ACCEPT, "application/json")
                    .send()
                    .await?;
                let status = response.status();

                if !status.is_success() {
                    return Err(PretalxError::UnexpectedStatus {
                        status: status.as_u16(),
                        url: url.to_owned(),
                    });
                }

                let body = response.text().await?;
                serde_json::from_str::<EventDetails>(&body).map_err(|e| {
                    PretalxError::Deserialize {
                        context: format!("event details for {event_slug}"),
                        source: e,
                    }
                })
            }
        })
        .await
    }

    async fn fetch_page(
        &self,
        url: &str,
        event_slug: &str,
    ) -> Result<SubmissionsPage, PretalxError> {
        self.throttle.acquire().await;
        retry_with_backoff(self.max_attempts, self.backoff_base_secs, || async move {
            let response = self
                .client
                .get(url)
                .header(reqwest::header::ACCEPT, "application/json")
                .send()
                .await?;
            let status = response.status();

            if !status.is_success() {
                return Err(PretalxError::UnexpectedStatus {
                    status: status.as_u16(),
                    url: url.to_owned(),
                });
            }

            let body = response.text().await?;
            serde_json::from_str::<SubmissionsPage>(&body).map_err(|e| {
                PretalxError::Deserialize {
                    context: format!("submissions page for event {event_slug}"),
                    source: e,
                }
            })
        })
        .await
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
