use thiserror::Error;

/// Errors returned by the Pretalx API client.
#[derive(Debug, Error)]
pub enum PretalxError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx status that is not handled elsewhere (5xx retried, 4xx not).
    #[error("unexpected status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The response body could not be deserialized into the expected type.
    /// Treated as transient: the API intermittently serves truncated pages.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The configured base URL cannot be combined into a request URL.
    #[error("invalid Pretalx base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// Pagination cursor kept advancing past the page guard.
    #[error("pagination exceeded {pages} pages for event {event}")]
    PaginationLimit { pages: usize, event: String },
}
