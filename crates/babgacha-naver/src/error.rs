use thiserror::Error;

/// Errors returned by the Naver Local Search API client.
#[derive(Debug, Error)]
pub enum NaverError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-2xx status.
    #[error("Naver API call failed: {status} - {body}")]
    Status { status: u16, body: String },

    /// The response body could not be deserialized into the expected shape.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors from the nearby-restaurant search orchestrator.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Required `location` input was empty or absent. Surfaced before any
    /// upstream call is made.
    #[error("location is required")]
    MissingLocation,

    /// The first page call failed; nothing was aggregated. Later-page
    /// failures never reach this variant — they fail-stop with partial
    /// results instead.
    #[error(transparent)]
    Upstream(#[from] NaverError),
}
