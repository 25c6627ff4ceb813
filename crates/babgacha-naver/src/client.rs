//! HTTP client for the Naver Local Search REST API.
//!
//! Wraps `reqwest` with the two API-key headers Naver requires and typed
//! response deserialization. The endpoint caps `display` at 5 items per
//! call; larger result sets are assembled by [`crate::search_nearby`].

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Url};

use crate::error::NaverError;
use crate::types::LocalSearchResponse;

const DEFAULT_BASE_URL: &str = "https://openapi.naver.com/v1/search/local.json";

/// Hard per-call page size cap imposed by the upstream API.
pub const MAX_DISPLAY: u32 = 5;

/// Sort order for local search calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Relevance-ish default ordering.
    Random,
    /// By review/comment count, most-reviewed first.
    Comment,
}

impl SortOrder {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Random => "random",
            SortOrder::Comment => "comment",
        }
    }
}

/// Client for the Naver Local Search API.
///
/// Use [`LocalSearchClient::new`] for production or
/// [`LocalSearchClient::with_base_url`] to point at a mock server in tests.
pub struct LocalSearchClient {
    client: Client,
    base_url: Url,
}

impl LocalSearchClient {
    /// Creates a new client pointed at the production Naver API.
    ///
    /// # Errors
    ///
    /// Returns [`NaverError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`NaverError::Status`] if the credentials
    /// contain bytes that are not valid header values.
    pub fn new(
        client_id: &str,
        client_secret: &str,
        timeout_secs: u64,
    ) -> Result<Self, NaverError> {
        Self::with_base_url(client_id, client_secret, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a new client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Same as [`LocalSearchClient::new`], plus [`NaverError::Status`] if
    /// `base_url` does not parse as a URL.
    pub fn with_base_url(
        client_id: &str,
        client_secret: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, NaverError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "X-Naver-Client-Id",
            header_value(client_id, "NAVER_CLIENT_ID")?,
        );
        let mut secret = header_value(client_secret, "NAVER_CLIENT_SECRET")?;
        secret.set_sensitive(true);
        headers.insert("X-Naver-Client-Secret", secret);

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("babgacha/0.1 (restaurant-search)")
            .default_headers(headers)
            .build()?;

        let base_url = Url::parse(base_url).map_err(|e| NaverError::Status {
            status: 0,
            body: format!("invalid base URL '{base_url}': {e}"),
        })?;

        Ok(Self { client, base_url })
    }

    /// Performs one local search call.
    ///
    /// `display` is clamped to [`MAX_DISPLAY`]; `start` is the 1-based
    /// offset of the first result; `sort` selects the upstream ordering.
    ///
    /// # Errors
    ///
    /// - [`NaverError::Http`] on network failure.
    /// - [`NaverError::Status`] on a non-2xx response (body preserved for
    ///   diagnostics).
    /// - [`NaverError::Deserialize`] if the body does not match the
    ///   expected shape.
    pub async fn search_local(
        &self,
        query: &str,
        display: u32,
        start: u32,
        sort: SortOrder,
    ) -> Result<LocalSearchResponse, NaverError> {
        let url = self.build_url(query, display, start, sort);

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(NaverError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| NaverError::Deserialize {
            context: url.to_string(),
            source: e,
        })
    }

    /// Builds the request URL with percent-encoded query parameters,
    /// clamping `display` to the upstream cap.
    fn build_url(&self, query: &str, display: u32, start: u32, sort: SortOrder) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("query", query);
            pairs.append_pair("display", &display.min(MAX_DISPLAY).to_string());
            pairs.append_pair("start", &start.to_string());
            pairs.append_pair("sort", sort.as_str());
        }
        url
    }
}

fn header_value(raw: &str, what: &str) -> Result<HeaderValue, NaverError> {
    HeaderValue::from_str(raw).map_err(|e| NaverError::Status {
        status: 0,
        body: format!("{what} is not a valid header value: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(base_url: &str) -> LocalSearchClient {
        LocalSearchClient::with_base_url("test-id", "test-secret", 30, base_url)
            .expect("client construction should not fail")
    }

    #[test]
    fn build_url_constructs_correct_query_string() {
        let client = test_client("https://openapi.naver.com/v1/search/local.json");
        let url = client.build_url("강남역 맛집", 5, 1, SortOrder::Comment);
        let query = url.query().expect("query string");
        assert!(query.contains("display=5"), "query: {query}");
        assert!(query.contains("start=1"), "query: {query}");
        assert!(query.contains("sort=comment"), "query: {query}");
        // Korean query term must be percent-encoded.
        assert!(!query.contains('강'), "query should be encoded: {query}");
    }

    #[test]
    fn build_url_clamps_display_to_api_cap() {
        let client = test_client("https://openapi.naver.com/v1/search/local.json");
        let url = client.build_url("q", 50, 1, SortOrder::Random);
        assert!(
            url.query().expect("query string").contains("display=5"),
            "display must be capped at {MAX_DISPLAY}: {url}"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = LocalSearchClient::with_base_url("id", "secret", 30, "not a url");
        assert!(result.is_err());
    }

    #[test]
    fn sort_order_wire_values() {
        assert_eq!(SortOrder::Random.as_str(), "random");
        assert_eq!(SortOrder::Comment.as_str(), "comment");
    }
}
