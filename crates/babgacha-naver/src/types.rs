//! Naver Local Search API response types.
//!
//! Field shapes follow the `v1/search/local.json` endpoint. Every string
//! field defaults to empty on absence so downstream normalization never
//! branches on missing keys.

use serde::Deserialize;

/// Top-level response from the local search endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct LocalSearchResponse {
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub start: u32,
    #[serde(default)]
    pub display: u32,
    #[serde(default)]
    pub items: Vec<RawSearchItem>,
}

/// One raw place listing as returned by the API.
///
/// `title` and `description` may carry HTML tags (`<b>…</b>` around match
/// highlights); `category` is a `>`-delimited path such as
/// `"음식점>한식>삼겹살"`; `mapx`/`mapy` are projected coordinates scaled
/// by 10, serialized as decimal strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSearchItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub telephone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default, rename = "roadAddress")]
    pub road_address: String,
    #[serde(default)]
    pub mapx: String,
    #[serde(default)]
    pub mapy: String,
}
