//! Normalization of raw Naver search items into restaurant records.
//!
//! Pure functions, no I/O. Every field of [`NormalizedRestaurant`] is total:
//! absent upstream values become empty strings at construction, so no
//! downstream consumer ever branches on a missing field.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::coords::{convert_map_coordinates, Coordinates};
use crate::types::RawSearchItem;

/// Fallback main category when the upstream category string is absent.
pub(crate) const DEFAULT_MAIN_CATEGORY: &str = "음식점";

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

/// Structured category parsed from Naver's `>`-delimited path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub main: String,
    pub sub: String,
    pub detail: String,
    /// Original upstream string; absent when the input was empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

/// A restaurant record after the normalization pipeline.
///
/// Constructed fresh per search call and never mutated afterwards. Has no
/// persistence identity; storing one as a restaurant row is a separate
/// write path with its own generated id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRestaurant {
    pub name: String,
    pub address: String,
    #[serde(rename = "roadAddress")]
    pub road_address: String,
    pub category: Category,
    pub telephone: String,
    pub description: String,
    pub link: String,
    pub mapx: String,
    pub mapy: String,
    pub coordinates: Option<Coordinates>,
}

/// Removes all HTML tags from a string and trims surrounding whitespace.
#[must_use]
pub fn strip_html_tags(raw: &str) -> String {
    TAG_RE.replace_all(raw, "").trim().to_string()
}

/// Parses a `>`-delimited category path such as `"음식점>한식>삼겹살"`.
///
/// Segments are trimmed individually; missing segments default to the
/// fallback main category / empty strings.
#[must_use]
pub fn parse_category(raw: &str) -> Category {
    if raw.is_empty() {
        return Category {
            main: DEFAULT_MAIN_CATEGORY.to_string(),
            sub: String::new(),
            detail: String::new(),
            raw: None,
        };
    }

    let mut parts = raw.split('>').map(str::trim);
    let main = parts
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_MAIN_CATEGORY);
    let sub = parts.next().unwrap_or("");
    let detail = parts.next().unwrap_or("");

    Category {
        main: main.to_string(),
        sub: sub.to_string(),
        detail: detail.to_string(),
        raw: Some(raw.to_string()),
    }
}

/// Converts one [`RawSearchItem`] into a [`NormalizedRestaurant`].
///
/// Strips tags from title and description, parses the category path, and
/// runs the coordinate transform. Never fails: bad coordinates surface as
/// `coordinates: None` or an out-of-range sentinel, not as an error.
#[must_use]
pub fn normalize_restaurant(item: &RawSearchItem) -> NormalizedRestaurant {
    NormalizedRestaurant {
        name: strip_html_tags(&item.title),
        address: item.address.clone(),
        road_address: item.road_address.clone(),
        category: parse_category(&item.category),
        telephone: item.telephone.clone(),
        description: strip_html_tags(&item.description),
        link: item.link.clone(),
        mapx: item.mapx.clone(),
        mapy: item.mapy.clone(),
        coordinates: convert_map_coordinates(&item.mapx, &item.mapy),
    }
}
