//! Paginated nearby-restaurant search over the Naver Local Search API.
//!
//! The upstream endpoint caps each call at [`MAX_DISPLAY`] items, so a
//! larger requested count is satisfied by sequential size-capped pages.
//! Pages are never fetched concurrently: the fail-stop policy needs an
//! ordering — a first-page failure propagates, while a later-page failure
//! stops further calls and returns whatever aggregated so far.

use serde::Serialize;

use crate::client::{LocalSearchClient, SortOrder, MAX_DISPLAY};
use crate::dedup::dedup_by_name_address;
use crate::error::SearchError;
use crate::normalize::{normalize_restaurant, NormalizedRestaurant};
use crate::types::RawSearchItem;

/// Overall cap on a single nearby search, regardless of the requested count.
pub const MAX_RESULTS: u32 = 10;

/// Category label reported when the caller did not filter by category.
pub const DEFAULT_CATEGORY_LABEL: &str = "전체";

/// Result envelope for one nearby search.
#[derive(Debug, Clone, Serialize)]
pub struct NearbySearch {
    pub total: usize,
    pub location: String,
    pub category: String,
    pub restaurants: Vec<NormalizedRestaurant>,
}

/// Searches for restaurants near `location`, optionally filtered by a food
/// `category`, returning at most `min(count, 10)` normalized records.
///
/// The query term appends a generic "good restaurants" suffix to bias the
/// local search toward food venues, and pages are requested in comment
/// (review-count) order so well-reviewed places surface first.
///
/// # Errors
///
/// - [`SearchError::MissingLocation`] if `location` is empty.
/// - [`SearchError::Upstream`] if the **first** page call fails. Failures
///   on later pages are logged and swallowed; partial results are
///   preferred over total failure once one page has succeeded.
pub async fn search_nearby(
    client: &LocalSearchClient,
    location: &str,
    category: &str,
    count: u32,
) -> Result<NearbySearch, SearchError> {
    let location = location.trim();
    if location.is_empty() {
        return Err(SearchError::MissingLocation);
    }

    let search_term = if category.is_empty() {
        format!("{location} 맛집")
    } else {
        format!("{location} {category} 맛집")
    };

    let effective_count = count.clamp(1, MAX_RESULTS);
    let pages_needed = effective_count.div_ceil(MAX_DISPLAY);

    let mut raw_items: Vec<RawSearchItem> = Vec::new();
    for page in 0..pages_needed {
        let start = page * MAX_DISPLAY + 1;
        match client
            .search_local(&search_term, MAX_DISPLAY, start, SortOrder::Comment)
            .await
        {
            Ok(response) => raw_items.extend(response.items),
            Err(err) if page == 0 => return Err(SearchError::Upstream(err)),
            Err(err) => {
                tracing::warn!(
                    page = page + 1,
                    start,
                    error = %err,
                    "follow-up search page failed; returning partial results"
                );
                break;
            }
        }
    }

    let restaurants: Vec<NormalizedRestaurant> = dedup_by_name_address(raw_items)
        .iter()
        .take(effective_count as usize)
        .map(normalize_restaurant)
        .collect();

    Ok(NearbySearch {
        total: restaurants.len(),
        location: location.to_string(),
        category: if category.is_empty() {
            DEFAULT_CATEGORY_LABEL.to_string()
        } else {
            category.to_string()
        },
        restaurants,
    })
}
