//! Naver Local Search integration: typed HTTP client plus the
//! normalization pipeline that turns raw search hits into restaurant
//! records the rest of the app consumes.
//!
//! The pipeline runs query construction → size-capped paginated calls →
//! deduplication → normalization (tag stripping, category parsing,
//! coordinate conversion) → truncation to the requested count.

mod client;
mod coords;
mod dedup;
mod error;
mod normalize;
mod search;
mod types;

pub use client::{LocalSearchClient, SortOrder, MAX_DISPLAY};
pub use coords::{convert_map_coordinates, Coordinates, ProjectedRaw};
pub use dedup::dedup_by_name_address;
pub use error::{NaverError, SearchError};
pub use normalize::{normalize_restaurant, parse_category, strip_html_tags, Category, NormalizedRestaurant};
pub use search::{search_nearby, NearbySearch, DEFAULT_CATEGORY_LABEL, MAX_RESULTS};
pub use types::{LocalSearchResponse, RawSearchItem};
