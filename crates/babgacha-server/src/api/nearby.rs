//! Handler for the Naver-backed nearby restaurant search.

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use babgacha_naver::{search_nearby, NormalizedRestaurant, SearchError, MAX_RESULTS};

use super::{ApiError, AppState};

const SEARCH_SOURCE: &str = "naver_local_search";

#[derive(Debug, Deserialize)]
pub struct NearbyParams {
    location: Option<String>,
    category: Option<String>,
    count: Option<u32>,
    // Present when the client sends raw geolocation instead of a place name.
    latitude: Option<f64>,
    longitude: Option<f64>,
}

#[derive(Debug, Serialize)]
struct NearbyResponse {
    success: bool,
    data: Vec<NormalizedRestaurant>,
    meta: NearbyMeta,
}

#[derive(Debug, Serialize)]
struct NearbyMeta {
    total: usize,
    location: String,
    category: String,
    source: &'static str,
}

pub async fn nearby_restaurants(
    State(state): State<AppState>,
    Query(params): Query<NearbyParams>,
) -> Result<impl IntoResponse, ApiError> {
    let location = params
        .location
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let Some(location) = location else {
        let hint = if params.latitude.is_some() || params.longitude.is_some() {
            "location is required; raw coordinates are not accepted, send a place name like 강남역"
        } else {
            "location query parameter is required, e.g. ?location=강남역"
        };
        return Err(ApiError::bad_request(hint));
    };

    let Some(client) = state.search.as_deref() else {
        return Err(ApiError::service_unavailable(
            "nearby search is not configured on this server",
            "NAVER_API_CONFIG_ERROR",
        ));
    };

    let category = params.category.as_deref().map(str::trim).unwrap_or("");
    let count = params.count.unwrap_or(MAX_RESULTS);

    let result = search_nearby(client, location, category, count)
        .await
        .map_err(|e| match e {
            SearchError::MissingLocation => {
                ApiError::bad_request("location query parameter is required, e.g. ?location=강남역")
            }
            SearchError::Upstream(source) => {
                tracing::error!(error = %source, "local search upstream call failed");
                ApiError::bad_gateway(
                    "failed to fetch nearby restaurants",
                    "NAVER_API_ERROR",
                )
            }
        })?;

    tracing::debug!(
        location = %result.location,
        category = %result.category,
        total = result.total,
        "nearby search completed"
    );
    Ok(Json(NearbyResponse {
        success: true,
        meta: NearbyMeta {
            total: result.total,
            location: result.location,
            category: result.category,
            source: SEARCH_SOURCE,
        },
        data: result.restaurants,
    }))
}
