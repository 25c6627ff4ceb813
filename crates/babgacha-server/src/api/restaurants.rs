//! Handlers for the restaurant catalog.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use babgacha_db::restaurants::{self, NewRestaurant};

use super::{data, list, map_db_error, ApiError, AppState};

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 200;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    category: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
}

pub async fn list_restaurants(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);
    let category = params.category.as_deref().filter(|c| !c.trim().is_empty());

    let rows = restaurants::list_restaurants(&state.pool, category, limit, offset)
        .await
        .map_err(|e| map_db_error(&e))?;

    Ok(list(rows))
}

pub async fn get_restaurant(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let row = restaurants::get_restaurant(&state.pool, id)
        .await
        .map_err(|e| map_db_error(&e))?
        .ok_or_else(|| ApiError::not_found("restaurant not found"))?;

    Ok(data(row))
}

pub async fn random_restaurant(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let row = restaurants::random_restaurant(&state.pool)
        .await
        .map_err(|e| map_db_error(&e))?
        .ok_or_else(|| ApiError::not_found("no active restaurants to pick from"))?;

    Ok(data(row))
}

pub async fn restaurant_stats(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = restaurants::list_restaurant_stats(&state.pool)
        .await
        .map_err(|e| map_db_error(&e))?;

    Ok(list(rows))
}

/// Create payload. Required fields are `Option` so that missing values
/// produce a 400 with a message instead of a body-rejection error.
#[derive(Debug, Deserialize)]
pub struct CreateRestaurant {
    name: Option<String>,
    emoji: Option<String>,
    category: Option<String>,
    sub_category: Option<String>,
    description: Option<String>,
    address: Option<String>,
    phone: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    price_range: Option<String>,
    average_price: Option<Decimal>,
    opening_hours: Option<String>,
    image_url: Option<String>,
}

pub async fn create_restaurant(
    State(state): State<AppState>,
    Json(payload): Json<CreateRestaurant>,
) -> Result<impl IntoResponse, ApiError> {
    let name = payload
        .name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::bad_request("name is required"))?
        .to_string();
    let category = payload
        .category
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::bad_request("category is required"))?
        .to_string();

    let new = NewRestaurant {
        name,
        emoji: payload.emoji.unwrap_or_else(|| "🍽️".to_string()),
        category,
        sub_category: payload.sub_category,
        description: payload.description,
        address: payload.address,
        phone: payload.phone,
        latitude: payload.latitude,
        longitude: payload.longitude,
        price_range: payload.price_range,
        average_price: payload.average_price,
        opening_hours: payload.opening_hours,
        image_url: payload.image_url,
    };

    let row = restaurants::insert_restaurant(&state.pool, &new)
        .await
        .map_err(|e| map_db_error(&e))?;

    tracing::info!(restaurant_id = %row.id, name = %row.name, "restaurant created");
    Ok((StatusCode::CREATED, data(row)))
}
