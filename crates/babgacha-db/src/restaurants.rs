//! Database operations for the `restaurants` table and its stats view.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `restaurants` table.
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct RestaurantRow {
    pub id: Uuid,
    pub name: String,
    pub emoji: String,
    pub category: String,
    pub sub_category: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub price_range: Option<String>,
    pub average_price: Option<Decimal>,
    pub opening_hours: Option<String>,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row from the `restaurant_stats` view.
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct RestaurantStatsRow {
    pub category: String,
    pub restaurant_count: i64,
    pub with_coordinates: i64,
    pub avg_price: Option<Decimal>,
}

/// Insert payload for a new restaurant.
#[derive(Debug, Clone)]
pub struct NewRestaurant {
    pub name: String,
    pub emoji: String,
    pub category: String,
    pub sub_category: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub price_range: Option<String>,
    pub average_price: Option<Decimal>,
    pub opening_hours: Option<String>,
    pub image_url: Option<String>,
}

/// Lists active restaurants, newest first, with an optional category filter.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_restaurants(
    pool: &PgPool,
    category: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<RestaurantRow>, DbError> {
    let rows = sqlx::query_as::<_, RestaurantRow>(
        "SELECT * FROM restaurants \
         WHERE is_active AND ($1::text IS NULL OR category = $1) \
         ORDER BY created_at DESC \
         LIMIT $2 OFFSET $3",
    )
    .bind(category)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Fetches one active restaurant by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_restaurant(pool: &PgPool, id: Uuid) -> Result<Option<RestaurantRow>, DbError> {
    let row = sqlx::query_as::<_, RestaurantRow>(
        "SELECT * FROM restaurants WHERE id = $1 AND is_active",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Draws one active restaurant uniformly at random (the gacha pool source).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn random_restaurant(pool: &PgPool) -> Result<Option<RestaurantRow>, DbError> {
    let row = sqlx::query_as::<_, RestaurantRow>(
        "SELECT * FROM restaurants WHERE is_active ORDER BY random() LIMIT 1",
    )
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Inserts a restaurant and returns the stored row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_restaurant(
    pool: &PgPool,
    new: &NewRestaurant,
) -> Result<RestaurantRow, DbError> {
    let row = sqlx::query_as::<_, RestaurantRow>(
        "INSERT INTO restaurants \
             (name, emoji, category, sub_category, description, address, phone, \
              latitude, longitude, price_range, average_price, opening_hours, image_url) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
         RETURNING *",
    )
    .bind(&new.name)
    .bind(&new.emoji)
    .bind(&new.category)
    .bind(&new.sub_category)
    .bind(&new.description)
    .bind(&new.address)
    .bind(&new.phone)
    .bind(new.latitude)
    .bind(new.longitude)
    .bind(&new.price_range)
    .bind(new.average_price)
    .bind(&new.opening_hours)
    .bind(&new.image_url)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Reads the per-category stats view.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_restaurant_stats(pool: &PgPool) -> Result<Vec<RestaurantStatsRow>, DbError> {
    let rows = sqlx::query_as::<_, RestaurantStatsRow>(
        "SELECT category, restaurant_count, with_coordinates, avg_price \
         FROM restaurant_stats ORDER BY restaurant_count DESC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
