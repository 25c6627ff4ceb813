//! Handlers for restaurant reviews and their per-restaurant summary.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{Duration, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use babgacha_db::reviews::{self, NewReview, ReviewFilter, ReviewRow, UpdateReview};

use super::{data, list, map_db_error, ApiError, AppState};

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 200;
const TOP_TAG_COUNT: usize = 5;
const RECENT_REVIEW_DAYS: i64 = 30;

fn rating_in_range(rating: Decimal) -> bool {
    rating >= Decimal::ONE && rating <= Decimal::from(5)
}

/// Whether the caller identified by the query parameters owns this review.
/// Reviews written without any identity are treated as open.
fn is_owner(row: &ReviewRow, user_id: Option<&str>, session_id: Option<&str>) -> bool {
    match (&row.user_id, &row.session_id) {
        (None, None) => true,
        (owner_user, owner_session) => {
            owner_user.as_deref().is_some_and(|o| Some(o) == user_id)
                || owner_session
                    .as_deref()
                    .is_some_and(|o| Some(o) == session_id)
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    restaurant_id: Option<Uuid>,
    user_id: Option<String>,
    session_id: Option<String>,
    include_private: Option<bool>,
    limit: Option<i64>,
    offset: Option<i64>,
}

pub async fn list_reviews(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);
    let filter = ReviewFilter {
        restaurant_id: params.restaurant_id,
        user_id: params.user_id,
        session_id: params.session_id,
        // Opt-in: identified callers may also see their own private reviews.
        include_private: params.include_private.unwrap_or(false),
        own_only: false,
    };

    let rows = reviews::list_reviews(&state.pool, &filter, limit, offset)
        .await
        .map_err(|e| map_db_error(&e))?;

    Ok(list(rows))
}

pub async fn my_reviews(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    if params.user_id.is_none() && params.session_id.is_none() {
        return Err(ApiError::bad_request(
            "user_id or session_id is required",
        ));
    }

    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);
    let filter = ReviewFilter {
        restaurant_id: params.restaurant_id,
        user_id: params.user_id,
        session_id: params.session_id,
        include_private: true,
        own_only: true,
    };

    let rows = reviews::list_reviews(&state.pool, &filter, limit, offset)
        .await
        .map_err(|e| map_db_error(&e))?;

    Ok(list(rows))
}

#[derive(Debug, Deserialize)]
pub struct IdentityParams {
    user_id: Option<String>,
    session_id: Option<String>,
}

pub async fn get_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<IdentityParams>,
) -> Result<impl IntoResponse, ApiError> {
    let row = reviews::get_review(&state.pool, id)
        .await
        .map_err(|e| map_db_error(&e))?
        .ok_or_else(|| ApiError::not_found("review not found"))?;

    if !row.is_public
        && !is_owner(&row, params.user_id.as_deref(), params.session_id.as_deref())
    {
        return Err(ApiError::forbidden("this review is private"));
    }

    Ok(data(row))
}

#[derive(Debug, Deserialize)]
pub struct CreateReview {
    restaurant_id: Option<Uuid>,
    visit_id: Option<Uuid>,
    user_id: Option<String>,
    session_id: Option<String>,
    rating: Option<Decimal>,
    title: Option<String>,
    content: Option<String>,
    tags: Option<Vec<String>>,
    image_urls: Option<Vec<String>>,
    is_public: Option<bool>,
}

pub async fn create_review(
    State(state): State<AppState>,
    Json(payload): Json<CreateReview>,
) -> Result<impl IntoResponse, ApiError> {
    let restaurant_id = payload
        .restaurant_id
        .ok_or_else(|| ApiError::bad_request("restaurant_id is required"))?;
    let rating = payload
        .rating
        .ok_or_else(|| ApiError::bad_request("rating is required"))?;
    if !rating_in_range(rating) {
        return Err(ApiError::bad_request("rating must be between 1 and 5"));
    }
    let content = payload
        .content
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::bad_request("content is required"))?
        .to_string();

    // The FK would also catch this, but a 400 beats surfacing a 500.
    if babgacha_db::restaurants::get_restaurant(&state.pool, restaurant_id)
        .await
        .map_err(|e| map_db_error(&e))?
        .is_none()
    {
        return Err(ApiError::bad_request("restaurant_id does not exist"));
    }

    let new = NewReview {
        restaurant_id,
        visit_id: payload.visit_id,
        user_id: payload.user_id,
        session_id: payload.session_id,
        rating,
        title: payload.title,
        content,
        tags: payload.tags.unwrap_or_default(),
        image_urls: payload.image_urls.unwrap_or_default(),
        is_public: payload.is_public.unwrap_or(true),
    };

    let row = reviews::insert_review(&state.pool, &new)
        .await
        .map_err(|e| map_db_error(&e))?;

    tracing::info!(review_id = %row.id, restaurant_id = %row.restaurant_id, "review created");
    Ok((StatusCode::CREATED, data(row)))
}

#[derive(Debug, Deserialize)]
pub struct PatchReview {
    user_id: Option<String>,
    session_id: Option<String>,
    rating: Option<Decimal>,
    title: Option<String>,
    content: Option<String>,
    tags: Option<Vec<String>>,
    image_urls: Option<Vec<String>>,
    is_public: Option<bool>,
}

pub async fn update_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PatchReview>,
) -> Result<impl IntoResponse, ApiError> {
    let existing = reviews::get_review(&state.pool, id)
        .await
        .map_err(|e| map_db_error(&e))?
        .ok_or_else(|| ApiError::not_found("review not found"))?;

    if !is_owner(
        &existing,
        payload.user_id.as_deref(),
        payload.session_id.as_deref(),
    ) {
        return Err(ApiError::forbidden("only the author can edit this review"));
    }

    if let Some(rating) = payload.rating {
        if !rating_in_range(rating) {
            return Err(ApiError::bad_request("rating must be between 1 and 5"));
        }
    }

    let update = UpdateReview {
        rating: payload.rating,
        title: payload.title,
        content: payload.content,
        tags: payload.tags,
        image_urls: payload.image_urls,
        is_public: payload.is_public,
    };

    let row = reviews::update_review(&state.pool, id, &update)
        .await
        .map_err(|e| map_db_error(&e))?;

    Ok(data(row))
}

pub async fn delete_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<IdentityParams>,
) -> Result<impl IntoResponse, ApiError> {
    let existing = reviews::get_review(&state.pool, id)
        .await
        .map_err(|e| map_db_error(&e))?
        .ok_or_else(|| ApiError::not_found("review not found"))?;

    if !is_owner(&existing, params.user_id.as_deref(), params.session_id.as_deref()) {
        return Err(ApiError::forbidden(
            "only the author can delete this review",
        ));
    }

    reviews::soft_delete_review(&state.pool, id)
        .await
        .map_err(|e| map_db_error(&e))?;

    Ok(data(serde_json::json!({ "deleted": true })))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSummary {
    total_reviews: usize,
    average_rating: Option<Decimal>,
    rating_distribution: HashMap<String, usize>,
    top_tags: Vec<TagCount>,
    recent_reviews_count: usize,
}

#[derive(Debug, Serialize)]
pub struct TagCount {
    tag: String,
    count: usize,
}

fn summarize(rows: &[reviews::ReviewSummarySource]) -> ReviewSummary {
    let mut rating_distribution: HashMap<String, usize> =
        (1..=5).map(|n| (n.to_string(), 0)).collect();
    let mut tag_counts: HashMap<&str, usize> = HashMap::new();
    let mut rating_sum = Decimal::ZERO;
    let recent_cutoff = Utc::now() - Duration::days(RECENT_REVIEW_DAYS);
    let mut recent_reviews_count = 0;

    for row in rows {
        rating_sum += row.rating;
        let bucket = row
            .rating
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .unwrap_or(0)
            .clamp(1, 5)
            .to_string();
        if let Some(slot) = rating_distribution.get_mut(&bucket) {
            *slot += 1;
        }
        for tag in &row.tags {
            *tag_counts.entry(tag.as_str()).or_default() += 1;
        }
        if row.created_at >= recent_cutoff {
            recent_reviews_count += 1;
        }
    }

    let average_rating = if rows.is_empty() {
        None
    } else {
        Some(
            (rating_sum / Decimal::from(rows.len()))
                .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero),
        )
    };

    let mut top_tags: Vec<TagCount> = tag_counts
        .into_iter()
        .map(|(tag, count)| TagCount {
            tag: tag.to_string(),
            count,
        })
        .collect();
    top_tags.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
    top_tags.truncate(TOP_TAG_COUNT);

    ReviewSummary {
        total_reviews: rows.len(),
        average_rating,
        rating_distribution,
        top_tags,
        recent_reviews_count,
    }
}

pub async fn review_summary(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = reviews::list_reviews_for_summary(&state.pool, id)
        .await
        .map_err(|e| map_db_error(&e))?;

    Ok(data(summarize(&rows)))
}
