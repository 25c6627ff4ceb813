//! Database operations for the `reviews` table.
//!
//! Reviews are soft-deleted: `is_deleted` is flipped, rows are never
//! removed. Visibility is session-scoped — a private review is visible
//! only to the session or user that wrote it.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `reviews` table.
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct ReviewRow {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub visit_id: Option<Uuid>,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub rating: Decimal,
    pub title: Option<String>,
    pub content: String,
    pub tags: Vec<String>,
    pub image_urls: Vec<String>,
    pub is_public: bool,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a new review.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub restaurant_id: Uuid,
    pub visit_id: Option<Uuid>,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub rating: Decimal,
    pub title: Option<String>,
    pub content: String,
    pub tags: Vec<String>,
    pub image_urls: Vec<String>,
    pub is_public: bool,
}

/// Partial update payload; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateReview {
    pub rating: Option<Decimal>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub image_urls: Option<Vec<String>>,
    pub is_public: Option<bool>,
}

/// Filters for listing reviews.
///
/// With `include_private` set and a `session_id`/`user_id` present, the
/// caller's own private reviews are included alongside public ones;
/// otherwise only public reviews are returned.
#[derive(Debug, Clone, Default)]
pub struct ReviewFilter {
    pub restaurant_id: Option<Uuid>,
    pub session_id: Option<String>,
    pub user_id: Option<String>,
    pub include_private: bool,
    /// Restrict to the caller's own reviews (the "my reviews" listing).
    pub own_only: bool,
}

/// Rating/tags source rows for the per-restaurant review summary.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReviewSummarySource {
    pub rating: Decimal,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Lists non-deleted reviews, newest first, under the given visibility
/// filter.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_reviews(
    pool: &PgPool,
    filter: &ReviewFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<ReviewRow>, DbError> {
    let user_id = filter.user_id.as_deref();
    let session_id = filter.session_id.as_deref();
    let has_identity = user_id.is_some() || session_id.is_some();

    // Visibility:
    //   own_only            -> only the caller's reviews (public and private)
    //   include_private+id  -> public reviews plus the caller's private ones
    //   otherwise           -> public reviews only
    let rows = sqlx::query_as::<_, ReviewRow>(
        "SELECT * FROM reviews \
         WHERE NOT is_deleted \
           AND ($1::uuid IS NULL OR restaurant_id = $1) \
           AND CASE \
                 WHEN $4::boolean THEN \
                   (($2::text IS NOT NULL AND user_id = $2) \
                    OR ($3::text IS NOT NULL AND session_id = $3)) \
                 WHEN $5::boolean THEN \
                   (is_public \
                    OR ($2::text IS NOT NULL AND user_id = $2) \
                    OR ($3::text IS NOT NULL AND session_id = $3)) \
                 ELSE is_public \
               END \
         ORDER BY created_at DESC \
         LIMIT $6 OFFSET $7",
    )
    .bind(filter.restaurant_id)
    .bind(user_id)
    .bind(session_id)
    .bind(filter.own_only)
    .bind(filter.include_private && has_identity)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Fetches one non-deleted review by id, regardless of visibility — the
/// caller enforces owner-only access for private reviews.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_review(pool: &PgPool, id: Uuid) -> Result<Option<ReviewRow>, DbError> {
    let row = sqlx::query_as::<_, ReviewRow>(
        "SELECT * FROM reviews WHERE id = $1 AND NOT is_deleted",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Inserts a review and returns the stored row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_review(pool: &PgPool, new: &NewReview) -> Result<ReviewRow, DbError> {
    let row = sqlx::query_as::<_, ReviewRow>(
        "INSERT INTO reviews \
             (restaurant_id, visit_id, user_id, session_id, rating, title, \
              content, tags, image_urls, is_public) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
         RETURNING *",
    )
    .bind(new.restaurant_id)
    .bind(new.visit_id)
    .bind(&new.user_id)
    .bind(&new.session_id)
    .bind(new.rating)
    .bind(&new.title)
    .bind(&new.content)
    .bind(&new.tags)
    .bind(&new.image_urls)
    .bind(new.is_public)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Applies a partial update to a non-deleted review.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no such review exists, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_review(
    pool: &PgPool,
    id: Uuid,
    update: &UpdateReview,
) -> Result<ReviewRow, DbError> {
    let row = sqlx::query_as::<_, ReviewRow>(
        "UPDATE reviews SET \
             rating     = COALESCE($2, rating), \
             title      = COALESCE($3, title), \
             content    = COALESCE($4, content), \
             tags       = COALESCE($5, tags), \
             image_urls = COALESCE($6, image_urls), \
             is_public  = COALESCE($7, is_public), \
             updated_at = NOW() \
         WHERE id = $1 AND NOT is_deleted \
         RETURNING *",
    )
    .bind(id)
    .bind(update.rating)
    .bind(&update.title)
    .bind(&update.content)
    .bind(&update.tags)
    .bind(&update.image_urls)
    .bind(update.is_public)
    .fetch_optional(pool)
    .await?;

    row.ok_or(DbError::NotFound)
}

/// Soft-deletes a review.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no such review exists, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn soft_delete_review(pool: &PgPool, id: Uuid) -> Result<(), DbError> {
    let result = sqlx::query("UPDATE reviews SET is_deleted = TRUE WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Fetches rating/tags rows of a restaurant's public reviews for the
/// summary endpoint. Aggregation happens in the caller.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_reviews_for_summary(
    pool: &PgPool,
    restaurant_id: Uuid,
) -> Result<Vec<ReviewSummarySource>, DbError> {
    let rows = sqlx::query_as::<_, ReviewSummarySource>(
        "SELECT rating, tags, created_at FROM reviews \
         WHERE restaurant_id = $1 AND is_public AND NOT is_deleted",
    )
    .bind(restaurant_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
