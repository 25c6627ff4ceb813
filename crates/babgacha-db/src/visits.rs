//! Database operations for the `visit_history` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `visit_history` table.
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct VisitRow {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub visit_type: String,
    pub memo: Option<String>,
    pub is_favorite: bool,
    pub visited_at: DateTime<Utc>,
}

/// Insert payload for a new visit record.
#[derive(Debug, Clone)]
pub struct NewVisit {
    pub restaurant_id: Uuid,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub visit_type: String,
    pub memo: Option<String>,
}

/// Filters for listing visit history. A `user_id` filter takes precedence
/// over `session_id` when both are present.
#[derive(Debug, Clone, Default)]
pub struct VisitFilter {
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub visit_type: Option<String>,
    pub is_favorite: Option<bool>,
}

/// Lists visit records, newest first, applying the given filters.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_visits(
    pool: &PgPool,
    filter: &VisitFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<VisitRow>, DbError> {
    // user filter wins over session filter, matching the API contract.
    let (user_id, session_id) = if filter.user_id.is_some() {
        (filter.user_id.as_deref(), None)
    } else {
        (None, filter.session_id.as_deref())
    };

    let rows = sqlx::query_as::<_, VisitRow>(
        "SELECT * FROM visit_history \
         WHERE ($1::text IS NULL OR user_id = $1) \
           AND ($2::text IS NULL OR session_id = $2) \
           AND ($3::timestamptz IS NULL OR visited_at >= $3) \
           AND ($4::timestamptz IS NULL OR visited_at <= $4) \
           AND ($5::text IS NULL OR visit_type = $5) \
           AND ($6::boolean IS NULL OR is_favorite = $6) \
         ORDER BY visited_at DESC \
         LIMIT $7 OFFSET $8",
    )
    .bind(user_id)
    .bind(session_id)
    .bind(filter.start_date)
    .bind(filter.end_date)
    .bind(filter.visit_type.as_deref())
    .bind(filter.is_favorite)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// A visit joined with the restaurant it refers to, for usage statistics.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VisitStatsRow {
    pub restaurant_id: Uuid,
    pub restaurant_name: String,
    pub restaurant_category: String,
    pub visit_type: String,
    pub is_favorite: bool,
    pub visited_at: DateTime<Utc>,
}

/// Fetches visits (joined with their restaurant) for a user or session,
/// optionally bounded to visits at or after `since`. Aggregation happens
/// in the caller.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_visits_for_stats(
    pool: &PgPool,
    user_id: Option<&str>,
    session_id: Option<&str>,
    since: Option<DateTime<Utc>>,
) -> Result<Vec<VisitStatsRow>, DbError> {
    let (user_id, session_id) = if user_id.is_some() {
        (user_id, None)
    } else {
        (None, session_id)
    };

    let rows = sqlx::query_as::<_, VisitStatsRow>(
        "SELECT v.restaurant_id, r.name AS restaurant_name, \
                r.category AS restaurant_category, \
                v.visit_type, v.is_favorite, v.visited_at \
         FROM visit_history v \
         JOIN restaurants r ON r.id = v.restaurant_id \
         WHERE ($1::text IS NULL OR v.user_id = $1) \
           AND ($2::text IS NULL OR v.session_id = $2) \
           AND ($3::timestamptz IS NULL OR v.visited_at >= $3)",
    )
    .bind(user_id)
    .bind(session_id)
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Inserts a visit record and returns the stored row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_visit(pool: &PgPool, new: &NewVisit) -> Result<VisitRow, DbError> {
    let row = sqlx::query_as::<_, VisitRow>(
        "INSERT INTO visit_history (restaurant_id, user_id, session_id, visit_type, memo) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING *",
    )
    .bind(new.restaurant_id)
    .bind(&new.user_id)
    .bind(&new.session_id)
    .bind(&new.visit_type)
    .bind(&new.memo)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Sets the favorite flag on a visit record.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no such visit exists, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn set_visit_favorite(
    pool: &PgPool,
    id: Uuid,
    is_favorite: bool,
) -> Result<VisitRow, DbError> {
    let row = sqlx::query_as::<_, VisitRow>(
        "UPDATE visit_history SET is_favorite = $2 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(is_favorite)
    .fetch_optional(pool)
    .await?;

    row.ok_or(DbError::NotFound)
}
