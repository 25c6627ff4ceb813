//! Handlers for visit history and usage statistics.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use babgacha_db::visits::{self, NewVisit, VisitFilter, VisitStatsRow};

use super::{data, list, map_db_error, ApiError, AppState};

const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 200;
const TOP_RESTAURANT_COUNT: usize = 5;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    user_id: Option<String>,
    session_id: Option<String>,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    visit_type: Option<String>,
    is_favorite: Option<bool>,
    limit: Option<i64>,
    offset: Option<i64>,
}

pub async fn list_visits(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);
    let filter = VisitFilter {
        user_id: params.user_id,
        session_id: params.session_id,
        start_date: params.start_date,
        end_date: params.end_date,
        visit_type: params.visit_type,
        is_favorite: params.is_favorite,
    };

    let rows = visits::list_visits(&state.pool, &filter, limit, offset)
        .await
        .map_err(|e| map_db_error(&e))?;

    Ok(list(rows))
}

#[derive(Debug, Deserialize)]
pub struct CreateVisit {
    restaurant_id: Option<Uuid>,
    user_id: Option<String>,
    session_id: Option<String>,
    visit_type: Option<String>,
    memo: Option<String>,
}

pub async fn create_visit(
    State(state): State<AppState>,
    Json(payload): Json<CreateVisit>,
) -> Result<impl IntoResponse, ApiError> {
    let restaurant_id = payload
        .restaurant_id
        .ok_or_else(|| ApiError::bad_request("restaurant_id is required"))?;

    let new = NewVisit {
        restaurant_id,
        user_id: payload.user_id,
        session_id: payload.session_id,
        visit_type: payload.visit_type.unwrap_or_else(|| "manual".to_string()),
        memo: payload.memo,
    };

    let row = visits::insert_visit(&state.pool, &new)
        .await
        .map_err(|e| map_db_error(&e))?;

    tracing::info!(visit_id = %row.id, restaurant_id = %row.restaurant_id, "visit recorded");
    Ok((StatusCode::CREATED, data(row)))
}

#[derive(Debug, Deserialize)]
pub struct FavoritePayload {
    is_favorite: Option<bool>,
}

pub async fn toggle_favorite(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<FavoritePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let is_favorite = payload
        .is_favorite
        .ok_or_else(|| ApiError::bad_request("is_favorite is required"))?;

    let row = visits::set_visit_favorite(&state.pool, id, is_favorite)
        .await
        .map_err(|e| map_db_error(&e))?;

    Ok(data(row))
}

#[derive(Debug, Deserialize)]
pub struct UsageStatsParams {
    user_id: Option<String>,
    session_id: Option<String>,
    period: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStats {
    period: String,
    total_visits: usize,
    favorite_count: usize,
    visit_type_stats: HashMap<String, usize>,
    category_stats: HashMap<String, usize>,
    top_restaurants: Vec<TopRestaurant>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopRestaurant {
    id: Uuid,
    name: String,
    category: String,
    visit_count: usize,
}

/// Lower bound of the requested period, or `None` for `all`.
fn period_start(period: &str, now: DateTime<Utc>) -> Result<Option<DateTime<Utc>>, ApiError> {
    match period {
        "today" => Ok(Some(
            now.date_naive()
                .and_hms_opt(0, 0, 0)
                .unwrap_or_default()
                .and_utc(),
        )),
        "week" => Ok(Some(now - Duration::days(7))),
        "month" => Ok(Some(now - Duration::days(30))),
        "year" => Ok(Some(now - Duration::days(365))),
        "all" => Ok(None),
        other => Err(ApiError::bad_request(format!(
            "unknown period '{other}', expected today, week, month, year or all"
        ))),
    }
}

fn aggregate(period: String, rows: &[VisitStatsRow]) -> UsageStats {
    let mut visit_type_stats: HashMap<String, usize> = HashMap::new();
    let mut category_stats: HashMap<String, usize> = HashMap::new();
    let mut per_restaurant: HashMap<Uuid, (String, String, usize)> = HashMap::new();
    let mut favorite_count = 0;

    for row in rows {
        *visit_type_stats.entry(row.visit_type.clone()).or_default() += 1;
        *category_stats
            .entry(row.restaurant_category.clone())
            .or_default() += 1;
        if row.is_favorite {
            favorite_count += 1;
        }
        per_restaurant
            .entry(row.restaurant_id)
            .and_modify(|(_, _, n)| *n += 1)
            .or_insert_with(|| {
                (
                    row.restaurant_name.clone(),
                    row.restaurant_category.clone(),
                    1,
                )
            });
    }

    let mut top_restaurants: Vec<TopRestaurant> = per_restaurant
        .into_iter()
        .map(|(id, (name, category, visit_count))| TopRestaurant {
            id,
            name,
            category,
            visit_count,
        })
        .collect();
    top_restaurants.sort_by(|a, b| {
        b.visit_count
            .cmp(&a.visit_count)
            .then_with(|| a.name.cmp(&b.name))
    });
    top_restaurants.truncate(TOP_RESTAURANT_COUNT);

    UsageStats {
        period,
        total_visits: rows.len(),
        favorite_count,
        visit_type_stats,
        category_stats,
        top_restaurants,
    }
}

pub async fn usage_stats(
    State(state): State<AppState>,
    Query(params): Query<UsageStatsParams>,
) -> Result<impl IntoResponse, ApiError> {
    if params.user_id.is_none() && params.session_id.is_none() {
        return Err(ApiError::bad_request(
            "user_id or session_id is required",
        ));
    }

    let period = params.period.unwrap_or_else(|| "all".to_string());
    let since = period_start(&period, Utc::now())?;

    let rows = visits::list_visits_for_stats(
        &state.pool,
        params.user_id.as_deref(),
        params.session_id.as_deref(),
        since,
    )
    .await
    .map_err(|e| map_db_error(&e))?;

    Ok(data(aggregate(period, &rows)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats_row(
        id: u128,
        name: &str,
        category: &str,
        visit_type: &str,
        favorite: bool,
    ) -> VisitStatsRow {
        VisitStatsRow {
            restaurant_id: Uuid::from_u128(id),
            restaurant_name: name.to_string(),
            restaurant_category: category.to_string(),
            visit_type: visit_type.to_string(),
            is_favorite: favorite,
            visited_at: Utc::now(),
        }
    }

    #[test]
    fn aggregate_counts_types_categories_and_favorites() {
        let rows = vec![
            stats_row(1, "국밥집", "한식", "gacha", true),
            stats_row(1, "국밥집", "한식", "manual", false),
            stats_row(2, "파스타집", "양식", "gacha", false),
        ];

        let stats = aggregate("all".to_string(), &rows);
        assert_eq!(stats.total_visits, 3);
        assert_eq!(stats.favorite_count, 1);
        assert_eq!(stats.visit_type_stats["gacha"], 2);
        assert_eq!(stats.visit_type_stats["manual"], 1);
        assert_eq!(stats.category_stats["한식"], 2);
        assert_eq!(stats.category_stats["양식"], 1);
        assert_eq!(stats.top_restaurants[0].name, "국밥집");
        assert_eq!(stats.top_restaurants[0].visit_count, 2);
    }

    #[test]
    fn top_restaurants_capped_at_five() {
        let rows: Vec<VisitStatsRow> = (0u128..8)
            .map(|i| stats_row(i, &format!("식당{i}"), "한식", "manual", false))
            .collect();

        let stats = aggregate("all".to_string(), &rows);
        assert_eq!(stats.top_restaurants.len(), TOP_RESTAURANT_COUNT);
    }

    #[test]
    fn period_start_bounds() {
        let now = Utc::now();
        assert!(period_start("all", now).expect("valid").is_none());
        let week = period_start("week", now).expect("valid").expect("bounded");
        assert_eq!(now - week, Duration::days(7));
        assert!(period_start("fortnight", now).is_err());
    }
}
