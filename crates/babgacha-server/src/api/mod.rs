mod nearby;
mod restaurants;
mod reviews;
mod visits;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use babgacha_naver::LocalSearchClient;

use crate::middleware::request_id;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    /// `None` when Naver credentials are not configured; the nearby-search
    /// endpoint answers 503 in that case.
    pub search: Option<Arc<LocalSearchClient>>,
}

/// Success envelope for a single record.
#[derive(Debug, Serialize)]
pub struct ApiData<T: Serialize> {
    pub success: bool,
    pub data: T,
}

/// Success envelope for a list, with its length echoed as `count`.
#[derive(Debug, Serialize)]
pub struct ApiList<T: Serialize> {
    pub success: bool,
    pub data: Vec<T>,
    pub count: usize,
}

pub(super) fn data<T: Serialize>(data: T) -> Json<ApiData<T>> {
    Json(ApiData {
        success: true,
        data,
    })
}

pub(super) fn list<T: Serialize>(items: Vec<T>) -> Json<ApiList<T>> {
    let count = items.len();
    Json(ApiList {
        success: true,
        data: items,
        count,
    })
}

/// Failure envelope. `code` is set only for failure classes clients branch
/// on (upstream config/call errors).
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: String,
    code: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: message.into(),
            code: None,
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            error: message.into(),
            code: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            error: message.into(),
            code: None,
        }
    }

    pub fn bad_gateway(message: impl Into<String>, code: &'static str) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            error: message.into(),
            code: Some(code),
        }
    }

    pub fn service_unavailable(message: impl Into<String>, code: &'static str) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            error: message.into(),
            code: Some(code),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: message.into(),
            code: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let body = ErrorBody {
            success: false,
            error: self.error,
            code: self.code,
        };
        (self.status, Json(body)).into_response()
    }
}

pub(super) fn map_db_error(error: &babgacha_db::DbError) -> ApiError {
    match error {
        babgacha_db::DbError::NotFound => ApiError::not_found("record not found"),
        other => {
            tracing::error!(error = %other, "database query failed");
            ApiError::internal("database query failed")
        }
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-request-id"),
        ])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route(
            "/api/restaurants",
            get(restaurants::list_restaurants).post(restaurants::create_restaurant),
        )
        .route("/api/restaurants/stats", get(restaurants::restaurant_stats))
        .route("/api/restaurants/random", get(restaurants::random_restaurant))
        .route("/api/restaurants/{id}", get(restaurants::get_restaurant))
        .route(
            "/api/restaurants/{id}/reviews/summary",
            get(reviews::review_summary),
        )
        .route("/api/nearby-restaurants", get(nearby::nearby_restaurants))
        .route(
            "/api/visits",
            get(visits::list_visits).post(visits::create_visit),
        )
        .route("/api/visits/{id}/favorite", patch(visits::toggle_favorite))
        .route("/api/usage-stats", get(visits::usage_stats))
        .route(
            "/api/reviews",
            get(reviews::list_reviews).post(reviews::create_review),
        )
        .route("/api/reviews/my", get(reviews::my_reviews))
        .route(
            "/api/reviews/{id}",
            get(reviews::get_review)
                .patch(reviews::update_review)
                .delete(reviews::delete_review),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthBody {
    status: &'static str,
    database: &'static str,
    timestamp: chrono::DateTime<chrono::Utc>,
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let timestamp = chrono::Utc::now();
    match babgacha_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthBody {
                status: "healthy",
                database: "connected",
                timestamp,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(HealthBody {
                    status: "unhealthy",
                    database: "disconnected",
                    timestamp,
                }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use rust_decimal::Decimal;
    use tower::ServiceExt;

    fn app(pool: sqlx::PgPool) -> Router {
        build_app(AppState { pool, search: None })
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&bytes).expect("json parse")
    }

    #[test]
    fn list_envelope_echoes_count() {
        let json = serde_json::to_value(ApiList {
            success: true,
            data: vec!["a", "b"],
            count: 2,
        })
        .expect("serialize");
        assert_eq!(json["success"], true);
        assert_eq!(json["count"], 2);
    }

    #[test]
    fn error_envelope_omits_code_when_absent() {
        let response = ApiError::bad_request("missing location").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response =
            ApiError::service_unavailable("search unavailable", "NAVER_API_CONFIG_ERROR")
                .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn health_reports_connected(pool: sqlx::PgPool) {
        let response = app(pool)
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["database"], "connected");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn create_and_list_restaurants(pool: sqlx::PgPool) {
        let app = app(pool);

        let body = serde_json::json!({
            "name": "강남 국밥",
            "category": "한식",
            "sub_category": "국밥",
            "address": "서울 강남구 1"
        });
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/restaurants")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        assert_eq!(created["data"]["name"], "강남 국밥");
        assert_eq!(created["data"]["emoji"], "🍽️", "default emoji applied");

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/restaurants?category=한식")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["count"], 1);
        assert_eq!(json["data"][0]["category"], "한식");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn create_restaurant_requires_name_and_category(pool: sqlx::PgPool) {
        let response = app(pool)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/restaurants")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"name": "이름만"}"#))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn random_restaurant_404_when_empty(pool: sqlx::PgPool) {
        let response = app(pool)
            .oneshot(
                Request::builder()
                    .uri("/api/restaurants/random")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn nearby_requires_location(pool: sqlx::PgPool) {
        let response = app(pool)
            .oneshot(
                Request::builder()
                    .uri("/api/nearby-restaurants")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn nearby_503_without_credentials(pool: sqlx::PgPool) {
        let response = app(pool)
            .oneshot(
                Request::builder()
                    .uri("/api/nearby-restaurants?location=강남역")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let json = body_json(response).await;
        assert_eq!(json["code"], "NAVER_API_CONFIG_ERROR");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn nearby_returns_normalized_results(pool: sqlx::PgPool) {
        use wiremock::matchers::{method, query_param};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("query", "강남역 한식 맛집"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "total": 1,
                "start": 1,
                "display": 1,
                "items": [{
                    "title": "<b>국밥</b>집",
                    "link": "https://place.example/1",
                    "category": "음식점>한식>국밥",
                    "description": "",
                    "telephone": "",
                    "address": "서울 강남구 1",
                    "roadAddress": "서울 강남구 도로 1",
                    "mapx": "4480300",
                    "mapy": "1997800"
                }]
            })))
            .mount(&server)
            .await;

        let client = babgacha_naver::LocalSearchClient::with_base_url(
            "test-id",
            "test-secret",
            5,
            &server.uri(),
        )
        .expect("client");
        let app = build_app(AppState {
            pool,
            search: Some(std::sync::Arc::new(client)),
        });

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/nearby-restaurants?location=강남역&category=한식&count=3")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["meta"]["location"], "강남역");
        assert_eq!(json["meta"]["category"], "한식");
        assert_eq!(json["meta"]["total"], 1);
        assert_eq!(json["meta"]["source"], "naver_local_search");
        let first = &json["data"][0];
        assert_eq!(first["name"], "국밥집");
        assert_eq!(first["category"]["main"], "음식점");
        assert_eq!(first["coordinates"]["latitude"], 37.498);
    }

    async fn seed_restaurant(pool: &sqlx::PgPool, name: &str) -> uuid::Uuid {
        sqlx::query_scalar::<_, uuid::Uuid>(
            "INSERT INTO restaurants (name, category) VALUES ($1, '한식') RETURNING id",
        )
        .bind(name)
        .fetch_one(pool)
        .await
        .expect("seed restaurant")
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn review_rating_must_be_in_range(pool: sqlx::PgPool) {
        let restaurant_id = seed_restaurant(&pool, "평점 검증 식당").await;

        let body = serde_json::json!({
            "restaurant_id": restaurant_id,
            "rating": 6,
            "content": "너무 맛있어요"
        });
        let response = app(pool)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/reviews")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn private_review_is_owner_only(pool: sqlx::PgPool) {
        let restaurant_id = seed_restaurant(&pool, "비공개 리뷰 식당").await;
        let app = app(pool);

        let body = serde_json::json!({
            "restaurant_id": restaurant_id,
            "rating": 4.5,
            "content": "나만 아는 집",
            "session_id": "sess-1",
            "is_public": false
        });
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/reviews")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        let review_id = created["data"]["id"].as_str().expect("id").to_string();

        // Stranger: 403.
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/api/reviews/{review_id}"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        // Owner session: 200.
        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/reviews/{review_id}?session_id=sess-1"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn deleted_review_disappears_from_listings(pool: sqlx::PgPool) {
        let restaurant_id = seed_restaurant(&pool, "삭제 테스트 식당").await;
        let app = app(pool);

        let body = serde_json::json!({
            "restaurant_id": restaurant_id,
            "rating": 3,
            "content": "그냥 그래요"
        });
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/reviews")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .expect("request"),
            )
            .await
            .expect("response");
        let created = body_json(response).await;
        let review_id = created["data"]["id"].as_str().expect("id").to_string();

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/api/reviews/{review_id}"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/reviews")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        let json = body_json(response).await;
        assert_eq!(json["count"], 0);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn visit_lifecycle_and_usage_stats(pool: sqlx::PgPool) {
        let restaurant_id = seed_restaurant(&pool, "통계 식당").await;
        let app = app(pool);

        let body = serde_json::json!({
            "restaurant_id": restaurant_id,
            "session_id": "sess-stats",
            "visit_type": "gacha"
        });
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/visits")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        let visit_id = created["data"]["id"].as_str().expect("id").to_string();

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("PATCH")
                    .uri(format!("/api/visits/{visit_id}/favorite"))
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"is_favorite": true}"#))
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/usage-stats?session_id=sess-stats&period=week")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["totalVisits"], 1);
        assert_eq!(json["data"]["favoriteCount"], 1);
        assert_eq!(json["data"]["visitTypeStats"]["gacha"], 1);
        assert_eq!(json["data"]["categoryStats"]["한식"], 1);
        assert_eq!(json["data"]["topRestaurants"][0]["name"], "통계 식당");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn review_summary_aggregates_public_reviews(pool: sqlx::PgPool) {
        let restaurant_id = seed_restaurant(&pool, "요약 식당").await;

        for (rating, tags) in [
            (Decimal::new(50, 1), vec!["맛있어요", "친절해요"]),
            (Decimal::new(40, 1), vec!["맛있어요"]),
            (Decimal::new(30, 1), vec![]),
        ] {
            sqlx::query(
                "INSERT INTO reviews (restaurant_id, rating, content, tags) \
                 VALUES ($1, $2, '리뷰', $3)",
            )
            .bind(restaurant_id)
            .bind(rating)
            .bind(tags)
            .execute(&pool)
            .await
            .expect("seed review");
        }

        let response = app(pool)
            .oneshot(
                Request::builder()
                    .uri(format!("/api/restaurants/{restaurant_id}/reviews/summary"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["totalReviews"], 3);
        assert_eq!(json["data"]["averageRating"], "4.0");
        assert_eq!(json["data"]["ratingDistribution"]["5"], 1);
        assert_eq!(json["data"]["ratingDistribution"]["4"], 1);
        assert_eq!(json["data"]["ratingDistribution"]["3"], 1);
        assert_eq!(json["data"]["topTags"][0]["tag"], "맛있어요");
        assert_eq!(json["data"]["topTags"][0]["count"], 2);
        assert_eq!(json["data"]["recentReviewsCount"], 3);
    }
}
