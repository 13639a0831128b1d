mod auth;
mod delivery;
mod foods;
mod orders;
mod owner;
mod profile;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use farmdrop_core::DeliveryEngine;
use farmdrop_geocode::Geocoder;
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{
    enforce_rate_limit, load_session, request_id, require_login, require_owner, RateLimitState,
    RequestId,
};
use crate::session::SessionStore;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub engine: DeliveryEngine,
    /// `None` when no Mapbox token is configured; address lookups then fail
    /// with `geocoding_unavailable`.
    pub geocoder: Option<Arc<dyn Geocoder>>,
    pub sessions: SessionStore,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub alerts: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
    geocoding: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
            alerts: Vec::new(),
        }
    }

    pub(super) fn with_alerts(request_id: String, alerts: Vec<String>) -> Self {
        Self {
            alerts,
            ..Self::new(request_id)
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "forbidden" => StatusCode::FORBIDDEN,
            "bad_request" | "validation_error" | "geocode_failed" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "delivery_unavailable" => StatusCode::UNPROCESSABLE_ENTITY,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "geocoding_unavailable" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn normalize_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(50).clamp(1, 200)
}

pub(super) fn map_db_error(request_id: String, error: &farmdrop_db::DbError) -> ApiError {
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

/// Maps a unique violation to `conflict` with `message`; anything else to
/// [`map_db_error`].
pub(super) fn map_unique_violation(
    request_id: &str,
    error: &farmdrop_db::DbError,
    message: &str,
) -> ApiError {
    if error.is_unique_violation() {
        return ApiError::new(request_id, "conflict", message);
    }
    map_db_error(request_id.to_owned(), error)
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

fn auth_router(rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit,
            enforce_rate_limit,
        ))
}

fn customer_router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/profile",
            get(profile::get_profile).delete(profile::delete_profile),
        )
        .route(
            "/api/v1/orders",
            get(orders::list_my_orders).post(orders::place_order),
        )
        .route_layer(axum::middleware::from_fn(require_login))
}

fn owner_router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/foods", post(foods::create_food))
        .route(
            "/api/v1/foods/{slug}/availability",
            patch(foods::update_availability),
        )
        .route("/api/v1/owner/orders", get(owner::list_orders))
        .route(
            "/api/v1/owner/orders/{public_id}/status",
            patch(owner::update_order_status),
        )
        .route_layer(axum::middleware::from_fn(require_owner))
}

pub fn build_app(state: AppState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/foods", get(foods::list_foods))
        .route("/api/v1/foods/{slug}", get(foods::get_food))
        .route("/api/v1/delivery/quote", post(delivery::quote));

    Router::new()
        .merge(public_routes)
        .merge(auth_router(rate_limit))
        .merge(customer_router())
        .merge(owner_router())
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id))
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    load_session,
                )),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);
    let geocoding = if state.geocoder.is_some() {
        "configured"
    } else {
        "disabled"
    };

    match farmdrop_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                    geocoding,
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                        geocoding,
                    },
                    meta,
                }),
            )
        }
    }
}

async fn not_found(Extension(req_id): Extension<RequestId>) -> ApiError {
    ApiError::new(req_id.0, "not_found", "page not found")
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}

#[cfg(test)]
#[path = "routes_test.rs"]
mod tests;
