//! Catalog handlers. Reads are public; writes are owner-only.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use farmdrop_db::{FoodRow, NewFood};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_db_error, map_unique_violation, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct CreateFoodRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub unit: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct AvailabilityRequest {
    pub available: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct FoodItem {
    slug: String,
    name: String,
    description: Option<String>,
    price: Decimal,
    unit: String,
    image_url: Option<String>,
    is_available: bool,
    updated_at: DateTime<Utc>,
}

impl From<FoodRow> for FoodItem {
    fn from(row: FoodRow) -> Self {
        Self {
            slug: row.slug,
            name: row.name,
            description: row.description,
            price: row.price,
            unit: row.unit,
            image_url: row.image_url,
            is_available: row.is_available,
            updated_at: row.updated_at,
        }
    }
}

fn validate_food(rid: &str, body: &CreateFoodRequest) -> Result<String, ApiError> {
    let name = body.name.trim();
    if name.is_empty() || name.chars().count() > 200 {
        return Err(ApiError::new(
            rid,
            "validation_error",
            "name must be 1-200 characters",
        ));
    }
    if body.price <= Decimal::ZERO {
        return Err(ApiError::new(
            rid,
            "validation_error",
            "price must be greater than zero",
        ));
    }
    let slug = farmdrop_core::slug_from_name(name);
    if slug.is_empty() {
        return Err(ApiError::new(
            rid,
            "validation_error",
            "name must contain at least one letter or digit",
        ));
    }
    Ok(slug)
}

/// GET /api/v1/foods — foods currently on offer.
pub(super) async fn list_foods(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<FoodItem>>>, ApiError> {
    let rows = farmdrop_db::list_foods(&state.pool, true)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(FoodItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn get_food(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<FoodItem>>, ApiError> {
    let row = farmdrop_db::get_food_by_slug(&state.pool, &slug)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "not_found", format!("food '{slug}' not found")))?;

    Ok(Json(ApiResponse {
        data: row.into(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /api/v1/foods — add a catalog entry.
pub(super) async fn create_food(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateFoodRequest>,
) -> Result<(StatusCode, Json<ApiResponse<FoodItem>>), ApiError> {
    let rid = &req_id.0;
    let slug = validate_food(rid, &body)?;

    let row = farmdrop_db::create_food(
        &state.pool,
        &NewFood {
            name: body.name.trim(),
            slug: &slug,
            description: body.description.as_deref(),
            price: body.price.round_dp(2),
            unit: body.unit.as_deref().map_or("each", str::trim),
            image_url: body.image_url.as_deref(),
        },
    )
    .await
    .map_err(|e| map_unique_violation(rid, &e, "a food with that name already exists"))?;

    tracing::info!(slug = %row.slug, "food created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: row.into(),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// PATCH /api/v1/foods/{slug}/availability — mark in stock or sold out.
pub(super) async fn update_availability(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(slug): Path<String>,
    Json(body): Json<AvailabilityRequest>,
) -> Result<Json<ApiResponse<FoodItem>>, ApiError> {
    let row = farmdrop_db::update_food_availability(&state.pool, &slug, body.available)
        .await
        .map_err(|e| match e {
            farmdrop_db::DbError::NotFound => {
                ApiError::new(req_id.0.clone(), "not_found", format!("food '{slug}' not found"))
            }
            other => map_db_error(req_id.0.clone(), &other),
        })?;

    Ok(Json(ApiResponse {
        data: row.into(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str, price: Decimal) -> CreateFoodRequest {
        CreateFoodRequest {
            name: name.to_owned(),
            description: None,
            price,
            unit: None,
            image_url: None,
        }
    }

    #[test]
    fn validate_food_returns_slug() {
        let slug = validate_food("r", &request("  Purple Carrots ", Decimal::new(350, 2)))
            .expect("valid");
        assert_eq!(slug, "purple-carrots");
    }

    #[test]
    fn validate_food_rejects_non_positive_price() {
        for price in [Decimal::ZERO, Decimal::new(-1, 0)] {
            let err = validate_food("r", &request("Kale", price)).expect_err("bad price");
            assert_eq!(err.error.code, "validation_error");
        }
    }

    #[test]
    fn validate_food_rejects_unsluggable_name() {
        assert!(validate_food("r", &request("!!!", Decimal::ONE)).is_err());
    }
}
