//! `POST /api/v1/delivery/quote` and destination resolution shared with
//! order placement.

use axum::{extract::State, Extension, Json};
use farmdrop_core::{Coordinate, DeliveryQuote, DeliveryTier};
use farmdrop_geocode::GeocodeError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct QuoteRequest {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct QuoteResponse {
    latitude: f64,
    longitude: f64,
    place_name: Option<String>,
    distance_km: f64,
    tier: DeliveryTier,
    fee: Option<Decimal>,
    deliverable: bool,
    message: &'static str,
}

/// Where a delivery goes, after geocoding if needed.
#[derive(Debug, Clone)]
pub(super) struct Destination {
    pub coordinate: Coordinate,
    /// Canonical name from the geocoder; `None` for raw coordinates.
    pub place_name: Option<String>,
}

/// Turns coordinates or an address into a validated [`Destination`].
///
/// Coordinates win when both are present. A lone latitude or longitude is a
/// validation error.
pub(super) async fn resolve_destination(
    state: &AppState,
    rid: &str,
    latitude: Option<f64>,
    longitude: Option<f64>,
    address: Option<&str>,
) -> Result<Destination, ApiError> {
    match (latitude, longitude) {
        (Some(lat), Some(lon)) => {
            let coordinate = Coordinate::new(lat, lon)
                .map_err(|e| ApiError::new(rid, "validation_error", e.to_string()))?;
            Ok(Destination {
                coordinate,
                place_name: None,
            })
        }
        (Some(_), None) | (None, Some(_)) => Err(ApiError::new(
            rid,
            "validation_error",
            "latitude and longitude must be sent together",
        )),
        (None, None) => {
            let address = address.map(str::trim).filter(|a| !a.is_empty()).ok_or_else(|| {
                ApiError::new(
                    rid,
                    "validation_error",
                    "send either latitude and longitude or an address",
                )
            })?;
            geocode(state, rid, address).await
        }
    }
}

async fn geocode(state: &AppState, rid: &str, address: &str) -> Result<Destination, ApiError> {
    let Some(geocoder) = state.geocoder.as_ref() else {
        return Err(ApiError::new(
            rid,
            "geocoding_unavailable",
            "address lookup is not configured; send latitude and longitude instead",
        ));
    };

    match geocoder.forward(address).await {
        Ok(found) => Ok(Destination {
            coordinate: found.coordinate,
            place_name: Some(found.place_name),
        }),
        Err(GeocodeError::EmptyQuery) => Err(ApiError::new(
            rid,
            "validation_error",
            "address must not be empty",
        )),
        Err(e @ (GeocodeError::NoMatch(_) | GeocodeError::InvalidCoordinate(_))) => {
            tracing::info!(error = %e, "address could not be geocoded");
            Err(ApiError::new(
                rid,
                "geocode_failed",
                format!("could not find a location for '{address}'"),
            ))
        }
        Err(e) => {
            tracing::error!(error = %e, "geocoding request failed");
            Err(ApiError::new(
                rid,
                "geocoding_unavailable",
                "address lookup is temporarily unavailable",
            ))
        }
    }
}

/// Quotes `destination` with the configured engine.
pub(super) fn quote_destination(
    state: &AppState,
    rid: &str,
    destination: &Destination,
) -> Result<DeliveryQuote, ApiError> {
    let quote = state.engine.quote(destination.coordinate).map_err(|e| {
        tracing::error!(error = %e, destination = %destination.coordinate, "delivery quote failed");
        ApiError::new(rid, "internal_error", "could not compute delivery distance")
    })?;
    tracing::debug!(
        destination = %destination.coordinate,
        distance_km = quote.distance_km,
        tier = %quote.tier,
        "delivery quoted"
    );
    Ok(quote)
}

pub(super) async fn quote(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<QuoteRequest>,
) -> Result<Json<ApiResponse<QuoteResponse>>, ApiError> {
    let rid = &req_id.0;
    let destination =
        resolve_destination(&state, rid, body.latitude, body.longitude, body.address.as_deref())
            .await?;
    let quote = quote_destination(&state, rid, &destination)?;

    Ok(Json(ApiResponse {
        data: QuoteResponse {
            latitude: destination.coordinate.latitude(),
            longitude: destination.coordinate.longitude(),
            place_name: destination.place_name,
            distance_km: quote.distance_km,
            tier: quote.tier,
            fee: quote.fee(),
            deliverable: quote.is_deliverable(),
            message: quote.message(),
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
