//! Wire types for the Mapbox forward-geocoding response.

use farmdrop_core::Coordinate;
use serde::Deserialize;

/// Top-level `FeatureCollection` envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Feature {
    /// `[longitude, latitude]`, GeoJSON order.
    pub center: [f64; 2],
    #[serde(default)]
    pub place_name: Option<String>,
    #[serde(default)]
    pub relevance: Option<f64>,
}

/// Error body Mapbox sends with 4xx/5xx responses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: String,
}

/// A resolved address.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedAddress {
    pub coordinate: Coordinate,
    /// Canonical place name as formatted by the geocoder.
    pub place_name: String,
    /// Match confidence in `[0, 1]`, when the service reports one.
    pub relevance: Option<f64>,
}
