use farmdrop_core::GeoError;
use thiserror::Error;

/// Errors returned by the geocoding client.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The geocoding service answered with a non-2xx status.
    #[error("geocoding API returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The query was blank after trimming.
    #[error("address must not be empty")]
    EmptyQuery,

    /// The service found nothing for the address.
    #[error("no location found for address '{0}'")]
    NoMatch(String),

    /// The service returned a point outside valid latitude/longitude ranges.
    #[error("geocoder returned an invalid coordinate: {0}")]
    InvalidCoordinate(#[from] GeoError),

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL '{0}'")]
    InvalidBaseUrl(String),
}
