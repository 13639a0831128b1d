//! HTTP client for the Mapbox forward-geocoding API.
//!
//! Resolves a free-form postal address to a [`Coordinate`] by taking the
//! best-ranked feature of `GET /geocoding/v5/mapbox.places/{query}.json`.

use std::time::Duration;

use async_trait::async_trait;
use farmdrop_core::Coordinate;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::{Client, Url};

use crate::error::GeocodeError;
use crate::retry::retry_with_backoff;
use crate::types::{ErrorBody, FeatureCollection, GeocodedAddress};
use crate::Geocoder;

const DEFAULT_BASE_URL: &str = "https://api.mapbox.com/";
const DEFAULT_MAX_RETRIES: u32 = 2;
const DEFAULT_BACKOFF_BASE_MS: u64 = 500;

/// Client for Mapbox forward geocoding.
///
/// Use [`MapboxClient::new`] for production or [`MapboxClient::with_base_url`]
/// to point at a mock server in tests.
pub struct MapboxClient {
    client: Client,
    access_token: String,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl std::fmt::Debug for MapboxClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapboxClient")
            .field("access_token", &"[redacted]")
            .field("base_url", &self.base_url.as_str())
            .field("max_retries", &self.max_retries)
            .field("backoff_base_ms", &self.backoff_base_ms)
            .finish_non_exhaustive()
    }
}

impl MapboxClient {
    /// Creates a client pointed at the production Mapbox API.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(access_token: &str, timeout_secs: u64) -> Result<Self, GeocodeError> {
        Self::with_base_url(access_token, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the `reqwest::Client` cannot be
    /// built, or [`GeocodeError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        access_token: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(5))
            .user_agent("farmdrop/0.1 (delivery-geocoding)")
            .build()?;

        // Exactly one trailing slash so relative joins append instead of replace.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url =
            Url::parse(&normalised).map_err(|e| GeocodeError::InvalidBaseUrl(format!("{base_url}: {e}")))?;

        Ok(Self {
            client,
            access_token: access_token.to_owned(),
            base_url,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
        })
    }

    /// Overrides the retry policy for transient failures.
    #[must_use]
    pub fn with_retry(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Resolves `address` to its best-matching location.
    ///
    /// # Errors
    ///
    /// - [`GeocodeError::EmptyQuery`] if `address` is blank.
    /// - [`GeocodeError::NoMatch`] if the service returns no features.
    /// - [`GeocodeError::Api`] / [`GeocodeError::Http`] on HTTP failures
    ///   (transient ones are retried first).
    /// - [`GeocodeError::Deserialize`] on an unexpected body shape.
    /// - [`GeocodeError::InvalidCoordinate`] if the returned center is out of range.
    pub async fn forward(&self, address: &str) -> Result<GeocodedAddress, GeocodeError> {
        let query = address.trim();
        if query.is_empty() {
            return Err(GeocodeError::EmptyQuery);
        }

        let url = self.build_url(query)?;
        let collection: FeatureCollection =
            retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
                self.request_json(&url, query)
            })
            .await?;

        let feature = collection
            .features
            .into_iter()
            .next()
            .ok_or_else(|| GeocodeError::NoMatch(query.to_owned()))?;

        let [longitude, latitude] = feature.center;
        let coordinate = Coordinate::new(latitude, longitude)?;

        tracing::debug!(%coordinate, relevance = ?feature.relevance, "geocoded address");

        Ok(GeocodedAddress {
            coordinate,
            place_name: feature.place_name.unwrap_or_else(|| query.to_owned()),
            relevance: feature.relevance,
        })
    }

    /// Builds the forward-geocoding URL with the address percent-encoded as a
    /// single path segment.
    fn build_url(&self, query: &str) -> Result<Url, GeocodeError> {
        let encoded = utf8_percent_encode(query, NON_ALPHANUMERIC);
        let mut url = self
            .base_url
            .join(&format!("geocoding/v5/mapbox.places/{encoded}.json"))
            .map_err(|e| GeocodeError::InvalidBaseUrl(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("access_token", &self.access_token)
            .append_pair("limit", "1")
            .append_pair("autocomplete", "false");
        Ok(url)
    }

    /// Sends a GET, maps non-2xx statuses to [`GeocodeError::Api`], and
    /// parses the body.
    async fn request_json(
        &self,
        url: &Url,
        query: &str,
    ) -> Result<FeatureCollection, GeocodeError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map_or_else(|_| body.chars().take(200).collect(), |e| e.message);
            return Err(GeocodeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| GeocodeError::Deserialize {
            context: format!("forward geocode '{query}'"),
            source: e,
        })
    }
}

#[async_trait]
impl Geocoder for MapboxClient {
    async fn forward(&self, address: &str) -> Result<GeocodedAddress, GeocodeError> {
        MapboxClient::forward(self, address).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(base_url: &str) -> MapboxClient {
        MapboxClient::with_base_url("pk.test", 10, base_url)
            .expect("client construction should not fail")
    }

    #[test]
    fn debug_output_redacts_access_token() {
        let debug = format!("{:?}", test_client("https://api.mapbox.com"));
        assert!(!debug.contains("pk.test"));
        assert!(debug.contains("[redacted]"));
    }

    #[test]
    fn build_url_places_address_in_path() {
        let client = test_client("https://api.mapbox.com");
        let url = client.build_url("Anaheim").expect("url");
        assert_eq!(
            url.as_str(),
            "https://api.mapbox.com/geocoding/v5/mapbox.places/Anaheim.json?access_token=pk.test&limit=1&autocomplete=false"
        );
    }

    #[test]
    fn build_url_encodes_spaces_and_slashes() {
        let client = test_client("https://api.mapbox.com/");
        let url = client.build_url("12 Main St / Unit 4").expect("url");
        assert!(
            url.path().ends_with("12%20Main%20St%20%2F%20Unit%204.json"),
            "path should be percent-encoded: {url}"
        );
    }

    #[test]
    fn build_url_keeps_base_path_prefix() {
        let client = test_client("http://localhost:9999/proxy");
        let url = client.build_url("x").expect("url");
        assert!(url.path().starts_with("/proxy/geocoding/v5/"), "{url}");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = MapboxClient::with_base_url("pk.test", 10, "not a url");
        assert!(matches!(result, Err(GeocodeError::InvalidBaseUrl(_))));
    }

    #[tokio::test]
    async fn blank_address_is_rejected_without_request() {
        let client = test_client("http://127.0.0.1:1");
        let result = client.forward("   ").await;
        assert!(matches!(result, Err(GeocodeError::EmptyQuery)));
    }
}
