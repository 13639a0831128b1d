//! Address geocoding for delivery quotes.
//!
//! [`MapboxClient`] resolves postal addresses through the Mapbox API. The
//! server depends on the [`Geocoder`] trait so tests can substitute a fixed
//! lookup table.

pub mod client;
pub mod error;
pub(crate) mod retry;
pub mod types;

use async_trait::async_trait;

pub use client::MapboxClient;
pub use error::GeocodeError;
pub use types::GeocodedAddress;

/// Forward geocoding: free-form address in, best-matching location out.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// # Errors
    ///
    /// Returns [`GeocodeError`] when the address cannot be resolved.
    async fn forward(&self, address: &str) -> Result<GeocodedAddress, GeocodeError>;
}
