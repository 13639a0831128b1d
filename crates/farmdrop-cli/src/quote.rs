//! Offline delivery quotes. Only the farm origin and, for address lookups,
//! a Mapbox token are needed.

use farmdrop_core::{Coordinate, DeliveryEngine, DeliveryQuote, QuoteConfig};
use farmdrop_geocode::MapboxClient;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum QuoteTarget {
    Point { lat: f64, lon: f64 },
    Address(String),
}

/// Resolve the target, quote it from the configured farm origin, and print
/// the result.
///
/// # Errors
///
/// Returns an error for out-of-range coordinates, or when an address is given
/// but geocoding is not configured or fails.
pub(crate) async fn run_quote(config: &QuoteConfig, target: QuoteTarget) -> anyhow::Result<()> {
    let (destination, place_name) = match target {
        QuoteTarget::Point { lat, lon } => (Coordinate::new(lat, lon)?, None),
        QuoteTarget::Address(address) => {
            let client = build_client(config)?;
            let found = client.forward(&address).await?;
            (found.coordinate, Some(found.place_name))
        }
    };

    let engine = DeliveryEngine::new(config.farm_origin);
    let quote = engine.quote(destination)?;
    tracing::debug!(%destination, distance_km = quote.distance_km, tier = %quote.tier, "quoted");

    if let Some(place) = place_name {
        println!("{place}");
    }
    println!("{}", render(&quote));
    Ok(())
}

fn build_client(config: &QuoteConfig) -> anyhow::Result<MapboxClient> {
    let token = config
        .mapbox_access_token
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("MAPBOX_ACCESS_TOKEN must be set to quote by address"))?;
    Ok(MapboxClient::new(token, config.geocode_timeout_secs)?
        .with_retry(config.geocode_max_retries, config.geocode_retry_backoff_ms))
}

fn render(quote: &DeliveryQuote) -> String {
    let fee = quote
        .fee()
        .map_or_else(|| "n/a".to_string(), |fee| format!("${fee:.2}"));
    format!(
        "distance: {:.2} km\ntier: {}\nfee: {fee}\n{}",
        quote.distance_km,
        quote.tier,
        quote.message()
    )
}
