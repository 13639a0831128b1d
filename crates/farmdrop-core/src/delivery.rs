//! Delivery eligibility: distance from the farm mapped to a fee tier.
//!
//! Tier bands are half-open `[lower, upper)` intervals in kilometers that
//! partition `[0, ∞)`:
//!
//! | Band (km)            | Tier                          |
//! |----------------------|-------------------------------|
//! | `[0, 15.9325)`       | [`DeliveryTier::Free`]        |
//! | `[15.9325, 24.1402)` | [`DeliveryTier::FeeLow`]      |
//! | `[24.1402, 26.2)`    | [`DeliveryTier::FeeHigh`]     |
//! | `[26.2, ∞)`          | [`DeliveryTier::Unavailable`] |

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::{distance_km, Coordinate};

/// Upper bound (exclusive) of the free delivery band.
pub const FREE_MAX_KM: f64 = 15.9325;
/// Upper bound (exclusive) of the $5 band.
pub const FEE_LOW_MAX_KM: f64 = 24.1402;
/// Upper bound (exclusive) of the $10 band. At or beyond this we do not deliver.
pub const FEE_HIGH_MAX_KM: f64 = 26.2;

/// Farm latitude used when no origin is configured.
pub const DEFAULT_FARM_LATITUDE: f64 = 33.843_075_437_500_005;
/// Farm longitude used when no origin is configured.
pub const DEFAULT_FARM_LONGITUDE: f64 = -117.997_072;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum DeliveryError {
    #[error("invalid distance {0} km: must be finite and non-negative")]
    InvalidDistance(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryTier {
    Free,
    FeeLow,
    FeeHigh,
    Unavailable,
}

impl DeliveryTier {
    /// All tiers, nearest band first.
    pub const ALL: [DeliveryTier; 4] = [
        DeliveryTier::Free,
        DeliveryTier::FeeLow,
        DeliveryTier::FeeHigh,
        DeliveryTier::Unavailable,
    ];

    /// Delivery charge for this tier, or `None` when the tier is not deliverable.
    #[must_use]
    pub fn fee(self) -> Option<Decimal> {
        match self {
            DeliveryTier::Free => Some(Decimal::ZERO),
            DeliveryTier::FeeLow => Some(Decimal::new(500, 2)),
            DeliveryTier::FeeHigh => Some(Decimal::new(1000, 2)),
            DeliveryTier::Unavailable => None,
        }
    }

    #[must_use]
    pub fn is_deliverable(self) -> bool {
        self != DeliveryTier::Unavailable
    }

    /// Stable identifier used for persistence and JSON.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryTier::Free => "free",
            DeliveryTier::FeeLow => "fee_low",
            DeliveryTier::FeeHigh => "fee_high",
            DeliveryTier::Unavailable => "unavailable",
        }
    }
}

impl std::fmt::Display for DeliveryTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DeliveryTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeliveryTier::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown delivery tier '{s}'"))
    }
}

/// Customer-facing copy for a tier.
#[must_use]
pub fn delivery_message(tier: DeliveryTier) -> &'static str {
    match tier {
        DeliveryTier::Free => {
            "Order Received! You qualify for FREE delivery! We will reach out within 48 hours to confirm date and time of delivery."
        }
        DeliveryTier::FeeLow => {
            "Order Received! You qualify for $5 delivery! We will reach out within 48 hours to confirm date and time of delivery."
        }
        DeliveryTier::FeeHigh => {
            "Order Received! You qualify for $10 delivery! We will reach out within 48 hours to confirm date and time of delivery."
        }
        DeliveryTier::Unavailable => {
            "We are sorry, we don't currently deliver to this area. We will reach out to schedule a pick up time or to cancel your order."
        }
    }
}

/// Maps a distance in kilometers to its delivery tier.
///
/// # Errors
///
/// Returns [`DeliveryError::InvalidDistance`] for negative, NaN, or infinite
/// input.
pub fn classify(distance_km: f64) -> Result<DeliveryTier, DeliveryError> {
    if !distance_km.is_finite() || distance_km < 0.0 {
        return Err(DeliveryError::InvalidDistance(distance_km));
    }

    let tier = if distance_km < FREE_MAX_KM {
        DeliveryTier::Free
    } else if distance_km < FEE_LOW_MAX_KM {
        DeliveryTier::FeeLow
    } else if distance_km < FEE_HIGH_MAX_KM {
        DeliveryTier::FeeHigh
    } else {
        DeliveryTier::Unavailable
    };
    Ok(tier)
}

/// Result of quoting a destination.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DeliveryQuote {
    pub distance_km: f64,
    pub tier: DeliveryTier,
}

impl DeliveryQuote {
    #[must_use]
    pub fn fee(&self) -> Option<Decimal> {
        self.tier.fee()
    }

    #[must_use]
    pub fn message(&self) -> &'static str {
        delivery_message(self.tier)
    }

    #[must_use]
    pub fn is_deliverable(&self) -> bool {
        self.tier.is_deliverable()
    }
}

/// Quotes delivery for destinations relative to a fixed origin.
///
/// Holds no mutable state; copy it freely across request handlers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeliveryEngine {
    origin: Coordinate,
}

impl DeliveryEngine {
    #[must_use]
    pub fn new(origin: Coordinate) -> Self {
        Self { origin }
    }

    #[must_use]
    pub fn origin(&self) -> Coordinate {
        self.origin
    }

    #[must_use]
    pub fn distance_to(&self, destination: Coordinate) -> f64 {
        distance_km(self.origin, destination)
    }

    /// Computes distance and tier for `destination`.
    ///
    /// The engine only classifies; rejecting undeliverable orders is up to
    /// the caller.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::InvalidDistance`] if the computed distance is
    /// not a finite non-negative number.
    pub fn quote(&self, destination: Coordinate) -> Result<DeliveryQuote, DeliveryError> {
        let distance_km = self.distance_to(destination);
        let tier = classify(distance_km)?;
        Ok(DeliveryQuote { distance_km, tier })
    }
}

impl Default for DeliveryEngine {
    fn default() -> Self {
        Self {
            origin: default_farm_origin(),
        }
    }
}

/// The farm location used when none is configured.
#[must_use]
pub fn default_farm_origin() -> Coordinate {
    match Coordinate::new(DEFAULT_FARM_LATITUDE, DEFAULT_FARM_LONGITUDE) {
        Ok(c) => c,
        Err(_) => unreachable!("default farm coordinate is within range"),
    }
}

#[cfg(test)]
#[path = "delivery_test.rs"]
mod tests;
