pub mod app_config;
pub mod config;
pub mod delivery;
pub mod foods;
pub mod geo;
pub mod orders;

use thiserror::Error;

pub use app_config::{AppConfig, Environment, QuoteConfig};
pub use config::{load_app_config, load_app_config_from_env, load_quote_config};
pub use delivery::{
    classify, default_farm_origin, delivery_message, DeliveryEngine, DeliveryError,
    DeliveryQuote, DeliveryTier,
};
pub use foods::{load_foods, slug_from_name, FoodConfig, FoodsFile};
pub use geo::{distance_km, to_radians, Coordinate, GeoError};
pub use orders::OrderStatus;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read foods file {path}: {source}")]
    FoodsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse foods file: {0}")]
    FoodsFileParse(#[source] serde_yaml::Error),

    #[error("foods validation failed: {0}")]
    Validation(String),
}
