use std::net::SocketAddr;
use std::path::PathBuf;

use crate::geo::Coordinate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub foods_path: PathBuf,
    pub session_secret: String,
    pub session_ttl_secs: u64,
    pub mapbox_access_token: Option<String>,
    pub farm_origin: Coordinate,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub geocode_timeout_secs: u64,
    pub geocode_max_retries: u32,
    pub geocode_retry_backoff_ms: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("foods_path", &self.foods_path)
            .field("database_url", &"[redacted]")
            .field("session_secret", &"[redacted]")
            .field("session_ttl_secs", &self.session_ttl_secs)
            .field(
                "mapbox_access_token",
                &self.mapbox_access_token.as_ref().map(|_| "[redacted]"),
            )
            .field("farm_origin", &self.farm_origin)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("geocode_timeout_secs", &self.geocode_timeout_secs)
            .field("geocode_max_retries", &self.geocode_max_retries)
            .field("geocode_retry_backoff_ms", &self.geocode_retry_backoff_ms)
            .finish()
    }
}

/// The subset of settings needed to quote a delivery without a database or
/// session secret.
#[derive(Clone)]
pub struct QuoteConfig {
    pub farm_origin: Coordinate,
    pub mapbox_access_token: Option<String>,
    pub geocode_timeout_secs: u64,
    pub geocode_max_retries: u32,
    pub geocode_retry_backoff_ms: u64,
}

impl std::fmt::Debug for QuoteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuoteConfig")
            .field("farm_origin", &self.farm_origin)
            .field(
                "mapbox_access_token",
                &self.mapbox_access_token.as_ref().map(|_| "[redacted]"),
            )
            .field("geocode_timeout_secs", &self.geocode_timeout_secs)
            .field("geocode_max_retries", &self.geocode_max_retries)
            .field("geocode_retry_backoff_ms", &self.geocode_retry_backoff_ms)
            .finish()
    }
}

impl From<&AppConfig> for QuoteConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            farm_origin: config.farm_origin,
            mapbox_access_token: config.mapbox_access_token.clone(),
            geocode_timeout_secs: config.geocode_timeout_secs,
            geocode_max_retries: config.geocode_max_retries,
            geocode_retry_backoff_ms: config.geocode_retry_backoff_ms,
        }
    }
}
