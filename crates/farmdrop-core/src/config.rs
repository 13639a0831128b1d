use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use crate::app_config::{AppConfig, Environment, QuoteConfig};
use crate::delivery::{DEFAULT_FARM_LATITUDE, DEFAULT_FARM_LONGITUDE};
use crate::geo::Coordinate;
use crate::ConfigError;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Load only the delivery-quote settings (farm origin and geocoding).
///
/// Needs neither `DATABASE_URL` nor a session secret.
///
/// # Errors
///
/// Returns `ConfigError` if a present value is invalid.
pub fn load_quote_config() -> Result<QuoteConfig, ConfigError> {
    dotenvy::dotenv().ok();
    build_quote_config(|key| std::env::var(key))
}

fn build_quote_config<F>(lookup: F) -> Result<QuoteConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    Ok(QuoteConfig {
        farm_origin: parse_farm_origin(&lookup)?,
        mapbox_access_token: parse_mapbox_token(&lookup),
        geocode_timeout_secs: parse_or(&lookup, "FARMDROP_GEOCODE_TIMEOUT_SECS", "10")?,
        geocode_max_retries: parse_or(&lookup, "FARMDROP_GEOCODE_MAX_RETRIES", "2")?,
        geocode_retry_backoff_ms: parse_or(&lookup, "FARMDROP_GEOCODE_RETRY_BACKOFF_MS", "500")?,
    })
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it from a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let database_url = require("DATABASE_URL")?;
    // SECRET_SESSION is the legacy name and is still honored.
    let session_secret = require("FARMDROP_SESSION_SECRET")
        .or_else(|e| require("SECRET_SESSION").map_err(|_| e))?;

    let env = parse_environment(&or_default("FARMDROP_ENV", "development"))?;

    let bind_addr = match lookup("FARMDROP_BIND_ADDR") {
        Ok(raw) => parse_value::<SocketAddr>("FARMDROP_BIND_ADDR", &raw)?,
        Err(_) => {
            let mut addr = parse_value::<SocketAddr>("FARMDROP_BIND_ADDR", DEFAULT_BIND_ADDR)?;
            if let Ok(port) = lookup("PORT") {
                addr.set_port(parse_value::<u16>("PORT", &port)?);
            }
            addr
        }
    };

    let log_level = or_default("FARMDROP_LOG_LEVEL", "info");
    let foods_path = PathBuf::from(or_default("FARMDROP_FOODS_PATH", "./config/foods.yaml"));
    let mapbox_access_token = parse_mapbox_token(&lookup);

    let farm_origin = parse_farm_origin(&lookup)?;

    let session_ttl_secs: u64 = parse_or(&lookup, "FARMDROP_SESSION_TTL_SECS", "86400")?;

    let db_max_connections: u32 = parse_or(&lookup, "FARMDROP_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections: u32 = parse_or(&lookup, "FARMDROP_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs: u64 = parse_or(&lookup, "FARMDROP_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let geocode_timeout_secs: u64 = parse_or(&lookup, "FARMDROP_GEOCODE_TIMEOUT_SECS", "10")?;
    let geocode_max_retries: u32 = parse_or(&lookup, "FARMDROP_GEOCODE_MAX_RETRIES", "2")?;
    let geocode_retry_backoff_ms: u64 = parse_or(&lookup, "FARMDROP_GEOCODE_RETRY_BACKOFF_MS", "500")?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        foods_path,
        session_secret,
        session_ttl_secs,
        mapbox_access_token,
        farm_origin,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        geocode_timeout_secs,
        geocode_max_retries,
        geocode_retry_backoff_ms,
    })
}

fn parse_value<T>(var: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
}

fn parse_or<T, F>(lookup: &F, var: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let raw = lookup(var).unwrap_or_else(|_| default.to_string());
    parse_value(var, &raw)
}

fn parse_mapbox_token<F>(lookup: &F) -> Option<String>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    lookup("MAPBOX_ACCESS_TOKEN")
        .ok()
        .filter(|t| !t.trim().is_empty())
}

fn parse_farm_origin<F>(lookup: &F) -> Result<Coordinate, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let latitude = match lookup("FARMDROP_FARM_LAT") {
        Ok(raw) => parse_value::<f64>("FARMDROP_FARM_LAT", &raw)?,
        Err(_) => DEFAULT_FARM_LATITUDE,
    };
    let longitude = match lookup("FARMDROP_FARM_LON") {
        Ok(raw) => parse_value::<f64>("FARMDROP_FARM_LON", &raw)?,
        Err(_) => DEFAULT_FARM_LONGITUDE,
    };

    Coordinate::new(latitude, longitude).map_err(|e| ConfigError::InvalidEnvVar {
        var: "FARMDROP_FARM_LAT/FARMDROP_FARM_LON".to_string(),
        reason: e.to_string(),
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "FARMDROP_ENV".to_string(),
            reason: format!("expected development, test, or production; got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
