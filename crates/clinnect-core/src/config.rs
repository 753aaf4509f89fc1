use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use crate::app_config::{AppConfig, Environment};
use crate::geo::Coordinate;
use crate::ConfigError;

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

/// Parse `raw` as `T`, reporting failures against the variable name.
fn parse_value<T>(var: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason: e.to_string(),
    })
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so tests can use a `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("CLINNECT_ENV", "development"))?;

    let bind_addr: SocketAddr = parse_value(
        "CLINNECT_BIND_ADDR",
        &or_default("CLINNECT_BIND_ADDR", "0.0.0.0:5000"),
    )?;
    let log_level = or_default("CLINNECT_LOG_LEVEL", "info");
    let providers_path = PathBuf::from(or_default(
        "CLINNECT_PROVIDERS_PATH",
        "./config/providers.yaml",
    ));

    let db_max_connections: u32 = parse_value(
        "CLINNECT_DB_MAX_CONNECTIONS",
        &or_default("CLINNECT_DB_MAX_CONNECTIONS", "10"),
    )?;
    let db_min_connections: u32 = parse_value(
        "CLINNECT_DB_MIN_CONNECTIONS",
        &or_default("CLINNECT_DB_MIN_CONNECTIONS", "1"),
    )?;
    let db_acquire_timeout_secs: u64 = parse_value(
        "CLINNECT_DB_ACQUIRE_TIMEOUT_SECS",
        &or_default("CLINNECT_DB_ACQUIRE_TIMEOUT_SECS", "10"),
    )?;

    let upstream_timeout_secs: u64 = parse_value(
        "CLINNECT_UPSTREAM_TIMEOUT_SECS",
        &or_default("CLINNECT_UPSTREAM_TIMEOUT_SECS", "8"),
    )?;
    if upstream_timeout_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "CLINNECT_UPSTREAM_TIMEOUT_SECS".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    let user_agent = or_default("CLINNECT_USER_AGENT", "clinnect/0.1 (provider-search)");
    let osrm_base_url = or_default("CLINNECT_OSRM_BASE_URL", "https://router.project-osrm.org");
    let nominatim_base_url = or_default(
        "CLINNECT_NOMINATIM_BASE_URL",
        "https://nominatim.openstreetmap.org",
    );

    let search_radius_km: f64 = parse_value(
        "CLINNECT_SEARCH_RADIUS_KM",
        &or_default("CLINNECT_SEARCH_RADIUS_KM", "5"),
    )?;
    if !search_radius_km.is_finite() || search_radius_km <= 0.0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "CLINNECT_SEARCH_RADIUS_KM".to_string(),
            reason: format!("must be a positive number of kilometres, got {search_radius_km}"),
        });
    }
    let default_origin: Coordinate = parse_value(
        "CLINNECT_DEFAULT_ORIGIN",
        &or_default("CLINNECT_DEFAULT_ORIGIN", "51.505,-0.09"),
    )?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        providers_path,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        upstream_timeout_secs,
        user_agent,
        osrm_base_url,
        nominatim_base_url,
        search_radius_km,
        default_origin,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvVar`] for anything other than
/// `development`, `test` or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "CLINNECT_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
