use crate::app_config::{AppConfig, Environment};
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

/// Build application configuration using the provided env-var lookup function.
///
/// Parsing is decoupled from the real environment so tests can drive it with
/// a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::str::FromStr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    fn parse_num<T>(var: &str, raw: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        raw.parse::<T>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    }

    let database_url = require("DATABASE_URL")?;
    let google_maps_api_key = require("GOOGLE_MAPS_API_KEY")?;
    let claude_api_key = require("CLAUDE_API_KEY")?;

    let env = parse_environment(&or_default("COFFEEHAUS_ENV", "development"))?;

    let bind_addr = parse("COFFEEHAUS_BIND_ADDR", "0.0.0.0:8080")?;
    let log_level = or_default("COFFEEHAUS_LOG_LEVEL", "info");

    let db_max_connections = parse_num(
        "COFFEEHAUS_DB_MAX_CONNECTIONS",
        &or_default("COFFEEHAUS_DB_MAX_CONNECTIONS", "10"),
    )?;
    let db_min_connections = parse_num(
        "COFFEEHAUS_DB_MIN_CONNECTIONS",
        &or_default("COFFEEHAUS_DB_MIN_CONNECTIONS", "1"),
    )?;
    let db_acquire_timeout_secs = parse_num(
        "COFFEEHAUS_DB_ACQUIRE_TIMEOUT_SECS",
        &or_default("COFFEEHAUS_DB_ACQUIRE_TIMEOUT_SECS", "10"),
    )?;

    let places_timeout_secs = parse_num(
        "COFFEEHAUS_PLACES_TIMEOUT_SECS",
        &or_default("COFFEEHAUS_PLACES_TIMEOUT_SECS", "15"),
    )?;
    let places_max_results = parse_num(
        "COFFEEHAUS_PLACES_MAX_RESULTS",
        &or_default("COFFEEHAUS_PLACES_MAX_RESULTS", "10"),
    )?;
    let places_max_retries = parse_num(
        "COFFEEHAUS_PLACES_MAX_RETRIES",
        &or_default("COFFEEHAUS_PLACES_MAX_RETRIES", "2"),
    )?;

    let classifier_model = or_default("COFFEEHAUS_CLASSIFIER_MODEL", "claude-3-5-sonnet-latest");
    let classifier_timeout_secs = parse_num(
        "COFFEEHAUS_CLASSIFIER_TIMEOUT_SECS",
        &or_default("COFFEEHAUS_CLASSIFIER_TIMEOUT_SECS", "20"),
    )?;

    let directory_timeout_secs: u64 = parse_num(
        "COFFEEHAUS_DIRECTORY_TIMEOUT_SECS",
        &or_default("COFFEEHAUS_DIRECTORY_TIMEOUT_SECS", "30"),
    )?;
    if directory_timeout_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "COFFEEHAUS_DIRECTORY_TIMEOUT_SECS".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }

    let search_cache_ttl_secs = parse_num(
        "COFFEEHAUS_SEARCH_CACHE_TTL_SECS",
        &or_default("COFFEEHAUS_SEARCH_CACHE_TTL_SECS", "21600"),
    )?;

    let sync_update_chunk_size: usize = parse_num(
        "COFFEEHAUS_SYNC_UPDATE_CHUNK_SIZE",
        &or_default("COFFEEHAUS_SYNC_UPDATE_CHUNK_SIZE", "25"),
    )?;
    if sync_update_chunk_size == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "COFFEEHAUS_SYNC_UPDATE_CHUNK_SIZE".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        google_maps_api_key,
        claude_api_key,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        places_timeout_secs,
        places_max_results,
        places_max_retries,
        classifier_model,
        classifier_timeout_secs,
        directory_timeout_secs,
        search_cache_ttl_secs,
        sync_update_chunk_size,
    })
}

fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "COFFEEHAUS_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
