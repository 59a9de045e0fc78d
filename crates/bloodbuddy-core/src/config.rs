use crate::app_config::{AppConfig, Environment};
use crate::donors::ResultLimit;
use crate::ConfigError;

pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_ROUTER_URL: &str = "https://router.project-osrm.org";
pub const DEFAULT_TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const DEFAULT_USER_AGENT: &str = "BloodBuddyApp/1.0";

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
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
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

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| invalid(var, e.to_string()))
    };

    let parse_nonzero_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        match parse_u64(var, default)? {
            0 => Err(invalid(var, "must be greater than zero".to_string())),
            value => Ok(value),
        }
    };

    let parse_url = |var: &str, default: &str| -> Result<String, ConfigError> {
        let raw = or_default(var, default);
        if raw.starts_with("http://") || raw.starts_with("https://") {
            Ok(raw.trim_end_matches('/').to_string())
        } else {
            Err(invalid(var, format!("expected an http(s) URL, got '{raw}'")))
        }
    };

    let api_url = require("BLOODBUDDY_API_URL")?;
    if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
        return Err(invalid(
            "BLOODBUDDY_API_URL",
            format!("expected an http(s) URL, got '{api_url}'"),
        ));
    }
    let api_url = api_url.trim_end_matches('/').to_string();

    let env = parse_environment(&or_default("BLOODBUDDY_ENV", "development"))?;
    let log_level = or_default("BLOODBUDDY_LOG_LEVEL", "info");
    let geocoder_url = parse_url("BLOODBUDDY_GEOCODER_URL", DEFAULT_GEOCODER_URL)?;
    let router_url = parse_url("BLOODBUDDY_ROUTER_URL", DEFAULT_ROUTER_URL)?;

    let tile_url = or_default("BLOODBUDDY_TILE_URL", DEFAULT_TILE_URL);
    if !["{z}", "{x}", "{y}"].iter().all(|p| tile_url.contains(p)) {
        return Err(invalid(
            "BLOODBUDDY_TILE_URL",
            "template must contain {z}, {x} and {y}".to_string(),
        ));
    }

    let user_agent = or_default("BLOODBUDDY_USER_AGENT", DEFAULT_USER_AGENT);
    let request_timeout_secs = parse_nonzero_u64("BLOODBUDDY_REQUEST_TIMEOUT_SECS", "30")?;
    let geolocation_timeout_ms = parse_nonzero_u64("BLOODBUDDY_GEOLOCATION_TIMEOUT_MS", "10000")?;

    let refresh_threshold_km = {
        let var = "BLOODBUDDY_REFRESH_THRESHOLD_KM";
        let raw = or_default(var, "0.5");
        let value = raw.parse::<f64>().map_err(|e| invalid(var, e.to_string()))?;
        if !value.is_finite() || value <= 0.0 {
            return Err(invalid(var, format!("must be a positive number, got {raw}")));
        }
        value
    };

    let default_limit = {
        let var = "BLOODBUDDY_DEFAULT_LIMIT";
        let raw = parse_u64(var, "10")?;
        u32::try_from(raw)
            .ok()
            .and_then(|n| ResultLimit::try_from(n).ok())
            .ok_or_else(|| invalid(var, format!("expected 10, 20, 50 or 100, got {raw}")))?
    };

    Ok(AppConfig {
        api_url,
        env,
        log_level,
        geocoder_url,
        router_url,
        tile_url,
        user_agent,
        request_timeout_secs,
        geolocation_timeout_ms,
        refresh_threshold_km,
        default_limit,
    })
}

fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "BLOODBUDDY_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
