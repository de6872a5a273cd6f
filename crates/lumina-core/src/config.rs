use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is set to an invalid value.
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
/// Returns `ConfigError` if a variable is set to an invalid value.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every setting has a default, so an empty environment yields a usable
/// development configuration.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let env = parse_environment(&or_default("LUMINA_ENV", "development"));
    let bind_addr = parse_addr("LUMINA_BIND_ADDR", "0.0.0.0:8000")?;
    let log_level = or_default("LUMINA_LOG_LEVEL", "info");
    let data_dir = PathBuf::from(or_default("LUMINA_DATA_DIR", "./artifacts"));
    let static_dir = lookup("LUMINA_STATIC_DIR")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from);

    let database_url = or_default("DATABASE_URL", "sqlite://lumina.db?mode=rwc");
    let db_max_connections = parse_u32("LUMINA_DB_MAX_CONNECTIONS", "5")?;
    if db_max_connections == 0 {
        return Err(invalid(
            "LUMINA_DB_MAX_CONNECTIONS",
            "must be at least 1".to_string(),
        ));
    }
    let db_acquire_timeout_secs = parse_u64("LUMINA_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let session_cookie_name = or_default("LUMINA_SESSION_COOKIE", "lumina_session");
    if !is_cookie_token(&session_cookie_name) {
        return Err(invalid(
            "LUMINA_SESSION_COOKIE",
            format!("'{session_cookie_name}' is not a valid cookie name"),
        ));
    }
    let session_ttl_secs = parse_u64("LUMINA_SESSION_TTL_SECS", "604800")?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        data_dir,
        static_dir,
        database_url,
        db_max_connections,
        db_acquire_timeout_secs,
        session_cookie_name,
        session_ttl_secs,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

fn is_cookie_token(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
