//! Configuration loading from an optional TOML file and the environment.

use std::fmt::Display;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::config::schema::ServerConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable naming an optional TOML base file.
pub const CONFIG_FILE_ENV: &str = "DREPT_CONFIG";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from the process environment.
///
/// When `DREPT_CONFIG` names a file it is parsed first; every recognised
/// environment variable then overrides the corresponding field.
pub fn load() -> Result<ServerConfig, ConfigError> {
    let base = match std::env::var(CONFIG_FILE_ENV) {
        Ok(path) => read_file(Path::new(&path))?,
        Err(_) => ServerConfig::default(),
    };
    from_lookup(base, |key| std::env::var(key).ok())
}

/// Load and validate configuration from a TOML file, without env overrides.
pub fn load_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    let config = read_file(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Apply variables from `lookup` on top of `base`, then validate.
pub fn from_lookup<F>(mut base: ServerConfig, lookup: F) -> Result<ServerConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    apply_env(&mut base, &lookup);
    validate_config(&base).map_err(ConfigError::Validation)?;
    Ok(base)
}

fn read_file(path: &Path) -> Result<ServerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

fn apply_env<F>(config: &mut ServerConfig, lookup: &F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup("PORT") {
        config.port = parse_or(&raw, "PORT", config.port);
    }

    if let Some(raw) = lookup("ALLOWED_ORIGINS") {
        config.allowed_origins = split_origins(&raw);
    }

    if let Some(raw) = lookup("RATE_LIMIT_WINDOW_MS") {
        config.rate_limit.window_ms = parse_nonzero_or(&raw, "RATE_LIMIT_WINDOW_MS", config.rate_limit.window_ms);
    }

    if let Some(raw) = lookup("RATE_LIMIT_MAX_REQUESTS") {
        config.rate_limit.max_requests =
            parse_nonzero_or(&raw, "RATE_LIMIT_MAX_REQUESTS", config.rate_limit.max_requests);
    }

    if let Some(raw) = lookup("ENABLE_CRON_JOBS") {
        config.enable_cron_jobs = raw == "true";
    }

    if let Some(raw) = lookup("NODE_ENV") {
        config.environment = Some(raw);
    }

    if let Some(raw) = lookup("API_BASE_URL").filter(|v| !v.is_empty()) {
        config.api_base_url = Some(raw);
    }

    if let Some(raw) = lookup("DATABASE_URL") {
        config.database.url = raw;
    }

    if let Some(raw) = lookup("DATABASE_CONNECT_TIMEOUT_SECS") {
        config.database.connect_timeout_secs = parse_nonzero_or(
            &raw,
            "DATABASE_CONNECT_TIMEOUT_SECS",
            config.database.connect_timeout_secs,
        );
    }

    if let Some(raw) = lookup("TRUST_PROXY") {
        config.trust_proxy = raw == "true";
    }

    if let Some(raw) = lookup("SHUTDOWN_TIMEOUT_SECS") {
        config.shutdown_timeout_secs = parse_or(&raw, "SHUTDOWN_TIMEOUT_SECS", config.shutdown_timeout_secs);
    }

    if let Some(raw) = lookup("HEARTBEAT_CRON") {
        config.jobs.heartbeat_cron = raw;
    }
}

/// Split a comma-separated origin list, dropping blank entries.
fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_or<T>(raw: &str, key: &str, default: T) -> T
where
    T: FromStr + Display + Copy,
{
    match raw.trim().parse::<T>() {
        Ok(value) => value,
        Err(_) => {
            tracing::warn!(key, value = raw, default = %default, "Invalid numeric setting, using default");
            default
        }
    }
}

/// Zero counts as unset, the same as an unparsable value.
fn parse_nonzero_or<T>(raw: &str, key: &str, default: T) -> T
where
    T: FromStr + Display + Copy + PartialEq + Default,
{
    match raw.trim().parse::<T>() {
        Ok(value) if value != T::default() => value,
        _ => {
            tracing::warn!(key, value = raw, default = %default, "Invalid numeric setting, using default");
            default
        }
    }
}
