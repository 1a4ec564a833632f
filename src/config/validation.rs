//! Configuration validation.
//!
//! Serde handles syntax; this module checks values that parse but cannot
//! work at runtime. All errors are collected rather than stopping at the
//! first one.

use axum::http::HeaderValue;
use url::Url;

use crate::config::schema::ServerConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("allowed origin {0:?} is not a scheme://host[:port] origin")]
    InvalidOrigin(String),

    #[error("allowed origin \"*\" cannot be combined with credentialed CORS")]
    WildcardOrigin,

    #[error("API_BASE_URL {0:?} is not an absolute URL")]
    InvalidBaseUrl(String),

    #[error("database URL is empty")]
    EmptyDatabaseUrl,

    #[error("heartbeat cron expression is empty")]
    EmptyCronExpression,

    #[error("rate limit {0} must be greater than zero")]
    ZeroRateLimit(&'static str),
}

pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for origin in &config.allowed_origins {
        if let Some(err) = check_origin(origin) {
            errors.push(err);
        }
    }

    if let Some(base) = &config.api_base_url {
        if Url::parse(base).map(|u| u.cannot_be_a_base()).unwrap_or(true) {
            errors.push(ValidationError::InvalidBaseUrl(base.clone()));
        }
    }

    if config.rate_limit.window_ms == 0 {
        errors.push(ValidationError::ZeroRateLimit("window_ms"));
    }
    if config.rate_limit.max_requests == 0 {
        errors.push(ValidationError::ZeroRateLimit("max_requests"));
    }

    if config.database.url.trim().is_empty() {
        errors.push(ValidationError::EmptyDatabaseUrl);
    }

    if config.enable_cron_jobs && config.jobs.heartbeat_cron.trim().is_empty() {
        errors.push(ValidationError::EmptyCronExpression);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_origin(origin: &str) -> Option<ValidationError> {
    if origin == "*" {
        return Some(ValidationError::WildcardOrigin);
    }

    let invalid = || Some(ValidationError::InvalidOrigin(origin.to_string()));

    let Ok(url) = Url::parse(origin) else {
        return invalid();
    };
    if url.host_str().is_none() || HeaderValue::from_str(origin).is_err() {
        return invalid();
    }
    // An origin carries no path, query or fragment.
    if origin.trim_end_matches('/') != url.origin().ascii_serialization() {
        return invalid();
    }
    None
}
