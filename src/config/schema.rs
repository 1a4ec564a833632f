//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the API server.
//! All types derive Serde traits so a TOML file can provide a base layer that
//! environment variables then override.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fixed ceiling for JSON and URL-encoded request bodies (10 MiB).
pub const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// Origin allowed when `ALLOWED_ORIGINS` is not set.
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// Root configuration for the API server.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// TCP port the listener binds on all interfaces.
    pub port: u16,

    /// Cross-origin allow-list.
    pub allowed_origins: Vec<String>,

    /// Per-IP admission control for `/api`.
    pub rate_limit: RateLimitConfig,

    /// Start background scheduled jobs after the database is up.
    pub enable_cron_jobs: bool,

    /// Deployment environment name (`NODE_ENV`). `None` when unset.
    pub environment: Option<String>,

    /// Public base URL announced in the startup log.
    pub api_base_url: Option<String>,

    /// Database connection settings.
    pub database: DatabaseConfig,

    /// Scheduled job settings.
    pub jobs: JobsConfig,

    /// Derive the client key from `X-Forwarded-For` instead of the socket.
    pub trust_proxy: bool,

    /// Maximum time spent draining in-flight requests on shutdown.
    pub shutdown_timeout_secs: u64,

    /// Body size ceiling for the JSON and URL-encoded parsers.
    #[serde(skip, default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_body_limit() -> usize {
    BODY_LIMIT_BYTES
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            allowed_origins: vec![DEFAULT_ALLOWED_ORIGIN.to_string()],
            rate_limit: RateLimitConfig::default(),
            enable_cron_jobs: false,
            environment: None,
            api_base_url: None,
            database: DatabaseConfig::default(),
            jobs: JobsConfig::default(),
            trust_proxy: false,
            shutdown_timeout_secs: 10,
            body_limit_bytes: BODY_LIMIT_BYTES,
        }
    }
}

impl ServerConfig {
    /// Whether error messages must be redacted from client responses.
    pub fn is_production(&self) -> bool {
        self.environment.as_deref() == Some("production")
    }

    /// Environment name for logs, `"undefined"` when unset.
    pub fn environment_name(&self) -> &str {
        self.environment.as_deref().unwrap_or("undefined")
    }

    /// URL announced at startup: `API_BASE_URL` or `http://localhost:{port}`.
    pub fn public_url(&self) -> String {
        match &self.api_base_url {
            Some(url) => url.clone(),
            None => format!("http://localhost:{}", self.port),
        }
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Window length in milliseconds.
    pub window_ms: u64,

    /// Maximum requests per client key per window.
    pub max_requests: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_ms: 15 * 60 * 1000,
            max_requests: 100,
        }
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

/// Database connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection string (`sqlite://...` or `postgres://...`).
    pub url: String,

    /// Connect and acquire timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://drept-academy.db?mode=rwc".to_string(),
            connect_timeout_secs: 10,
        }
    }
}

/// Scheduled job settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct JobsConfig {
    /// Six-field cron expression for the database heartbeat.
    pub heartbeat_cron: String,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            heartbeat_cron: "0 */5 * * * *".to_string(),
        }
    }
}
