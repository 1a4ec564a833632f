//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::connect_info::MockConnectInfo,
    http::Response,
    Router,
};
use serde::de::DeserializeOwned;

use drept_academy_api::config::{DatabaseConfig, ServerConfig};
use drept_academy_api::security::RateLimiter;
use drept_academy_api::{build_app, ApiRoutes, Database};

pub const MEMORY_DB: &str = "sqlite::memory:";

/// Development config on an ephemeral port with an in-memory database.
pub fn test_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.port = 0;
    config.database = DatabaseConfig {
        url: MEMORY_DB.to_string(),
        connect_timeout_secs: 2,
    };
    config.shutdown_timeout_secs = 2;
    config
}

pub async fn memory_db() -> Database {
    Database::connect(&test_config().database).await.unwrap()
}

/// The full middleware stack, with requests appearing to come from `client`.
pub fn test_app_from(config: &ServerConfig, routes: ApiRoutes, client: SocketAddr) -> Router {
    let limiter = Arc::new(RateLimiter::new(&config.rate_limit));
    build_app(config, limiter, routes).layer(MockConnectInfo(client))
}

pub fn test_app(config: &ServerConfig, routes: ApiRoutes) -> Router {
    test_app_from(config, routes, "203.0.113.7:51000".parse().unwrap())
}

pub async fn body_json<T: DeserializeOwned>(response: Response<Body>) -> T {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// A port that was free a moment ago.
pub fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}
