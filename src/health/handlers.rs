use std::time::Instant;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use crate::db::Database;
use crate::http::response::not_found;

#[derive(Clone)]
pub struct HealthState {
    db: Database,
    environment: String,
    started: Instant,
}

impl HealthState {
    pub fn new(db: Database, environment: impl Into<String>) -> Self {
        Self {
            db,
            environment: environment.into(),
            started: Instant::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub success: bool,
    pub status: String,
    pub database: String,
    pub uptime_secs: u64,
    pub environment: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new()
        .route("/", get(health).fallback(not_found))
        .with_state(state)
}

async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthReport>) {
    let (status, healthy) = match state.db.ping().await {
        Ok(()) => (StatusCode::OK, true),
        Err(err) => {
            tracing::warn!(error = %err, "Health check: database ping failed");
            (StatusCode::SERVICE_UNAVAILABLE, false)
        }
    };

    let report = HealthReport {
        success: healthy,
        status: if healthy { "ok" } else { "degraded" }.to_string(),
        database: if healthy { "connected" } else { "disconnected" }.to_string(),
        uptime_secs: state.started.elapsed().as_secs(),
        environment: state.environment,
    };
    (status, Json(report))
}
