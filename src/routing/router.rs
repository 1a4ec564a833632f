//! Section router registry and the root descriptor.

use std::collections::{BTreeMap, HashMap};

use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::config::ServerConfig;
use crate::db::Database;
use crate::health::{self, HealthState};
use crate::routing::section::ApiSection;

pub const SERVICE_NAME: &str = "Drept Academy API";

/// Routers to nest under each section prefix.
///
/// Sections without a router still appear in the descriptor; their paths
/// fall through to the 404 handler.
#[derive(Default)]
pub struct ApiRoutes {
    routers: HashMap<ApiSection, Router>,
}

impl ApiRoutes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `router` for `section`, replacing any previous one.
    pub fn with(mut self, section: ApiSection, router: Router) -> Self {
        self.routers.insert(section, router);
        self
    }

    /// Routers provided by this crate: the health check.
    pub fn standard(db: &Database, config: &ServerConfig) -> Self {
        let health = HealthState::new(db.clone(), config.environment_name());
        Self::new().with(ApiSection::Health, health::router(health))
    }

    pub fn has(&self, section: ApiSection) -> bool {
        self.routers.contains_key(&section)
    }

    pub(crate) fn mount(mut self, mut app: Router) -> Router {
        for section in ApiSection::ALL {
            if let Some(router) = self.routers.remove(&section) {
                app = app.nest(section.prefix(), router);
            }
        }
        app
    }
}

/// Body of `GET /`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    pub name: String,
    pub version: String,
    pub status: String,
    pub endpoints: BTreeMap<String, String>,
}

impl ServiceDescriptor {
    pub fn current() -> Self {
        Self {
            name: SERVICE_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            status: "running".to_string(),
            endpoints: ApiSection::ALL
                .iter()
                .map(|s| (s.name().to_string(), s.prefix().to_string()))
                .collect(),
        }
    }
}

pub async fn root_descriptor() -> Json<ServiceDescriptor> {
    Json(ServiceDescriptor::current())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_lists_every_section() {
        let descriptor = ServiceDescriptor::current();
        assert_eq!(descriptor.name, "Drept Academy API");
        assert_eq!(descriptor.version, "1.0.0");
        assert_eq!(descriptor.status, "running");
        assert_eq!(descriptor.endpoints.len(), 9);
        assert_eq!(descriptor.endpoints["flashcard"], "/api/flashcard");
    }

    #[test]
    fn registry_tracks_sections() {
        let routes = ApiRoutes::new().with(ApiSection::Qcm, Router::new());
        assert!(routes.has(ApiSection::Qcm));
        assert!(!routes.has(ApiSection::Planner));
    }
}
