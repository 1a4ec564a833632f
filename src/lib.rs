//! Drept Academy API edge server.
//!
//! Security headers, compression, CORS, rate limiting and body parsing in
//! front of the API section routers, with a single error funnel and an
//! ordered startup and shutdown.

// Core subsystems
pub mod config;
pub mod db;
pub mod http;
pub mod routing;

// Endpoints and background work
pub mod health;
pub mod jobs;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::ServerConfig;
pub use db::Database;
pub use http::{build_app, AppError};
pub use lifecycle::{Server, ServerError, Shutdown, StartupError, TaskSpawner};
pub use routing::{ApiRoutes, ApiSection};
