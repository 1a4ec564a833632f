//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional TOML file (DREPT_CONFIG)
//!     → loader.rs (parse & deserialize)
//!     → environment variables override individual fields
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is read once at process start and never reloaded
//! - All fields have defaults so an empty environment is a valid setup
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::ConfigError;
pub use schema::{DatabaseConfig, JobsConfig, RateLimitConfig, ServerConfig};
