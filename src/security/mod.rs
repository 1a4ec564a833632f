//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → headers.rs (defensive response headers on the way out)
//!     → cors.rs (origin allow-list, preflight)
//!     → rate_limit.rs (per-IP fixed window on /api)
//!     → Pass to body parsing and routing
//! ```
//!
//! # Design Decisions
//! - Rejections short-circuit the rest of the pipeline
//! - Security headers apply to every response, errors included

pub mod cors;
pub mod headers;
pub mod rate_limit;

pub use cors::build_cors_layer;
pub use headers::security_headers;
pub use rate_limit::{rate_limit_middleware, RateLimitState, RateLimiter, RATE_LIMIT_MESSAGE};
