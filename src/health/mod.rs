//! Health check endpoint.
//!
//! # Data Flow
//! ```text
//! GET /api/health
//!     → ping database
//!     → 200 "ok" or 503 "degraded"
//! ```
//!
//! # Design Decisions
//! - The probe goes through the normal `/api` stack, rate limiting included
//! - A failed ping is reported in the body, never as an error response

mod handlers;

pub use handlers::{router, HealthReport, HealthState};
