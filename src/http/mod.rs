//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (router, middleware stack)
//!     → middleware/ (body parsers, access log)
//!     → routing (section routers)
//!     → error.rs (log, redact in production)
//!     → response.rs (JSON envelope)
//!     → Send to client
//! ```

pub mod error;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use error::{AppError, ErrorPolicy};
pub use middleware::ParsedBody;
pub use request::{ClientIpSource, X_REQUEST_ID};
pub use response::{ErrorBody, GENERIC_ERROR_MESSAGE, NOT_FOUND_MESSAGE};
pub use server::build_app;
