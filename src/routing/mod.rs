//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → "/" → service descriptor
//!     → "/api/<section>/..." → router registered for that section
//!     → anything else → 404 JSON
//! ```
//!
//! # Design Decisions
//! - The nine API sections are a closed set, fixed at compile time
//! - Section routers are opaque: the edge only nests them by prefix
//! - The descriptor and the mounts derive from the same section list

pub mod router;
pub mod section;

pub use router::{root_descriptor, ApiRoutes, ServiceDescriptor, SERVICE_NAME};
pub use section::ApiSection;
