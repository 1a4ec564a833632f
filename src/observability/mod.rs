//! Observability subsystem.
//!
//! All subsystems emit structured `tracing` events; this module owns the
//! subscriber that formats and filters them.

pub mod logging;

pub use logging::init_logging;
