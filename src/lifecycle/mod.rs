//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Database → Cron jobs → App → Bind listener
//!
//! Serving (startup.rs):
//!     Signal or fatal task failure → Stop accepting → Drain → Close
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//!
//! Supervision (supervisor.rs):
//!     Background task, handler-spawned task or cron run panics
//!     → Fatal error → Exit 1
//! ```
//!
//! # Design Decisions
//! - Ordered startup: database first, listeners last
//! - Ordered shutdown: stop accept, drain, stop jobs, close database
//! - Shutdown has timeout: open connections dropped after deadline

pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod supervisor;

pub use shutdown::{Shutdown, ShutdownListener};
pub use signals::{termination_signal, TerminationSignal};
pub use startup::{Server, ServerError, StartupError};
pub use supervisor::{install_panic_hook, FatalError, TaskSpawner, TaskSupervisor};
