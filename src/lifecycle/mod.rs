//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load TLS material → Bind HTTP, HTTPS, TCP, TLS → Spawn one responder per listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Grace period for open connections → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then TLS, then listeners
//! - A bind failure is fatal and attributed to its protocol and port
//! - Shutdown has timeout: open connections are abandoned after the grace period

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{Shutdown, ShutdownSignal};
pub use startup::{start, RunError, RunningServer, StartupError};
