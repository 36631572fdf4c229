//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! ServerConfig
//!     → listener.rs (bind one socket per transport, connection limits)
//!     → transport.rs (which responder family, plain or encrypted)
//!     → tls.rs (shared certificate material, TLS handshake)
//!     → connection.rs (ids, in-flight tracking for raw streams)
//!     → Hand off to HTTP or frame responder
//! ```
//!
//! # Design Decisions
//! - All listeners are bound before any starts serving
//! - Bounded accept queue prevents resource exhaustion on raw streams
//! - One TLS config feeds both encrypted transports

pub mod connection;
pub mod listener;
pub mod tls;
pub mod transport;

pub use listener::{Listener, ListenerError, ListenerSet};
pub use tls::{TlsError, TlsMaterial};
pub use transport::{Family, Transport};
