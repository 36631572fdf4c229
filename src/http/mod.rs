//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, plain or TLS serving)
//!     → request.rs (request ID assigned or propagated)
//!     → body drained up to the configured limit
//!     → response.rs ({"status":"ok"} as application/json)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{UuidRequestId, X_REQUEST_ID};
pub use response::Ack;
pub use server::HttpServer;
