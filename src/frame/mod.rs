//! Raw stream (TCP and TLS-wrapped TCP) responder.
//!
//! ## Protocol
//!
//! There is no framing. The client writes its payload and signals end of
//! input (TCP half-close or TLS close_notify); the server replies with one
//! JSON line and closes:
//!
//! ```text
//! Client:  <payload bytes> <EOF>
//! Server:  {"status":"ok","received":<payload length>}\n  <close>
//!
//! Payload over the body limit:
//! Server:  {"status":"error","error":"body exceeds <limit> bytes"}\n  <close>
//! ```
//!
//! A peer that stays silent longer than the read timeout is disconnected
//! without a reply.

pub mod responder;
pub mod server;

pub use responder::{respond, FrameError, FramePolicy, StreamAck};
pub use server::StreamServer;
