//! Multi-protocol mediator server.
//!
//! A load-test target that listens on four transports and acknowledges
//! whatever it receives.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌────────────────────────────────────────────────┐
//!                         │                MEDIATOR SERVER                 │
//!                         │                                                │
//!   HTTP   :8080  ────────┼─▶┌──────────┐    ┌────────┐   {"status":"ok"}  │
//!   HTTPS  :8443  ────────┼─▶│   net    │───▶│  http  │──────────────────▶ │
//!                         │  │ listener │    └────────┘                    │
//!   TCP    :9000  ────────┼─▶│   set    │    ┌────────┐   {"status":"ok",  │
//!   TLS    :9001  ────────┼─▶│          │───▶│ frame  │    "received":N}   │
//!                         │  └──────────┘    └────────┘──────────────────▶ │
//!                         │        │              │                        │
//!                         │        ▼              ▼                        │
//!                         │   shared TLS      body reader                  │
//!                         │    material                                    │
//!                         │                                                │
//!                         │  config · lifecycle · observability            │
//!                         └────────────────────────────────────────────────┘
//! ```

pub mod body;
pub mod config;
pub mod frame;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::schema::ServerConfig;
pub use http::HttpServer;
pub use lifecycle::{RunningServer, Shutdown};
pub use net::Transport;
