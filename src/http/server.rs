//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router answering every method and path
//! - Wire up middleware (request ID, tracing, timeout, per-status metrics)
//! - Drain each request body before acknowledging
//! - Serve over plain TCP or TLS until shutdown

use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::any,
    Router,
};
use axum_server::{tls_rustls::RustlsConfig, Handle};
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::body::{self, BodyError};
use crate::config::ServerConfig;
use crate::lifecycle::ShutdownSignal;
use crate::http::request::{request_id, UuidRequestId};
use crate::http::response::Ack;
use crate::net::transport::Transport;
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub transport: Transport,
    pub max_body_size: usize,
}

/// HTTP (or HTTPS) acknowledgment server for one listener.
pub struct HttpServer {
    transport: Transport,
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(transport: Transport, config: &ServerConfig) -> Self {
        let state = AppState {
            transport,
            max_body_size: config.limits.max_body_size,
        };
        let router = Self::build_router(config, state);
        Self { transport, router }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, state: AppState) -> Router {
        let transport = state.transport;
        Router::new()
            .route("/{*path}", any(ack_handler))
            .route("/", any(ack_handler))
            .with_state(state)
            // The handler enforces its own limit while draining.
            .layer(DefaultBodyLimit::disable())
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(middleware::from_fn_with_state(transport, record_status))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
    }

    /// The router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve plain HTTP until `shutdown` fires, then give open connections `grace`.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
        grace: Duration,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(transport = %self.transport, address = %addr, "HTTP server starting");

        axum_server::from_tcp(listener.into_std()?)
            .handle(graceful_handle(shutdown, grace))
            .serve(self.router.into_make_service())
            .await?;

        tracing::info!(transport = %self.transport, "HTTP server stopped");
        Ok(())
    }

    /// Serve HTTPS until `shutdown` fires, then give open connections `grace`.
    pub async fn run_tls(
        self,
        listener: TcpListener,
        tls: RustlsConfig,
        shutdown: ShutdownSignal,
        grace: Duration,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(transport = %self.transport, address = %addr, "HTTP server starting");

        axum_server::from_tcp_rustls(listener.into_std()?, tls)
            .handle(graceful_handle(shutdown, grace))
            .serve(self.router.into_make_service())
            .await?;

        tracing::info!(transport = %self.transport, "HTTP server stopped");
        Ok(())
    }
}

/// Server handle that stops accepting on `shutdown` and cuts off whatever is
/// still open after `grace`.
fn graceful_handle(mut shutdown: ShutdownSignal, grace: Duration) -> Handle {
    let handle = Handle::new();
    let signal = handle.clone();
    tokio::spawn(async move {
        shutdown.recv().await;
        signal.graceful_shutdown(Some(grace));
    });
    handle
}

/// Count every response by status, including the 408s the timeout layer
/// produces without reaching the handler.
async fn record_status(State(transport): State<Transport>, request: Request, next: Next) -> Response {
    let start_time = Instant::now();
    let response = next.run(request).await;
    metrics::record_http_request(transport, response.status().as_u16(), start_time);
    response
}

/// Acknowledge any request once its body has been read.
async fn ack_handler(State(state): State<AppState>, request: Request) -> Response {
    let request_id = request_id(&request).to_string();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let (status, ack) = match body::drain_http(request.into_body(), state.max_body_size).await {
        Ok(bytes) => {
            tracing::debug!(
                request_id = %request_id,
                method = %method,
                path = %path,
                body_bytes = bytes.len(),
                "Request acknowledged"
            );
            metrics::record_bytes_received(state.transport, bytes.len());
            (StatusCode::OK, Ack::Ok)
        }
        Err(e @ BodyError::TooLarge { .. }) => {
            tracing::warn!(request_id = %request_id, path = %path, error = %e, "Request body rejected");
            (StatusCode::PAYLOAD_TOO_LARGE, Ack::error(e))
        }
        Err(e) => {
            tracing::debug!(request_id = %request_id, path = %path, error = %e, "Request body unreadable");
            (StatusCode::BAD_REQUEST, Ack::error(e))
        }
    };

    ack.with_status(status)
}
