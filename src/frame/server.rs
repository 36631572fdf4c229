//! Accept loop for raw TCP and TLS-wrapped TCP listeners.
//!
//! # Responsibilities
//! - Accept connections within the listener's connection limit
//! - Run the TLS handshake when the transport is encrypted
//! - Hand each connection to the frame responder on its own task
//! - Stop accepting on shutdown and give in-flight connections a grace period

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio_rustls::TlsAcceptor;
use tracing::Instrument;

use crate::frame::responder::{self, FrameError, FramePolicy};
use crate::lifecycle::ShutdownSignal;
use crate::net::connection::ConnectionTracker;
use crate::net::listener::{ConnectionPermit, Listener};
use crate::net::transport::Transport;
use crate::observability::metrics;

/// Serves one raw stream listener.
pub struct StreamServer {
    listener: Listener,
    acceptor: Option<TlsAcceptor>,
    policy: FramePolicy,
    handshake_timeout: Duration,
    shutdown_grace: Duration,
    tracker: ConnectionTracker,
}

impl StreamServer {
    /// `acceptor` must be present exactly when the listener's transport is encrypted.
    pub fn new(
        listener: Listener,
        acceptor: Option<TlsAcceptor>,
        policy: FramePolicy,
        handshake_timeout: Duration,
        shutdown_grace: Duration,
    ) -> Self {
        let tracker = ConnectionTracker::new(listener.transport());
        Self {
            listener,
            acceptor,
            policy,
            handshake_timeout,
            shutdown_grace,
            tracker,
        }
    }

    /// Accept until `shutdown` fires.
    pub async fn run(self, mut shutdown: ShutdownSignal) -> Result<(), std::io::Error> {
        let transport = self.listener.transport();
        let addr = self.listener.local_addr()?;
        tracing::info!(
            transport = %transport,
            address = %addr,
            max_connections = self.listener.max_connections(),
            "Stream server starting"
        );

        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer, permit)) => self.spawn_connection(stream, peer, permit),
                    Err(e) => {
                        // Usually fd exhaustion; back off instead of spinning.
                        tracing::warn!(transport = %transport, error = %e, "Accept failed");
                        tokio::time::sleep(Duration::from_millis(100)).await;
                    }
                },
                _ = shutdown.recv() => break,
            }
        }

        let remaining = self.tracker.wait_idle(self.shutdown_grace).await;
        if remaining > 0 {
            tracing::warn!(transport = %transport, remaining, "Closing with connections still open");
        }
        tracing::info!(transport = %transport, "Stream server stopped");
        Ok(())
    }

    fn spawn_connection(&self, stream: TcpStream, peer: SocketAddr, permit: ConnectionPermit) {
        let transport = self.listener.transport();
        let guard = self.tracker.track();
        let span = tracing::debug_span!("connection", id = %guard.id(), transport = %transport, peer = %peer);

        let acceptor = self.acceptor.clone();
        let policy = self.policy;
        let handshake_timeout = self.handshake_timeout;

        tokio::spawn(
            async move {
                let _permit = permit;
                let _guard = guard;

                let result = match acceptor {
                    Some(acceptor) => serve_tls(stream, &acceptor, &policy, handshake_timeout).await,
                    None => serve_plain(stream, &policy).await,
                };
                finish(transport, result);
            }
            .instrument(span),
        );
    }
}

async fn serve_plain(mut stream: TcpStream, policy: &FramePolicy) -> Result<usize, FrameError> {
    responder::respond(&mut stream, policy).await
}

async fn serve_tls(
    stream: TcpStream,
    acceptor: &TlsAcceptor,
    policy: &FramePolicy,
    handshake_timeout: Duration,
) -> Result<usize, FrameError> {
    let mut tls = tokio::time::timeout(handshake_timeout, acceptor.accept(stream))
        .await
        .map_err(|_| FrameError::HandshakeTimeout(handshake_timeout))?
        .map_err(FrameError::Handshake)?;
    responder::respond(&mut tls, policy).await
}

fn finish(transport: Transport, result: Result<usize, FrameError>) {
    match result {
        Ok(received) => {
            tracing::debug!(received, "Body acknowledged");
            metrics::record_bytes_received(transport, received);
            metrics::record_stream_outcome(transport, "acknowledged");
        }
        Err(e) => {
            match &e {
                FrameError::Body(_) | FrameError::Write(_) => {
                    tracing::debug!(error = %e, "Connection ended without acknowledgment")
                }
                FrameError::Handshake(_) | FrameError::HandshakeTimeout(_) => {
                    tracing::warn!(error = %e, "TLS handshake failed")
                }
            }
            metrics::record_stream_outcome(transport, e.outcome());
        }
    }
}
