//! TCP listeners with backpressure, one per transport.
//!
//! # Responsibilities
//! - Bind each transport to its configured port
//! - Attribute bind failures to a protocol and port
//! - Accept incoming TCP connections
//! - Enforce max_connections limit via semaphore

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

use crate::config::ServerConfig;
use crate::net::transport::Transport;

/// Error type for listener operations.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    /// Failed to bind to address.
    #[error("failed to bind {transport} listener on {addr}: {source}")]
    Bind {
        transport: Transport,
        addr: String,
        #[source]
        source: std::io::Error,
    },
    /// Failed to accept connection.
    #[error("failed to accept {transport} connection: {source}")]
    Accept {
        transport: Transport,
        #[source]
        source: std::io::Error,
    },
    /// The connection limiter was closed.
    #[error("{0} listener connection limiter closed")]
    Closed(Transport),
}

/// A bounded TCP listener that limits concurrent connections.
///
/// Uses a semaphore to enforce `max_connections`. When the limit is reached,
/// new connections will wait until a slot becomes available.
#[derive(Debug)]
pub struct Listener {
    transport: Transport,
    /// The underlying TCP listener.
    inner: TcpListener,
    /// Semaphore to limit concurrent connections.
    connection_limit: Arc<Semaphore>,
    /// Configured maximum connections.
    max_connections: usize,
}

impl Listener {
    /// Bind `transport` on `host:port` with connection limits.
    pub async fn bind(
        transport: Transport,
        host: &str,
        port: u16,
        max_connections: usize,
    ) -> Result<Self, ListenerError> {
        let bind_error = |source| ListenerError::Bind {
            transport,
            addr: format!("{}:{}", host, port),
            source,
        };

        let inner = TcpListener::bind((host, port)).await.map_err(bind_error)?;
        let local_addr = inner.local_addr().map_err(bind_error)?;

        tracing::debug!(
            transport = %transport,
            address = %local_addr,
            max_connections,
            "Listener bound"
        );

        Ok(Self {
            transport,
            inner,
            connection_limit: Arc::new(Semaphore::new(max_connections)),
            max_connections,
        })
    }

    /// Accept a new connection, respecting the connection limit.
    ///
    /// This will wait if the connection limit has been reached.
    /// Returns the stream and a permit that must be held for the connection's lifetime.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr, ConnectionPermit), ListenerError> {
        // Acquire permit first (backpressure)
        let permit = self
            .connection_limit
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ListenerError::Closed(self.transport))?;

        // Then accept the connection
        let (stream, addr) = self.inner.accept().await.map_err(|source| ListenerError::Accept {
            transport: self.transport,
            source,
        })?;

        tracing::trace!(
            transport = %self.transport,
            peer_addr = %addr,
            available_permits = self.connection_limit.available_permits(),
            "Connection accepted"
        );

        Ok((stream, addr, ConnectionPermit { _permit: permit }))
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    /// Get the local address this listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.inner.local_addr()
    }

    /// Get current available connection slots.
    pub fn available_permits(&self) -> usize {
        self.connection_limit.available_permits()
    }

    /// Get configured maximum connections.
    pub fn max_connections(&self) -> usize {
        self.max_connections
    }

    /// Hand the socket to a server that manages its own connections.
    pub fn into_inner(self) -> TcpListener {
        self.inner
    }
}

/// A permit representing a connection slot.
///
/// When dropped, the connection slot is released back to the pool.
/// This ensures backpressure is maintained even if the connection handler panics.
#[derive(Debug)]
pub struct ConnectionPermit {
    _permit: tokio::sync::OwnedSemaphorePermit,
}

/// The four bound listeners, keyed by transport.
#[derive(Debug)]
pub struct ListenerSet {
    listeners: BTreeMap<Transport, Listener>,
}

impl ListenerSet {
    /// Bind every transport in [`Transport::ALL`] order.
    ///
    /// On the first failure the listeners already bound are dropped before
    /// the error is returned, so nothing stays bound.
    pub async fn bind(config: &ServerConfig) -> Result<Self, ListenerError> {
        let mut listeners = BTreeMap::new();
        for transport in Transport::ALL {
            let listener = Listener::bind(
                transport,
                &config.bind_host,
                transport.port(&config.ports),
                config.limits.max_connections,
            )
            .await?;
            listeners.insert(transport, listener);
        }
        Ok(Self { listeners })
    }

    /// Bound address of one transport's listener.
    pub fn local_addr(&self, transport: Transport) -> Option<SocketAddr> {
        self.listeners
            .get(&transport)
            .and_then(|l| l.local_addr().ok())
    }

    pub fn into_listeners(self) -> impl Iterator<Item = Listener> {
        self.listeners.into_values()
    }
}
