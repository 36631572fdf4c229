//! Startup orchestration.
//!
//! # Responsibilities
//! - Load TLS material
//! - Bind every listener before any of them serves
//! - Pair each transport with its responder and spawn it
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - TLS is loaded before binding, so a missing key leaves no socket bound
//! - Listeners start last (traffic only when ready)

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;

use crate::config::ServerConfig;
use crate::frame::{FramePolicy, StreamServer};
use crate::http::HttpServer;
use crate::lifecycle::shutdown::{Shutdown, ShutdownSignal};
use crate::net::listener::{Listener, ListenerError, ListenerSet};
use crate::net::tls::{TlsError, TlsMaterial};
use crate::net::transport::{Family, Transport};

/// Fatal error while bringing the server up.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("failed to load TLS material: {0}")]
    Tls(#[from] TlsError),

    #[error(transparent)]
    Listener(#[from] ListenerError),
}

/// A listener that stopped with an error after startup.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("{transport} listener failed: {source}")]
    Serve {
        transport: Transport,
        #[source]
        source: std::io::Error,
    },

    #[error("listener task panicked: {0}")]
    Panicked(#[from] tokio::task::JoinError),
}

/// Handle to the four serving listeners.
pub struct RunningServer {
    addrs: BTreeMap<Transport, SocketAddr>,
    tasks: JoinSet<(Transport, Result<(), std::io::Error>)>,
}

impl RunningServer {
    /// Address a transport's listener is bound to.
    pub fn local_addr(&self, transport: Transport) -> Option<SocketAddr> {
        self.addrs.get(&transport).copied()
    }

    /// Wait for every listener task to finish.
    ///
    /// A failing listener does not stop the others; the first failure is
    /// returned once all have finished.
    pub async fn wait(&mut self) -> Result<(), RunError> {
        let mut first_error = None;

        while let Some(joined) = self.tasks.join_next().await {
            let error = match joined {
                Ok((_, Ok(()))) => continue,
                Ok((transport, Err(source))) => RunError::Serve { transport, source },
                Err(e) => RunError::Panicked(e),
            };
            tracing::error!(error = %error, "Listener stopped unexpectedly");
            first_error.get_or_insert(error);
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Load TLS material, bind all listeners, and start serving.
pub async fn start(config: ServerConfig, shutdown: &Shutdown) -> Result<RunningServer, StartupError> {
    let tls = TlsMaterial::load(Path::new(&config.tls.cert_path), Path::new(&config.tls.key_path))?;
    let listeners = ListenerSet::bind(&config).await?;
    let config = Arc::new(config);

    let mut addrs = BTreeMap::new();
    for transport in Transport::ALL {
        if let Some(addr) = listeners.local_addr(transport) {
            addrs.insert(transport, addr);
        }
    }

    let mut tasks = JoinSet::new();
    for listener in listeners.into_listeners() {
        let transport = listener.transport();
        if let Some(addr) = addrs.get(&transport) {
            tracing::info!(transport = %transport, address = %addr, "Listener ready");
        }
        tasks.spawn(serve(listener, Arc::clone(&config), tls.clone(), shutdown.subscribe()));
    }

    Ok(RunningServer { addrs, tasks })
}

/// Run the responder that belongs to the listener's transport.
async fn serve(
    listener: Listener,
    config: Arc<ServerConfig>,
    tls: TlsMaterial,
    shutdown: ShutdownSignal,
) -> (Transport, Result<(), std::io::Error>) {
    let transport = listener.transport();
    let grace = Duration::from_secs(config.timeouts.shutdown_grace_secs);

    let result = match transport.family() {
        Family::Http => {
            let server = HttpServer::new(transport, &config);
            let listener = listener.into_inner();
            if transport.is_encrypted() {
                server.run_tls(listener, tls.https_config(), shutdown, grace).await
            } else {
                server.run(listener, shutdown, grace).await
            }
        }
        Family::Stream => {
            let acceptor = transport.is_encrypted().then(|| tls.acceptor());
            StreamServer::new(
                listener,
                acceptor,
                FramePolicy::from_config(&config),
                Duration::from_secs(config.timeouts.handshake_secs),
                grace,
            )
            .run(shutdown)
            .await
        }
    };

    (transport, result)
}
