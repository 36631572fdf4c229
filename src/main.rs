use std::path::PathBuf;

use clap::Parser;

use mediator_server::config::load_config;
use mediator_server::lifecycle::{self, signals, Shutdown};
use mediator_server::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "mediator-server")]
#[command(about = "HTTP, HTTPS, TCP and TLS acknowledgment server for load testing", long_about = None)]
struct Cli {
    /// Optional TOML configuration file. Environment variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logging depends on the config, so config errors go straight to stderr.
    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("mediator-server: {}", e);
            std::process::exit(1);
        }
    };

    logging::init(&config.observability);
    tracing::info!("mediator-server v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_host = %config.bind_host,
        http_port = config.ports.http,
        https_port = config.ports.https,
        tcp_port = config.ports.tcp,
        tls_port = config.ports.tls,
        max_body_size = config.limits.max_body_size,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        // Validation guarantees the address parses.
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let shutdown = Shutdown::new();
    let mut server = match lifecycle::start(config, &shutdown).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            return Err(e.into());
        }
    };

    tokio::select! {
        _ = signals::shutdown_signal() => {
            shutdown.trigger();
            server.wait().await?;
        }
        result = server.wait() => result?,
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
