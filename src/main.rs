//! SPA proxy
//!
//! Serves versioned single-page-application builds from a remote origin,
//! caching every response on local disk.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ access log ─▶ dev paths? ──yes──▶ dev target (passthrough)
//!                                      │ no
//!                                      ▼
//!                              SPA rewrite (extensionless → /index.html)
//!                                      │
//!                                      ▼
//!                              version resolution (query > cookie > default)
//!                                      │
//!                                      ▼
//!                              disk cache ──miss──▶ origin fetch ─▶ store
//!                                      │ hit
//!     Client Response                  ▼
//!     ◀──────────────────────── replayed response + X-Cache
//!
//!     Background: default version poller ──▶ VersionStore
//! ```

use clap::Parser;
use tokio::net::TcpListener;

use spa_proxy::config::{load_config, Args};
use spa_proxy::lifecycle::{self, signals, Shutdown};
use spa_proxy::observability::{logging, metrics};
use spa_proxy::HttpServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(args)?;

    logging::init(config.observability.log_format);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        source = %config.origin.source,
        cache_dir = %config.cache.dir.display(),
        bind_address = %config.listener.bind_address,
        default_version = config.versions.default_version.as_deref().unwrap_or("<polled>"),
        dev_routes = config.dev_proxy.routes.len(),
        "spa-proxy starting"
    );

    if let Some(addr) = &config.observability.metrics_address {
        metrics::init_metrics(addr.parse()?)?;
    }

    let shutdown = Shutdown::new();
    let services = lifecycle::start(&config, &shutdown).await?;

    let listener = TcpListener::bind(config.listener.socket_addr()?).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    signals::spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(&config, &services);
    server.run(listener, shutdown.subscribe()).await?;

    shutdown.trigger();
    if let Some(poller) = services.poller {
        let _ = poller.await;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
