//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize all subsystems in dependency order
//! - Fetch the initial default version (polling mode)
//! - Start background tasks (version poller)
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - The listener is bound by the caller, after this succeeds

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use url::Url;

use crate::cache::{DiskCache, OriginFetcher};
use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::http::dev_proxy::DevProxy;
use crate::lifecycle::shutdown::Shutdown;
use crate::routing::DevRouter;
use crate::version::{OriginVersionSource, VersionPoller, VersionStore};

/// Fatal startup failures.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Invalid origin source URL: {0}")]
    Source(#[from] url::ParseError),

    #[error("Failed to build origin client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Failed to create cache directory {}: {source}", path.display())]
    CacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to fetch initial default version: {0}")]
    InitialVersion(#[source] ProxyError),
}

/// Everything the HTTP server needs, plus background task handles.
pub struct Services {
    pub cache: Arc<DiskCache>,
    pub versions: Arc<VersionStore>,
    pub dev_proxy: DevProxy,
    pub poller: Option<JoinHandle<()>>,
}

/// Build all subsystems from a validated configuration.
pub async fn start(config: &ProxyConfig, shutdown: &Shutdown) -> Result<Services, StartupError> {
    let source = Url::parse(&config.origin.source)?;
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.origin.fetch_timeout_secs))
        .build()?;

    tokio::fs::create_dir_all(&config.cache.dir)
        .await
        .map_err(|source| StartupError::CacheDir {
            path: config.cache.dir.clone(),
            source,
        })?;
    tracing::info!(
        cache_dir = %config.cache.dir.display(),
        single_flight = config.cache.single_flight,
        "Cache root ready"
    );

    let (versions, poller) = match &config.versions.default_version {
        Some(version) => {
            tracing::info!(version = %version, "Using fixed default version");
            (Arc::new(VersionStore::fixed(version.clone())), None)
        }
        None => {
            let version_source =
                OriginVersionSource::new(client.clone(), &source, &config.versions.poll_path);
            tracing::info!(url = %version_source.url(), "Polling origin for default version");

            let store = VersionPoller::initial_store(&version_source)
                .await
                .map_err(StartupError::InitialVersion)?;
            let store = Arc::new(store);

            let poller = VersionPoller::new(
                version_source,
                Arc::clone(&store),
                Duration::from_secs(config.versions.refresh_interval_secs),
                Duration::from_secs(config.versions.retry_delay_secs),
            );
            let handle = tokio::spawn(poller.run(shutdown.subscribe()));
            (store, Some(handle))
        }
    };

    let dev_router = DevRouter::from_config(config.dev_proxy.routes.clone());
    if !dev_router.is_empty() {
        tracing::info!(routes = dev_router.len(), "Dev path passthrough enabled");
    }
    let dev_proxy = DevProxy::new(dev_router, &config.dev_proxy);

    let cache = Arc::new(DiskCache::new(
        config.cache.dir.clone(),
        OriginFetcher::new(client, source),
        config.cache.single_flight,
    ));

    Ok(Services {
        cache,
        versions,
        dev_proxy,
        poller,
    })
}
