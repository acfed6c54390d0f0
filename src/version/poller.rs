//! Default version polling.
//!
//! # Responsibilities
//! - Fetch the default version resource from the origin
//! - Refresh the shared [`VersionStore`] on a fixed interval
//! - Back off with a short fixed delay after failures, forever
//!
//! # Design Decisions
//! - The loop owns no request state; it only talks to the store
//! - Failures are logged and retried, never fatal once running
//! - Exits only on the shutdown broadcast

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use url::Url;

use crate::error::{ProxyError, ProxyResult};
use crate::http::path::clean_path;
use crate::observability::metrics;
use crate::version::store::VersionStore;

/// Something that can report the origin's current default version.
pub trait VersionSource: Send + Sync + 'static {
    fn fetch_default(&self) -> impl Future<Output = ProxyResult<String>> + Send;
}

/// Reads `{source}/default-version.txt` (or the configured path) over HTTP.
#[derive(Debug, Clone)]
pub struct OriginVersionSource {
    client: reqwest::Client,
    url: Url,
}

impl OriginVersionSource {
    pub fn new(client: reqwest::Client, source: &Url, poll_path: &str) -> Self {
        let mut url = source.clone();
        url.set_path(&clean_path(&format!("{}/{}", source.path(), poll_path)));
        url.set_query(None);
        url.set_fragment(None);
        Self { client, url }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl VersionSource for OriginVersionSource {
    async fn fetch_default(&self) -> ProxyResult<String> {
        let response = self.client.get(self.url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProxyError::OriginStatus {
                url: self.url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let version = body.trim();
        if version.is_empty() {
            return Err(ProxyError::EmptyVersion);
        }
        Ok(version.to_string())
    }
}

/// Background refresher for a polling [`VersionStore`].
pub struct VersionPoller<S> {
    source: S,
    store: Arc<VersionStore>,
    refresh_interval: Duration,
    retry_delay: Duration,
}

impl<S: VersionSource> VersionPoller<S> {
    pub fn new(
        source: S,
        store: Arc<VersionStore>,
        refresh_interval: Duration,
        retry_delay: Duration,
    ) -> Self {
        Self {
            source,
            store,
            refresh_interval,
            retry_delay,
        }
    }

    /// Fetch once and seed a new store. Used at startup, where failure is
    /// fatal to the caller.
    pub async fn initial_store(source: &S) -> ProxyResult<VersionStore> {
        let version = source.fetch_default().await?;
        tracing::info!(version = %version, "Initial default version fetched");
        Ok(VersionStore::polling(version))
    }

    /// Fetch once and update the store.
    pub async fn refresh_once(&self) -> ProxyResult<bool> {
        match self.source.fetch_default().await {
            Ok(version) => {
                metrics::record_version_refresh("success");
                Ok(self.store.replace(version))
            }
            Err(e) => {
                metrics::record_version_refresh("failure");
                Err(e)
            }
        }
    }

    /// Run the refresh loop until shutdown.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval_secs = self.refresh_interval.as_secs_f64(),
            retry_secs = self.retry_delay.as_secs_f64(),
            "Version poller starting"
        );

        let mut delay = self.refresh_interval;
        loop {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.recv() => {
                    tracing::info!("Version poller received shutdown signal, exiting loop");
                    break;
                }
            }

            delay = match self.refresh_once().await {
                Ok(_) => self.refresh_interval,
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        retry_secs = self.retry_delay.as_secs_f64(),
                        "Default version refresh failed"
                    );
                    self.retry_delay
                }
            };
        }
    }
}
