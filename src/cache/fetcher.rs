//! Origin fetching.
//!
//! # Responsibilities
//! - Map a cache key onto the origin source URL
//! - GET it with the bounded-timeout client
//! - Hand back the whole response (any status) as a [`CacheEntry`]
//!
//! # Design Decisions
//! - Persistence belongs to the cache; the fetcher never touches disk
//! - Non-2xx answers are still entries and get cached like any other
//! - Transport failures and timeouts are errors, never entries

use std::time::Instant;
use url::Url;

use crate::cache::entry::CacheEntry;
use crate::cache::key::CacheKey;
use crate::error::ProxyResult;
use crate::observability::metrics;

/// Downloads cache entries from the origin.
#[derive(Debug, Clone)]
pub struct OriginFetcher {
    client: reqwest::Client,
    source: Url,
}

impl OriginFetcher {
    /// `client` is expected to carry the origin timeout.
    pub fn new(client: reqwest::Client, source: Url) -> Self {
        Self { client, source }
    }

    pub fn source(&self) -> &Url {
        &self.source
    }

    /// Fetch the origin object for `key`.
    pub async fn fetch(&self, key: &CacheKey) -> ProxyResult<CacheEntry> {
        let url = key.origin_url(&self.source);
        let start = Instant::now();

        tracing::debug!(key = %key, url = %url, "Fetching from origin");

        let result = self.download(url.clone()).await;
        match &result {
            Ok(entry) => {
                metrics::record_origin_fetch("success", start);
                tracing::debug!(
                    key = %key,
                    status = entry.status.as_u16(),
                    bytes = entry.body.len(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Origin fetch complete"
                );
            }
            Err(e) => {
                metrics::record_origin_fetch("failure", start);
                tracing::warn!(key = %key, url = %url, error = %e, "Origin fetch failed");
            }
        }
        result
    }

    async fn download(&self, url: Url) -> ProxyResult<CacheEntry> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        Ok(CacheEntry::new(status, headers, body))
    }
}
