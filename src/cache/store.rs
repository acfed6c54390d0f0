//! Disk-backed response cache.
//!
//! # Responsibilities
//! - Serve entries from `{root}/{key}` when present (hit)
//! - Fill absent entries from the origin, then serve from disk (miss)
//! - Coalesce concurrent misses for the same key into one origin fetch whose
//!   outcome, success or failure, is shared by every waiter
//!
//! # Design Decisions
//! - Entries are immutable once written; there is no eviction or expiry
//! - Writes go to a sibling temp file and are renamed into place, so a
//!   reader sees either nothing or a complete entry
//! - An entry that fails to parse is an error, not a miss

use axum::body::Bytes;
use axum::http::HeaderValue;
use dashmap::DashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::cache::entry::CacheEntry;
use crate::cache::fetcher::OriginFetcher;
use crate::cache::key::CacheKey;
use crate::error::{ProxyError, ProxyResult};

/// Whether the entry existed before the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "hit",
            CacheStatus::Miss => "miss",
        }
    }

    /// Value for the `X-Cache` response header.
    pub fn header_value(&self) -> HeaderValue {
        HeaderValue::from_static(self.as_str())
    }
}

/// Result of one fill, shared with every request that waited on it.
type FillOutcome = Result<(), Arc<ProxyError>>;

/// Write-once response cache rooted at a directory.
pub struct DiskCache {
    root: PathBuf,
    fetcher: OriginFetcher,
    single_flight: bool,
    in_flight: DashMap<CacheKey, Arc<OnceCell<FillOutcome>>>,
}

impl DiskCache {
    pub fn new(root: impl Into<PathBuf>, fetcher: OriginFetcher, single_flight: bool) -> Self {
        Self {
            root: root.into(),
            fetcher,
            single_flight,
            in_flight: DashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Serve `key`, filling from the origin on a miss.
    ///
    /// The status is reported even when serving fails, so the caller can
    /// still label the response.
    pub async fn serve(&self, key: &CacheKey) -> (CacheStatus, ProxyResult<CacheEntry>) {
        match self.lookup(key).await {
            Ok(Some(entry)) => return (CacheStatus::Hit, Ok(entry)),
            Ok(None) => {}
            Err(e) => return (CacheStatus::Hit, Err(e)),
        }

        tracing::info!(key = %key, "Cache miss, filling from origin");
        if let Err(e) = self.fill(key).await {
            return (CacheStatus::Miss, Err(e));
        }

        let entry = match self.lookup(key).await {
            Ok(Some(entry)) => Ok(entry),
            Ok(None) => Err(ProxyError::MissingAfterFill(key.to_string())),
            Err(e) => Err(e),
        };
        (CacheStatus::Miss, entry)
    }

    /// Read and decode the stored entry, `None` when absent.
    pub async fn lookup(&self, key: &CacheKey) -> ProxyResult<Option<CacheEntry>> {
        let path = key.file_path(&self.root)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        CacheEntry::decode(Bytes::from(bytes))
            .map(Some)
            .map_err(|reason| ProxyError::MalformedEntry {
                path: path.display().to_string(),
                reason,
            })
    }

    /// Make sure an entry for `key` exists on disk.
    ///
    /// With single-flight on, the first caller fills and every concurrent
    /// caller for the same key receives its outcome. A failed fill is not
    /// remembered: the next request after it starts a new one.
    async fn fill(&self, key: &CacheKey) -> ProxyResult<()> {
        if !self.single_flight {
            return self.fetch_and_store(key).await;
        }

        let cell = self.in_flight.entry(key.clone()).or_default().clone();
        let outcome = cell
            .get_or_init(|| async {
                // A previous fill may have finished between lookup and here.
                match self.entry_exists(key).await {
                    Ok(true) => {
                        tracing::debug!(key = %key, "Entry filled by concurrent request");
                        Ok(())
                    }
                    Ok(false) => self.fetch_and_store(key).await.map_err(Arc::new),
                    Err(e) => Err(Arc::new(e)),
                }
            })
            .await
            .clone();

        self.in_flight
            .remove_if(key, |_, current| Arc::ptr_eq(current, &cell));
        outcome.map_err(ProxyError::FillFailed)
    }

    async fn entry_exists(&self, key: &CacheKey) -> ProxyResult<bool> {
        Ok(tokio::fs::try_exists(key.file_path(&self.root)?).await?)
    }

    async fn fetch_and_store(&self, key: &CacheKey) -> ProxyResult<()> {
        let entry = self.fetcher.fetch(key).await?;
        self.persist(key, &entry).await
    }

    /// Atomically write `entry` under `key`.
    pub async fn persist(&self, key: &CacheKey, entry: &CacheEntry) -> ProxyResult<()> {
        let path = key.file_path(&self.root)?;
        let (dir, name) = match (path.parent(), path.file_name()) {
            (Some(dir), Some(name)) => (dir, name.to_string_lossy()),
            _ => return Err(ProxyError::InvalidPath(key.to_string())),
        };

        tokio::fs::create_dir_all(dir).await?;

        let temp = dir.join(format!(".{}.{}.tmp", name, uuid::Uuid::new_v4()));
        let written = async {
            tokio::fs::write(&temp, entry.encode()).await?;
            tokio::fs::rename(&temp, &path).await
        }
        .await;

        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e.into());
        }

        tracing::debug!(key = %key, path = %path.display(), status = entry.status.as_u16(), "Cache entry stored");
        Ok(())
    }

    /// Keys with a fill currently in progress.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }
}
