//! Process-wide default version holder.
//!
//! One writer (the refresh loop) and many readers (request handlers). The
//! value lives behind an [`ArcSwap`]: readers never block, a replacement is a
//! single pointer swap, and a reader holding the previous `Arc` keeps a valid
//! string until it drops it.

use arc_swap::ArcSwap;
use std::sync::Arc;
use std::time::SystemTime;

/// A default version and when it was last confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionState {
    pub version: String,
    pub updated_at: SystemTime,
}

/// How the store is kept current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionMode {
    /// Supplied at startup, never refreshed.
    Fixed,
    /// Refreshed from the origin by a background poller.
    Polling,
}

/// Shared holder of the current default version.
#[derive(Debug)]
pub struct VersionStore {
    state: ArcSwap<VersionState>,
    mode: VersionMode,
}

impl VersionStore {
    /// A store pinned to `version`.
    pub fn fixed(version: impl Into<String>) -> Self {
        Self::with_mode(version.into(), VersionMode::Fixed)
    }

    /// A store seeded with the result of the initial origin poll.
    pub fn polling(initial: impl Into<String>) -> Self {
        Self::with_mode(initial.into(), VersionMode::Polling)
    }

    fn with_mode(version: String, mode: VersionMode) -> Self {
        Self {
            state: ArcSwap::from_pointee(VersionState {
                version,
                updated_at: SystemTime::now(),
            }),
            mode,
        }
    }

    /// The current default version.
    pub fn current_default(&self) -> String {
        self.state.load().version.clone()
    }

    /// Snapshot of the full state.
    pub fn current(&self) -> Arc<VersionState> {
        self.state.load_full()
    }

    pub fn mode(&self) -> VersionMode {
        self.mode
    }

    /// Replace the stored value. Returns true when the version changed.
    pub fn replace(&self, version: impl Into<String>) -> bool {
        let next = Arc::new(VersionState {
            version: version.into(),
            updated_at: SystemTime::now(),
        });
        let previous = self.state.swap(Arc::clone(&next));
        let changed = previous.version != next.version;
        if changed {
            tracing::info!(
                old = %previous.version,
                new = %next.version,
                "Default version changed"
            );
        }
        changed
    }
}
