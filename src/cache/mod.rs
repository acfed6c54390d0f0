//! Response cache subsystem.
//!
//! # Data Flow
//! ```text
//! Versioned request path
//!     → key.rs (clean path, map to file and origin URL)
//!     → store.rs (disk lookup; on miss, single-flight fill)
//!     → fetcher.rs (GET from origin, 10s timeout)
//!     → entry.rs (serialize to / parse from disk)
//!     → Replayed response + X-Cache
//! ```
//!
//! # Design Decisions
//! - Entries are whole HTTP/1.1 responses, replayed verbatim
//! - Write-once: versions are immutable, so nothing is ever invalidated

pub mod entry;
pub mod fetcher;
pub mod key;
pub mod store;

pub use entry::CacheEntry;
pub use fetcher::OriginFetcher;
pub use key::CacheKey;
pub use store::{CacheStatus, DiskCache};
