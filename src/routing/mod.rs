//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (original path)
//!     → router.rs (dev-path lookup: first matching prefix wins)
//!         match    → forwarded untouched by http::dev_proxy
//!         no match → rewrite.rs (extensionless paths → entry document)
//!                  → version resolution
//!
//! Route Compilation (at startup):
//!     DevPathConfig[] (file order)
//!     → parse targets
//!     → Freeze as immutable DevRouter
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same route

pub mod matcher;
pub mod rewrite;
pub mod router;

pub use rewrite::{rewrite_app_routes, ENTRY_DOCUMENT};
pub use router::{DevRoute, DevRouter, DevTarget};
