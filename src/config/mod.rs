//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! flags / SPA_PROXY_* environment
//!     → loader.rs (clap parse, dev-paths JSON)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → handed to startup, which builds the subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (clap/serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, Args, ConfigError};
pub use schema::ProxyConfig;
pub use schema::{
    CacheConfig, DevPathConfig, DevProxyConfig, ListenerConfig, LogFormat, ObservabilityConfig,
    OriginConfig, VersionConfig,
};
