//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits so a config can be built from flags,
//! environment or a serialized document alike.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Root configuration for the SPA proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Origin holding the versioned build output.
    pub origin: OriginConfig,

    /// Local response cache.
    pub cache: CacheConfig,

    /// Default version selection and refresh.
    pub versions: VersionConfig,

    /// Development passthrough routes.
    pub dev_proxy: DevProxyConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080" or ":8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:80".to_string(),
        }
    }
}

impl ListenerConfig {
    /// Resolve the bind address. A bare `:port` listens on all interfaces and
    /// an empty address means port 80.
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        let addr = self.bind_address.trim();
        if addr.is_empty() {
            return "0.0.0.0:80".parse();
        }
        match addr.strip_prefix(':') {
            Some(port) => format!("0.0.0.0:{}", port).parse(),
            None => addr.parse(),
        }
    }
}

/// Origin configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OriginConfig {
    /// Base URL of the origin. Cache keys are appended to its path.
    pub source: String,

    /// Timeout for a single origin fetch in seconds.
    pub fetch_timeout_secs: u64,
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            source: String::new(),
            fetch_timeout_secs: 10,
        }
    }
}

/// Disk cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Root directory holding one file per cached response.
    pub dir: PathBuf,

    /// Allow only one origin fetch per cache key at a time.
    pub single_flight: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            single_flight: true,
        }
    }
}

/// Default version configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VersionConfig {
    /// Fixed default version. When unset the origin is polled.
    pub default_version: Option<String>,

    /// Origin-relative path of the default version resource.
    pub poll_path: String,

    /// Delay between successful polls in seconds.
    pub refresh_interval_secs: u64,

    /// Delay after a failed poll in seconds.
    pub retry_delay_secs: u64,
}

impl Default for VersionConfig {
    fn default() -> Self {
        Self {
            default_version: None,
            poll_path: "default-version.txt".to_string(),
            refresh_interval_secs: 60,
            retry_delay_secs: 5,
        }
    }
}

/// A single dev-path passthrough record.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct DevPathConfig {
    /// Request path prefix to match (case-sensitive).
    pub prefix: String,

    /// Target base URL; only scheme and authority are used.
    pub target: String,
}

/// Development passthrough configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DevProxyConfig {
    /// Prefix routes, checked in order.
    pub routes: Vec<DevPathConfig>,

    /// Upstream timeout in seconds.
    pub timeout_secs: u64,

    /// Largest request body buffered for forwarding.
    pub max_body_bytes: usize,
}

impl Default for DevProxyConfig {
    fn default() -> Self {
        Self {
            routes: Vec::new(),
            timeout_secs: 60,
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Overall deadline for handling one request in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 90 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log output format.
    pub log_format: LogFormat,

    /// Prometheus endpoint bind address. Metrics are disabled when unset.
    pub metrics_address: Option<String>,
}
