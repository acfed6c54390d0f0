//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde and clap handle syntactic)
//! - Check the origin URL is usable as a fetch base
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match Url::parse(&config.origin.source) {
        Ok(url) => {
            if url.scheme() != "http" && url.scheme() != "https" {
                errors.push(ValidationError::new(
                    "origin.source",
                    format!("unsupported scheme {:?}", url.scheme()),
                ));
            }
            if url.host_str().is_none() {
                errors.push(ValidationError::new("origin.source", "missing host"));
            }
        }
        Err(e) => {
            errors.push(ValidationError::new(
                "origin.source",
                format!("invalid url {:?}: {}", config.origin.source, e),
            ));
        }
    }

    if let Err(e) = config.listener.socket_addr() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("{:?}: {}", config.listener.bind_address, e),
        ));
    }

    if let Some(addr) = &config.observability.metrics_address {
        if let Err(e) = addr.parse::<SocketAddr>() {
            errors.push(ValidationError::new(
                "observability.metrics_address",
                format!("{:?}: {}", addr, e),
            ));
        }
    }

    if let Some(version) = &config.versions.default_version {
        if version.is_empty() {
            errors.push(ValidationError::new(
                "versions.default_version",
                "must not be empty when set",
            ));
        }
    }

    let durations = [
        ("origin.fetch_timeout_secs", config.origin.fetch_timeout_secs),
        ("versions.refresh_interval_secs", config.versions.refresh_interval_secs),
        ("versions.retry_delay_secs", config.versions.retry_delay_secs),
        ("dev_proxy.timeout_secs", config.dev_proxy.timeout_secs),
        ("timeouts.request_secs", config.timeouts.request_secs),
    ];
    for (field, secs) in durations {
        if secs == 0 {
            errors.push(ValidationError::new(field, "must be greater than zero"));
        }
    }

    for route in &config.dev_proxy.routes {
        // The empty prefix forwards every request.
        if !route.prefix.is_empty() && !route.prefix.starts_with('/') {
            errors.push(ValidationError::new(
                "dev_proxy.routes",
                format!("prefix {:?} must be empty or start with '/'", route.prefix),
            ));
        }
        // Unparsable targets fail per request; parsable ones must be reachable
        // by the plain-http forwarding client.
        if let Ok(target) = Url::parse(&route.target) {
            if target.scheme() != "http" {
                errors.push(ValidationError::new(
                    "dev_proxy.routes",
                    format!(
                        "target {:?} for prefix {:?}: only http targets are supported",
                        route.target, route.prefix
                    ),
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
