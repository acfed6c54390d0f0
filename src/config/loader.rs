//! Configuration loading from flags, environment and the dev-paths file.

use clap::{Parser, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::schema::{DevPathConfig, LogFormat, ProxyConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Parse error in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Command line flags. Every flag falls back to a `SPA_PROXY_*` variable.
#[derive(Debug, Clone, Parser)]
#[command(name = "spa-proxy")]
#[command(about = "Versioned single-page-application edge cache", long_about = None)]
pub struct Args {
    /// Origin base URL holding the versioned build output
    #[arg(long, env = "SPA_PROXY_SOURCE")]
    pub source: String,

    /// Directory for cached responses
    #[arg(long, env = "SPA_PROXY_CACHE_DIR", default_value = ".")]
    pub cache_dir: PathBuf,

    /// Fixed default version; when absent the origin is polled
    #[arg(long, env = "SPA_PROXY_DEFAULT_VERSION")]
    pub default_version: Option<String>,

    /// Listen address (`host:port` or `:port`)
    #[arg(long, env = "SPA_PROXY_BIND", default_value = "0.0.0.0:80")]
    pub bind: String,

    /// JSON file of `[{prefix, target}]` passthrough routes
    #[arg(long, env = "SPA_PROXY_DEV_PATHS")]
    pub dev_paths: Option<PathBuf>,

    /// Prometheus metrics listen address
    #[arg(long, env = "SPA_PROXY_METRICS_BIND")]
    pub metrics_bind: Option<String>,

    /// Log output format
    #[arg(long, env = "SPA_PROXY_LOG_FORMAT", value_enum, default_value_t = LogFormatArg::Pretty)]
    pub log_format: LogFormatArg,

    /// Serialize origin fetches per cache key
    #[arg(long, env = "SPA_PROXY_SINGLE_FLIGHT", default_value_t = true, action = clap::ArgAction::Set)]
    pub single_flight: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

/// Build and validate a configuration from parsed flags.
pub fn load_config(args: Args) -> Result<ProxyConfig, ConfigError> {
    let mut config = ProxyConfig::default();

    config.origin.source = args.source;
    config.cache.dir = args.cache_dir;
    config.cache.single_flight = args.single_flight;
    // An empty variable behaves like an unset one.
    config.versions.default_version = args.default_version.filter(|v| !v.is_empty());
    config.listener.bind_address = args.bind;
    config.observability.metrics_address = args.metrics_bind.filter(|a| !a.is_empty());
    config.observability.log_format = args.log_format.into();

    if let Some(path) = args.dev_paths.filter(|p| !p.as_os_str().is_empty()) {
        config.dev_proxy.routes = load_dev_paths(&path)?;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Read the dev-paths JSON file.
pub fn load_dev_paths(path: &Path) -> Result<Vec<DevPathConfig>, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
