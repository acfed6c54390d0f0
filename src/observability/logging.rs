//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem
//! - Emit one access-log event per request
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - Log level configurable via `RUST_LOG`
//! - Access events carry the extended common-log fields (mapped path, cache)

use axum::{
    extract::{ConnectInfo, Request},
    http::header,
    middleware::Next,
    response::Response,
};
use hyper::body::Body as _;
use std::net::SocketAddr;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogFormat;
use crate::http::request::request_id;
use crate::http::response::{cache_label, MappedPath};
use crate::observability::metrics;

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "spa_proxy=info,tower_http=info";

/// Install the global subscriber. Call once, before anything logs.
pub fn init(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
            .init(),
    }
}

/// Middleware: log and count every request once it has a response.
pub async fn access_log(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let remote = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.to_string())
        .unwrap_or_else(|| "-".to_string());
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let protocol = format!("{:?}", req.version());
    let id = request_id(req.headers()).to_string();

    let response = next.run(req).await;

    let status = response.status().as_u16();
    let cache = cache_label(&response);
    let mapped = response
        .extensions()
        .get::<MappedPath>()
        .map(|m| m.0.as_str())
        .unwrap_or("-");

    tracing::info!(
        target: "spa_proxy::access",
        request_id = %id,
        remote = %remote,
        method = %method,
        path = %path,
        protocol = %protocol,
        status,
        content_length = %content_length(&response),
        duration_secs = start.elapsed().as_secs_f64(),
        mapped_path = %mapped,
        cache = %cache,
        "request"
    );
    metrics::record_request(method.as_str(), status, cache, start);

    response
}

/// Declared or exactly known body length, `-` when streaming.
fn content_length(response: &Response) -> String {
    if let Some(value) = response
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
    {
        return value.to_string();
    }
    match response.body().size_hint().exact() {
        Some(len) => len.to_string(),
        None => "-".to_string(),
    }
}
