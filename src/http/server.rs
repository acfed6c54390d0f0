//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the cache handler
//! - Wire up middleware (tracing, request ID, timeout, access log, dev
//!   passthrough, SPA rewrite, version resolution)
//! - Bind server to listener and drain on shutdown
//!
//! # Middleware order (outermost first)
//! ```text
//! SetRequestId → Trace → PropagateRequestId → Timeout → access_log
//!     → forward_dev_paths → rewrite_app_routes → resolve_version → serve_cached
//! ```

use axum::{
    extract::{Request, State},
    middleware,
    response::{IntoResponse, Response},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::cache::{CacheKey, DiskCache};
use crate::config::ProxyConfig;
use crate::http::dev_proxy::{forward_dev_paths, DevProxy};
use crate::http::path::decoded_path;
use crate::http::request::{request_id, MakeRequestUuid};
use crate::http::response::label;
use crate::lifecycle::shutdown;
use crate::lifecycle::Services;
use crate::observability::logging::access_log;
use crate::routing::rewrite_app_routes;
use crate::version::{resolve_version, VersionStore};

/// Application state injected into the cache handler.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<DiskCache>,
}

/// HTTP server for the SPA proxy.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(config: &ProxyConfig, services: &Services) -> Self {
        let router = Self::build_router(
            config,
            Arc::clone(&services.cache),
            Arc::clone(&services.versions),
            services.dev_proxy.clone(),
        );
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn build_router(
        config: &ProxyConfig,
        cache: Arc<DiskCache>,
        versions: Arc<VersionStore>,
        dev_proxy: DevProxy,
    ) -> Router {
        Router::new()
            .fallback(serve_cached)
            .with_state(AppState { cache })
            .layer(middleware::from_fn_with_state(versions, resolve_version))
            .layer(middleware::from_fn(rewrite_app_routes))
            .layer(middleware::from_fn_with_state(dev_proxy, forward_dev_paths))
            .layer(middleware::from_fn(access_log))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The assembled router, for driving the server in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires, then drain in-flight
    /// requests.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown::recv(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Replay the cache entry for the (rewritten, versioned) request path.
async fn serve_cached(State(state): State<AppState>, req: Request) -> Response {
    let key = match decoded_path(req.uri()) {
        Ok(path) => CacheKey::new(&path),
        Err(e) => return e.into_response(),
    };
    let (status, result) = state.cache.serve(&key).await;

    let mut response = match result {
        Ok(entry) => entry.into_response(),
        Err(e) => {
            tracing::error!(
                request_id = %request_id(req.headers()),
                key = %key,
                cache = status.as_str(),
                error = %e,
                "Failed to serve cache entry"
            );
            e.into_response()
        }
    };
    label(&mut response, status, key.as_str());
    response
}
