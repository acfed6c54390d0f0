//! Development path passthrough.
//!
//! # Responsibilities
//! - Match the incoming path against configured dev prefixes
//! - Forward matching requests, unmodified, to the prefix's target
//! - Return the upstream response as-is
//!
//! # Design Decisions
//! - Runs before any rewriting: the client's own path and query are sent
//! - Nothing here is cached or versioned
//! - The request body is buffered (bounded) before forwarding
//! - Any failure is a 502 for that request only

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::config::DevProxyConfig;
use crate::error::{ProxyError, ProxyResult};
use crate::http::path::decoded_path;
use crate::observability::metrics;
use crate::routing::{DevRoute, DevRouter, DevTarget};

/// Shared state of the dev passthrough middleware.
#[derive(Clone)]
pub struct DevProxy {
    router: Arc<DevRouter>,
    client: Client<HttpConnector, Body>,
    timeout: Duration,
    max_body_bytes: usize,
}

impl DevProxy {
    pub fn new(router: DevRouter, config: &DevProxyConfig) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self {
            router: Arc::new(router),
            client,
            timeout: Duration::from_secs(config.timeout_secs),
            max_body_bytes: config.max_body_bytes,
        }
    }

    pub fn router(&self) -> &DevRouter {
        &self.router
    }

    async fn forward(&self, route: &DevRoute, req: Request) -> ProxyResult<Response> {
        let target = match &route.target {
            DevTarget::Url(url) => url,
            DevTarget::Invalid(raw) => return Err(ProxyError::BadTarget(raw.clone())),
        };

        let (parts, body) = req.into_parts();
        let uri = target_uri(target, &parts.uri)?;
        let body = axum::body::to_bytes(body, self.max_body_bytes)
            .await
            .map_err(|e| ProxyError::Upstream(format!("reading request body: {}", e)))?;

        let mut headers = parts.headers;
        headers.remove(header::HOST);
        headers.remove(header::CONTENT_LENGTH);

        let mut upstream = Request::new(Body::from(body));
        *upstream.method_mut() = parts.method;
        *upstream.uri_mut() = uri.clone();
        *upstream.headers_mut() = headers;

        tracing::info!(
            prefix = %route.matcher.prefix(),
            target = %uri,
            "Dev proxy forward"
        );

        let response: hyper::Response<hyper::body::Incoming> =
            tokio::time::timeout(self.timeout, self.client.request(upstream))
                .await
                .map_err(|_| {
                    ProxyError::Upstream(format!(
                        "{} timed out after {}s",
                        uri,
                        self.timeout.as_secs()
                    ))
                })?
                .map_err(|e| ProxyError::Upstream(format!("{}: {}", uri, e)))?;

        let (parts, body) = response.into_parts();
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}

/// `target`'s scheme and authority with the client's path and query.
fn target_uri(target: &Url, original: &Uri) -> ProxyResult<Uri> {
    let host = target
        .host_str()
        .ok_or_else(|| ProxyError::BadTarget(target.to_string()))?;
    let authority = match target.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };
    let path_and_query = original
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    Uri::try_from(format!("{}://{}{}", target.scheme(), authority, path_and_query))
        .map_err(|e| ProxyError::BadTarget(format!("{}: {}", target, e)))
}

/// Middleware: forward dev-prefixed paths, pass everything else on.
pub async fn forward_dev_paths(State(proxy): State<DevProxy>, req: Request, next: Next) -> Response {
    if proxy.router.is_empty() {
        return next.run(req).await;
    }

    // Undecodable paths match no prefix and are rejected further in.
    let Ok(path) = decoded_path(req.uri()) else {
        return next.run(req).await;
    };
    let Some(route) = proxy.router.match_path(&path) else {
        return next.run(req).await;
    };

    match proxy.forward(route, req).await {
        Ok(response) => {
            metrics::record_dev_proxy("success");
            response
        }
        Err(e) => {
            metrics::record_dev_proxy("failure");
            tracing::error!(path = %path, prefix = %route.matcher.prefix(), error = %e, "Dev proxy failed");
            e.into_response()
        }
    }
}
