//! Shared utilities for integration testing.

#![allow(dead_code)]

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

use spa_proxy::config::ProxyConfig;
use spa_proxy::lifecycle::{self, Shutdown};
use spa_proxy::HttpServer;

#[derive(Clone)]
struct StoredFile {
    status: StatusCode,
    content_type: &'static str,
    body: String,
}

#[derive(Default)]
struct OriginState {
    files: Mutex<HashMap<String, StoredFile>>,
    hits: Mutex<HashMap<String, usize>>,
    delay: Mutex<Duration>,
}

/// A programmable origin serving an in-memory file tree.
pub struct MockOrigin {
    pub addr: SocketAddr,
    state: Arc<OriginState>,
}

impl MockOrigin {
    pub async fn start() -> Self {
        let state = Arc::new(OriginState::default());
        let app = Router::new()
            .fallback(serve_file)
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self { addr, state }
    }

    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// Serve `body` with status 200 at `path`.
    pub fn put(&self, path: &str, content_type: &'static str, body: &str) {
        self.put_with_status(path, StatusCode::OK, content_type, body);
    }

    pub fn put_with_status(
        &self,
        path: &str,
        status: StatusCode,
        content_type: &'static str,
        body: &str,
    ) {
        self.state.files.lock().unwrap().insert(
            path.to_string(),
            StoredFile {
                status,
                content_type,
                body: body.to_string(),
            },
        );
    }

    pub fn set_default_version(&self, version: &str) {
        self.put("/default-version.txt", "text/plain", version);
    }

    /// Delay every response by `delay`.
    pub fn set_delay(&self, delay: Duration) {
        *self.state.delay.lock().unwrap() = delay;
    }

    /// Requests received for `path`.
    pub fn hits(&self, path: &str) -> usize {
        self.state
            .hits
            .lock()
            .unwrap()
            .get(path)
            .copied()
            .unwrap_or(0)
    }
}

async fn serve_file(State(state): State<Arc<OriginState>>, req: Request) -> Response {
    let path = req.uri().path().to_string();
    *state.hits.lock().unwrap().entry(path.clone()).or_default() += 1;

    let delay = *state.delay.lock().unwrap();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let file = state.files.lock().unwrap().get(&path).cloned();
    match file {
        Some(file) => (
            file.status,
            [(header::CONTENT_TYPE, file.content_type)],
            file.body,
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "404 page not found").into_response(),
    }
}

/// Proxy configuration against `origin`, caching under `cache_dir`.
pub fn proxy_config(origin: &MockOrigin, cache_dir: &Path) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.origin.source = origin.url();
    config.cache.dir = cache_dir.to_path_buf();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config
}

/// A running proxy on an ephemeral port.
pub struct TestProxy {
    pub addr: SocketAddr,
    pub cache_dir: PathBuf,
    shutdown: Shutdown,
}

impl TestProxy {
    pub async fn start(config: ProxyConfig) -> Self {
        let shutdown = Shutdown::new();
        let services = lifecycle::start(&config, &shutdown).await.unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = HttpServer::new(&config, &services);
        let rx = shutdown.subscribe();
        tokio::spawn(async move {
            server.run(listener, rx).await.unwrap();
        });

        Self {
            addr,
            cache_dir: config.cache.dir.clone(),
            shutdown,
        }
    }

    pub fn url(&self, path_and_query: &str) -> String {
        format!("http://{}{}", self.addr, path_and_query)
    }
}

impl Drop for TestProxy {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Client without cookie storage or redirects.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}

/// Every file below `dir`, relative and `/`-separated.
pub fn files_under(dir: &Path) -> Vec<String> {
    fn walk(root: &Path, dir: &Path, out: &mut Vec<String>) {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                walk(root, &path, out);
            } else if let Ok(rel) = path.strip_prefix(root) {
                let rel: Vec<_> = rel
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                out.push(rel.join("/"));
            }
        }
    }
    let mut out = Vec::new();
    walk(dir, dir, &mut out);
    out.sort();
    out
}
