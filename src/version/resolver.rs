//! Per-request version resolution.
//!
//! Precedence: `?version=` query parameter, then the `version-override`
//! cookie, then the store's default. A query or cookie pins the response:
//! the cookie is (re)issued with a one hour expiry and the response is marked
//! `no-store`, because HTTP caches key on neither the query-derived cookie nor
//! the cookie itself.
//!
//! The version is not checked against known versions. It is escaped so it
//! stays one path segment and the joined path is cleaned, so `..` simply
//! collapses away.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crate::http::path::{clean_path, decoded_path, escape_segment, with_path};
use crate::version::store::VersionStore;

/// Query parameter carrying an explicit version.
pub const VERSION_PARAM: &str = "version";

/// Cookie remembering a per-session version.
pub const VERSION_COOKIE: &str = "version-override";

/// Sliding lifetime of the version cookie.
pub const COOKIE_TTL: Duration = Duration::from_secs(60 * 60);

/// Where a resolved version came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedFrom {
    Query,
    Cookie,
    Default,
}

/// The version chosen for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVersion {
    /// Raw value as supplied (also the cookie value).
    pub version: String,
    pub from: ResolvedFrom,
}

impl ResolvedVersion {
    /// Prefix `path` with the escaped version and clean the result.
    pub fn apply(&self, path: &str) -> String {
        clean_path(&format!("/{}/{}", escape_segment(&self.version), path))
    }

    /// Whether the response must carry the cookie and `no-store`.
    pub fn pins_response(&self) -> bool {
        self.from != ResolvedFrom::Default
    }
}

/// Decide the version for a request.
pub fn resolve(query: Option<&str>, headers: &HeaderMap, store: &VersionStore) -> ResolvedVersion {
    if let Some(version) = query.and_then(query_version) {
        return ResolvedVersion {
            version,
            from: ResolvedFrom::Query,
        };
    }
    if let Some(version) = cookie_version(headers) {
        return ResolvedVersion {
            version,
            from: ResolvedFrom::Cookie,
        };
    }
    ResolvedVersion {
        version: store.current_default(),
        from: ResolvedFrom::Default,
    }
}

/// First `version` parameter, if non-empty.
fn query_version(query: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == VERSION_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

/// First `version-override` cookie, if non-empty.
fn cookie_version(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == VERSION_COOKIE)
        .map(|(_, value)| {
            let value = value.trim();
            value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value)
                .to_string()
        })
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value for `version`, expiring [`COOKIE_TTL`] from now.
pub fn version_cookie(version: &str) -> HeaderValue {
    let expires = httpdate::fmt_http_date(SystemTime::now() + COOKIE_TTL);
    let cookie = format!(
        "{}={}; Path=/; Expires={}",
        VERSION_COOKIE,
        sanitize_cookie_value(version),
        expires
    );
    // Sanitized value and HTTP date are visible ASCII.
    HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static("version-override=; Path=/"))
}

/// Drop bytes not allowed in a cookie value; quote values with spaces or
/// commas.
fn sanitize_cookie_value(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .filter(|c| matches!(*c, ' '..='~') && !matches!(*c, '"' | ';' | '\\'))
        .collect();
    if cleaned.contains(' ') || cleaned.contains(',') {
        format!("\"{}\"", cleaned)
    } else {
        cleaned
    }
}

/// Middleware: resolve the version, prefix the request path with it and pin
/// the response when the version came from the request.
pub async fn resolve_version(
    State(store): State<Arc<VersionStore>>,
    mut req: Request,
    next: Next,
) -> Response {
    let path = match decoded_path(req.uri()) {
        Ok(path) => path,
        Err(e) => return e.into_response(),
    };
    let resolved = resolve(req.uri().query(), req.headers(), &store);
    let versioned = resolved.apply(&path);

    tracing::trace!(
        version = %resolved.version,
        from = ?resolved.from,
        path = %path,
        versioned = %versioned,
        "Version resolved"
    );

    match with_path(req.uri(), &versioned) {
        Ok(uri) => *req.uri_mut() = uri,
        Err(e) => {
            tracing::error!(path = %path, version = %resolved.version, error = %e, "Failed to apply version");
            return e.into_response();
        }
    }
    req.extensions_mut().insert(resolved.clone());

    let mut response = next.run(req).await;

    if resolved.pins_response() {
        let headers = response.headers_mut();
        headers.append(header::SET_COOKIE, version_cookie(&resolved.version));
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    }

    response
}
