//! Response labelling.
//!
//! The cache handler tags its responses so outer layers (access log,
//! metrics) can report what was served without re-deriving it.

use axum::http::{HeaderName, Response};

use crate::cache::CacheStatus;

/// Header reporting whether the entry was already cached.
pub const X_CACHE: HeaderName = HeaderName::from_static("x-cache");

/// Response extension: the cache key actually served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedPath(pub String);

/// Stamp `response` with its cache status and mapped path.
pub fn label<B>(response: &mut Response<B>, status: CacheStatus, mapped: &str) {
    response.headers_mut().insert(X_CACHE, status.header_value());
    response.extensions_mut().insert(status);
    response
        .extensions_mut()
        .insert(MappedPath(mapped.to_string()));
}

/// Cache status label for metrics, `none` for responses that never reached
/// the cache.
pub fn cache_label<B>(response: &Response<B>) -> &'static str {
    response
        .extensions()
        .get::<CacheStatus>()
        .map(CacheStatus::as_str)
        .unwrap_or("none")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label() {
        let mut response = Response::new(());
        assert_eq!(cache_label(&response), "none");

        label(&mut response, CacheStatus::Miss, "/v1/index.html");
        assert_eq!(response.headers().get(X_CACHE).unwrap(), "miss");
        assert_eq!(cache_label(&response), "miss");
        assert_eq!(
            response.extensions().get::<MappedPath>(),
            Some(&MappedPath("/v1/index.html".into()))
        );
    }
}
