//! Single-page-application route rewriting.
//!
//! Any request whose last path segment has no extension is an application
//! route and is served the entry document. Runs before version resolution so
//! the entry document itself gets the version prefix.

use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::path::{decoded_path, extension, with_path};

/// The document every application route resolves to.
pub const ENTRY_DOCUMENT: &str = "/index.html";

/// Effective path for `path` after the SPA rewrite.
pub fn rewrite_path(path: &str) -> &str {
    if extension(path).is_none() {
        ENTRY_DOCUMENT
    } else {
        path
    }
}

/// Middleware applying [`rewrite_path`] to the request URI.
pub async fn rewrite_app_routes(mut req: Request, next: Next) -> Response {
    let path = match decoded_path(req.uri()) {
        Ok(path) => path,
        Err(e) => {
            tracing::warn!(path = %req.uri().path(), error = %e, "Rejected undecodable path");
            return e.into_response();
        }
    };
    let rewritten = rewrite_path(&path);

    if rewritten != path {
        match with_path(req.uri(), rewritten) {
            Ok(uri) => *req.uri_mut() = uri,
            Err(e) => {
                tracing::error!(path = %path, error = %e, "Failed to rewrite application route");
                return e.into_response();
            }
        }
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request as HttpRequest, middleware, Router};
    use tower::ServiceExt;

    async fn effective_path(uri: &str) -> String {
        let app = Router::new()
            .fallback(|req: Request| async move { req.uri().path().to_string() })
            .layer(middleware::from_fn(rewrite_app_routes));

        let response = app
            .oneshot(HttpRequest::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_app_rewrite() {
        let cases = [
            ("/", "/index.html"),
            ("/index.html", "/index.html"),
            ("/style.css", "/style.css"),
            ("/billing.html", "/billing.html"),
            ("/sub/app", "/index.html"),
            ("/sub/app/", "/index.html"),
        ];
        for (input, expected) in cases {
            assert_eq!(effective_path(input).await, expected, "rewrite of {}", input);
        }
    }

    #[tokio::test]
    async fn test_query_survives_rewrite() {
        let app = Router::new()
            .fallback(|req: Request| async move { req.uri().to_string() })
            .layer(middleware::from_fn(rewrite_app_routes));

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/dashboard?version=v3")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"/index.html?version=v3");
    }

    #[test]
    fn test_rewrite_path() {
        assert_eq!(rewrite_path("/deep/link/42"), ENTRY_DOCUMENT);
        assert_eq!(rewrite_path("/assets/app.9f8e.js"), "/assets/app.9f8e.js");
    }
}
