//! Request-path and background-task error types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while resolving, filling or forwarding a request, and by the
/// version refresh loop.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Local storage failure (read, write, rename, mkdir).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The origin could not be reached or the transfer failed.
    #[error("Origin request failed: {0}")]
    Origin(#[from] reqwest::Error),

    /// The origin answered the default-version poll with a non-success status.
    #[error("Origin returned {status} for {url}")]
    OriginStatus { url: String, status: u16 },

    /// The default-version resource was empty after trimming.
    #[error("Origin returned an empty default version")]
    EmptyVersion,

    /// A stored entry could not be parsed back into a response.
    #[error("Malformed cache entry at {path}: {reason}")]
    MalformedEntry { path: String, reason: String },

    /// A cache key or rewritten path that cannot be mapped safely.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// The entry was still absent after a successful fill.
    #[error("Cache entry missing after fill: {0}")]
    MissingAfterFill(String),

    /// A shared cache fill failed; every request waiting on it gets this.
    #[error("Cache fill failed: {0}")]
    FillFailed(Arc<ProxyError>),

    /// Dev-path upstream failed (connect, timeout, body).
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Dev-path target that never parsed as a URL.
    #[error("Unparsable dev-path target {0:?}")]
    BadTarget(String),
}

impl ProxyError {
    /// Status returned to the client for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::Upstream(_) | ProxyError::BadTarget(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        // Detail stays in the logs; the client only sees the status.
        self.status_code().into_response()
    }
}

pub type ProxyResult<T> = Result<T, ProxyError>;
