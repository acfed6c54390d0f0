//! On-disk response format.
//!
//! An entry is a complete HTTP/1.1 response: status line, headers, a blank
//! line and the body. Hop-by-hop headers are dropped when encoding and
//! `Content-Length` is always recomputed, so every entry is self-delimiting.

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::Response,
};

/// Headers never written to an entry. `content-length` is recomputed.
const SKIPPED_HEADERS: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-connection",
    "transfer-encoding",
    "te",
    "trailer",
    "upgrade",
    "content-length",
];

/// Header slots parsed when the head has no terminator yet.
const MIN_HEADERS: usize = 32;

/// A cached origin response.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl CacheEntry {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Serialize as an HTTP/1.1 response.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.body.len() + 512);
        out.extend_from_slice(
            format!(
                "HTTP/1.1 {} {}\r\n",
                self.status.as_u16(),
                self.status.canonical_reason().unwrap_or("")
            )
            .as_bytes(),
        );

        for (name, value) in self.headers.iter() {
            if SKIPPED_HEADERS.contains(&name.as_str()) {
                continue;
            }
            out.extend_from_slice(name.as_str().as_bytes());
            out.extend_from_slice(b": ");
            out.extend_from_slice(value.as_bytes());
            out.extend_from_slice(b"\r\n");
        }

        out.extend_from_slice(format!("content-length: {}\r\n\r\n", self.body.len()).as_bytes());
        out.extend_from_slice(&self.body);
        out
    }

    /// Parse an entry written by [`CacheEntry::encode`]. The error is a
    /// human-readable reason.
    pub fn decode(bytes: Bytes) -> Result<Self, String> {
        let mut storage = vec![httparse::EMPTY_HEADER; header_capacity(&bytes)];
        let mut parsed = httparse::Response::new(&mut storage);

        let header_len = match parsed.parse(&bytes) {
            Ok(httparse::Status::Complete(len)) => len,
            Ok(httparse::Status::Partial) => return Err("truncated header block".to_string()),
            Err(e) => return Err(format!("unparsable response head: {}", e)),
        };

        let code = parsed.code.ok_or_else(|| "missing status code".to_string())?;
        let status =
            StatusCode::from_u16(code).map_err(|e| format!("invalid status {}: {}", code, e))?;

        let mut headers = HeaderMap::with_capacity(parsed.headers.len());
        for h in parsed.headers.iter() {
            let name = HeaderName::from_bytes(h.name.as_bytes())
                .map_err(|e| format!("invalid header name {:?}: {}", h.name, e))?;
            let value = HeaderValue::from_bytes(h.value)
                .map_err(|e| format!("invalid value for {}: {}", name, e))?;
            headers.append(name, value);
        }

        if headers.contains_key(header::TRANSFER_ENCODING) {
            return Err("transfer-encoded entries are not supported".to_string());
        }

        let mut body = bytes.slice(header_len..);
        if let Some(value) = headers.get(header::CONTENT_LENGTH) {
            let declared: usize = value
                .to_str()
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .ok_or_else(|| format!("invalid content-length {:?}", value))?;
            if body.len() < declared {
                return Err(format!(
                    "truncated body: {} of {} bytes",
                    body.len(),
                    declared
                ));
            }
            body.truncate(declared);
        }

        Ok(Self {
            status,
            headers,
            body,
        })
    }

    /// Replay as a response: stored status, every stored header, stored body.
    pub fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Upper bound on the header count: one slot per line of the head.
fn header_capacity(bytes: &[u8]) -> usize {
    match bytes.windows(4).position(|w| w == b"\r\n\r\n") {
        Some(end) => bytes[..end]
            .iter()
            .filter(|&&b| b == b'\n')
            .count()
            .max(MIN_HEADERS),
        None => MIN_HEADERS,
    }
}
