//! Effective-path helpers shared by the middleware chain.
//!
//! The chain works on percent-decoded paths. Whenever a path goes back into a
//! URI (the request, or the origin URL) it is re-encoded with [`PATH`], which
//! escapes `%` so a literal percent sign survives the round trip.

use axum::http::uri::{PathAndQuery, Uri};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::error::{ProxyError, ProxyResult};

/// Bytes escaped inside a single path segment. Everything except unreserved
/// characters and the sub-delimiters allowed in a segment, so `/`, `?` and
/// `%` are always escaped and `.` never is.
pub const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b',')
    .remove(b':')
    .remove(b';')
    .remove(b'=')
    .remove(b'@');

/// Like [`SEGMENT`] but keeps `/` as the separator.
pub const PATH: &AsciiSet = &SEGMENT.remove(b'/');

/// Escape a value so it can only ever form one path segment.
pub fn escape_segment(value: &str) -> String {
    utf8_percent_encode(value, SEGMENT).to_string()
}

/// Encode a decoded path for use in a URI.
pub fn encode_path(path: &str) -> String {
    utf8_percent_encode(path, PATH).to_string()
}

/// The percent-decoded path of a URI.
///
/// A path that does not decode to UTF-8 is an error: a lossy decode would map
/// distinct raw paths onto one cache key.
pub fn decoded_path(uri: &Uri) -> ProxyResult<String> {
    percent_decode_str(uri.path())
        .decode_utf8()
        .map(|path| path.into_owned())
        .map_err(|e| ProxyError::InvalidPath(format!("{}: {}", uri.path(), e)))
}

/// Lexically clean a path and root it at `/`.
///
/// Empty and `.` segments are dropped and `..` removes the previous segment;
/// `..` at the root stays at the root. A trailing slash is not preserved.
pub fn clean_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    format!("/{}", segments.join("/"))
}

/// File extension of the last path segment, including the dot.
pub fn extension(path: &str) -> Option<&str> {
    let last = path.rsplit('/').next().unwrap_or(path);
    last.rfind('.').map(|i| &last[i..])
}

/// Replace the path of `uri` with the encoded form of `decoded`, keeping the
/// query string.
pub fn with_path(uri: &Uri, decoded: &str) -> ProxyResult<Uri> {
    let encoded = encode_path(decoded);
    let path_and_query = match uri.query() {
        Some(query) => format!("{}?{}", encoded, query),
        None => encoded,
    };
    let path_and_query = PathAndQuery::try_from(path_and_query)
        .map_err(|e| ProxyError::InvalidPath(format!("{}: {}", decoded, e)))?;

    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(path_and_query);
    Uri::from_parts(parts).map_err(|e| ProxyError::InvalidPath(format!("{}: {}", decoded, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_path() {
        assert_eq!(clean_path("/"), "/");
        assert_eq!(clean_path(""), "/");
        assert_eq!(clean_path("/v1//index.html"), "/v1/index.html");
        assert_eq!(clean_path("/v1/./a/../b.css"), "/v1/b.css");
        assert_eq!(clean_path("/../index.html"), "/index.html");
        assert_eq!(clean_path("/../../../etc/passwd"), "/etc/passwd");
        assert_eq!(clean_path("/sub/app/"), "/sub/app");
        assert_eq!(clean_path("relative/x.js"), "/relative/x.js");
    }

    #[test]
    fn test_extension() {
        assert_eq!(extension("/style.css"), Some(".css"));
        assert_eq!(extension("/billing.html"), Some(".html"));
        assert_eq!(extension("/"), None);
        assert_eq!(extension("/sub/app"), None);
        assert_eq!(extension("/sub/app/"), None);
        assert_eq!(extension("/v1.2/app"), None);
        assert_eq!(extension("/archive.tar.gz"), Some(".gz"));
    }

    #[test]
    fn test_escape_segment() {
        assert_eq!(escape_segment("v1.2.3"), "v1.2.3");
        assert_eq!(escape_segment(".."), "..");
        assert_eq!(escape_segment("a/b"), "a%2Fb");
        assert_eq!(escape_segment("feature branch"), "feature%20branch");
        assert_eq!(escape_segment("x?y#z"), "x%3Fy%23z");
        assert_eq!(escape_segment("50%"), "50%25");
    }

    #[test]
    fn test_encode_decode_round_trip_keeps_literal_percent() {
        let decoded = "/a%2Fb/my file.js";
        let uri = with_path(&Uri::from_static("/x"), decoded).unwrap();
        assert_eq!(uri.path(), "/a%252Fb/my%20file.js");
        assert_eq!(decoded_path(&uri).unwrap(), decoded);
    }

    #[test]
    fn test_non_utf8_path_is_rejected() {
        assert_eq!(
            decoded_path(&Uri::from_static("/caf%C3%A9.js")).unwrap(),
            "/caf\u{e9}.js"
        );
        assert!(matches!(
            decoded_path(&Uri::from_static("/a%FF.js")),
            Err(ProxyError::InvalidPath(_))
        ));
        assert!(decoded_path(&Uri::from_static("/a%FE.js")).is_err());
    }

    #[test]
    fn test_with_path_keeps_query_and_authority() {
        let uri = Uri::from_static("http://example.com/old?version=v2&x=1");
        let rewritten = with_path(&uri, "/v2/index.html").unwrap();
        assert_eq!(rewritten.path(), "/v2/index.html");
        assert_eq!(rewritten.query(), Some("version=v2&x=1"));
        assert_eq!(rewritten.host(), Some("example.com"));
    }
}
