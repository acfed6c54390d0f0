//! Cache keys.
//!
//! A key is the cleaned, decoded, version-prefixed request path. The same key
//! names the file under the cache root and the path appended to the origin.

use std::fmt;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use url::Url;

use crate::error::{ProxyError, ProxyResult};
use crate::http::path::{clean_path, encode_path};

/// Normalized cache key. Always rooted, never contains `.` or `..` segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Build a key from a decoded request path.
    pub fn new(path: &str) -> Self {
        Self(clean_path(path))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Non-empty segments of the key.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Location of the entry under `root`.
    ///
    /// Rejects segments that would be read as more than one path component
    /// by the platform, so the result always stays below `root`.
    pub fn file_path(&self, root: &Path) -> ProxyResult<PathBuf> {
        let mut path = root.to_path_buf();
        let mut depth = 0;
        for segment in self.segments() {
            let embedded_separator = MAIN_SEPARATOR != '/' && segment.contains(MAIN_SEPARATOR);
            if embedded_separator || segment.contains('\0') || segment == "." || segment == ".." {
                return Err(ProxyError::InvalidPath(self.0.clone()));
            }
            path.push(segment);
            depth += 1;
        }
        if depth == 0 {
            return Err(ProxyError::InvalidPath(self.0.clone()));
        }
        Ok(path)
    }

    /// Origin URL for this key: the source's path joined with the key.
    pub fn origin_url(&self, source: &Url) -> Url {
        let mut url = source.clone();
        let joined = clean_path(&format!("{}/{}", source.path(), self.0));
        url.set_path(&encode_path(&joined));
        url.set_query(None);
        url.set_fragment(None);
        url
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
