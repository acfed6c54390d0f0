//! Dev-path route table.
//!
//! # Responsibilities
//! - Store the configured passthrough routes in file order
//! - Look up the first route whose prefix matches a request path
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) prefix scan (dev route lists are short)
//! - First match wins, so more specific prefixes must be listed first
//! - Targets are parsed once; a bad target is kept and fails per request

use url::Url;

use crate::config::DevPathConfig;
use crate::routing::matcher::PathPrefixMatcher;

/// Where a dev route forwards to.
#[derive(Debug, Clone)]
pub enum DevTarget {
    /// Parsed target base URL.
    Url(Url),
    /// Target string that did not parse.
    Invalid(String),
}

/// A compiled dev-path route.
#[derive(Debug, Clone)]
pub struct DevRoute {
    pub matcher: PathPrefixMatcher,
    pub target: DevTarget,
}

/// Ordered table of dev-path routes.
#[derive(Debug, Clone, Default)]
pub struct DevRouter {
    routes: Vec<DevRoute>,
}

impl DevRouter {
    /// Compile routes from configuration.
    pub fn from_config(configs: Vec<DevPathConfig>) -> Self {
        let routes = configs
            .into_iter()
            .map(|config| {
                let target = match Url::parse(&config.target) {
                    Ok(url) if url.has_host() => DevTarget::Url(url),
                    Ok(_) => {
                        tracing::warn!(prefix = %config.prefix, target = %config.target, "Dev target has no host");
                        DevTarget::Invalid(config.target)
                    }
                    Err(e) => {
                        tracing::warn!(prefix = %config.prefix, target = %config.target, error = %e, "Unparsable dev target");
                        DevTarget::Invalid(config.target)
                    }
                };
                DevRoute {
                    matcher: PathPrefixMatcher::new(config.prefix),
                    target,
                }
            })
            .collect();

        Self { routes }
    }

    /// First route matching `path`, if any.
    pub fn match_path(&self, path: &str) -> Option<&DevRoute> {
        self.routes.iter().find(|route| route.matcher.matches(path))
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(prefix: &str, target: &str) -> DevPathConfig {
        DevPathConfig {
            prefix: prefix.into(),
            target: target.into(),
        }
    }

    #[test]
    fn test_first_match_wins() {
        let router = DevRouter::from_config(vec![
            route("/api/auth", "http://localhost:4001"),
            route("/api", "http://localhost:4000"),
        ]);
        assert_eq!(router.len(), 2);

        let matched = router.match_path("/api/auth/login").unwrap();
        assert_eq!(matched.matcher.prefix(), "/api/auth");

        let matched = router.match_path("/api/users").unwrap();
        assert_eq!(matched.matcher.prefix(), "/api");

        assert!(router.match_path("/index.html").is_none());
    }

    #[test]
    fn test_invalid_target_kept() {
        let router = DevRouter::from_config(vec![
            route("/broken", "::nope"),
            route("/hostless", "mailto:dev@example.com"),
        ]);
        assert!(matches!(
            router.match_path("/broken/x").unwrap().target,
            DevTarget::Invalid(ref t) if t == "::nope"
        ));
        assert!(matches!(
            router.match_path("/hostless").unwrap().target,
            DevTarget::Invalid(_)
        ));
    }

    #[test]
    fn test_empty_router() {
        let router = DevRouter::from_config(Vec::new());
        assert!(router.is_empty());
        assert!(router.match_path("/").is_none());
    }
}
