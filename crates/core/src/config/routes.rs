//! Route classification rules as they appear in configuration.
//!
//! The client crate compiles these into a `RouteTable`; here they are plain
//! data so they can be loaded by figment and echoed back by the server.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Caching behavior applied to a classified request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Network, then cache on failure.
    NetworkFirst,
    /// Cache, then network on miss, synthetic 404 if both fail.
    CacheFirst,
    /// Cache immediately, refresh in the background.
    StaleWhileRevalidate,
    /// Network-first for page navigations, offline document as the last resort.
    NetworkFirstOffline,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::NetworkFirst => "network-first",
            Strategy::CacheFirst => "cache-first",
            Strategy::StaleWhileRevalidate => "stale-while-revalidate",
            Strategy::NetworkFirstOffline => "network-first-offline",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Predicate half of a route rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "pattern", rename_all = "snake_case")]
pub enum RouteMatcher {
    /// Regular expression matched against the full URL.
    Regex(String),
    /// Exact path match on the request origin.
    Path(String),
    /// Full-page navigation requests.
    Navigate,
    /// Matches everything on the router's own origin.
    Any,
}

/// One (pattern, strategy) pair. Order in the list is priority order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSpec {
    pub name: String,
    pub matcher: RouteMatcher,
    pub strategy: Strategy,
}

impl RouteSpec {
    pub fn new(name: &str, matcher: RouteMatcher, strategy: Strategy) -> Self {
        Self { name: name.to_string(), matcher, strategy }
    }
}

/// Built-in rule set: API > images > fonts/CDN > navigation > default.
pub fn default_routes() -> Vec<RouteSpec> {
    vec![
        RouteSpec::new("api", RouteMatcher::Regex(r"^https://api\.github\.com/".into()), Strategy::NetworkFirst),
        RouteSpec::new(
            "images",
            RouteMatcher::Regex(r"(?i)\.(png|jpe?g|gif|webp|svg|ico|avif)(\?.*)?$".into()),
            Strategy::CacheFirst,
        ),
        RouteSpec::new(
            "fonts",
            RouteMatcher::Regex(
                r"^https://(fonts\.googleapis\.com|fonts\.gstatic\.com|cdn\.jsdelivr\.net|cdnjs\.cloudflare\.com|unpkg\.com)/"
                    .into(),
            ),
            Strategy::StaleWhileRevalidate,
        ),
        RouteSpec::new("navigation", RouteMatcher::Navigate, Strategy::NetworkFirstOffline),
        RouteSpec::new("default", RouteMatcher::Any, Strategy::NetworkFirst),
    ]
}
