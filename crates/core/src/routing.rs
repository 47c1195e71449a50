//! Request classification.
//!
//! A `RouteTable` is an ordered list of prefix rules built once from
//! configuration. The first rule with a matching prefix decides the policy;
//! a path matching no rule falls back to stale-while-revalidate.

use serde::Serialize;

use crate::config::RoutesConfig;

/// The caching strategy that governs a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// Serve from cache; only hit the network on a miss.
    CacheFirst,
    /// Always try the network; fall back to cache when it fails.
    NetworkFirst,
    /// Serve the cached copy immediately and refresh it in the background.
    StaleWhileRevalidate,
}

/// A set of path prefixes sharing one policy.
#[derive(Debug, Clone)]
pub struct RouteRule {
    prefixes: Vec<String>,
    policy: Policy,
}

impl RouteRule {
    pub fn new(prefixes: impl IntoIterator<Item = impl Into<String>>, policy: Policy) -> Self {
        Self { prefixes: prefixes.into_iter().map(Into::into).collect(), policy }
    }

    pub fn matches(&self, path: &str) -> bool {
        self.prefixes.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }
}

/// Immutable routing configuration handed to the worker at startup.
#[derive(Debug, Clone)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
    cacheable: Vec<String>,
    image_marker: String,
    offline_image: String,
    offline_home: String,
}

impl RouteTable {
    /// Build the table in its fixed precedence: static prefix, then the
    /// network-first list, then the default.
    pub fn from_config(routes: &RoutesConfig) -> Self {
        Self {
            rules: vec![
                RouteRule::new([routes.static_prefix.as_str()], Policy::CacheFirst),
                RouteRule::new(routes.network_first.iter().map(String::as_str), Policy::NetworkFirst),
            ],
            cacheable: routes.cacheable.clone(),
            image_marker: routes.image_marker.clone(),
            offline_image: routes.offline_image.clone(),
            offline_home: routes.offline_home.clone(),
        }
    }

    pub fn classify(&self, path: &str) -> Policy {
        self.rules
            .iter()
            .find(|rule| rule.matches(path))
            .map_or(Policy::StaleWhileRevalidate, RouteRule::policy)
    }

    /// Whether a network-first response for this path may be stored.
    pub fn is_cacheable(&self, path: &str) -> bool {
        self.cacheable.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }

    pub fn is_image(&self, path: &str) -> bool {
        path.contains(self.image_marker.as_str())
    }

    pub fn offline_image(&self) -> &str {
        &self.offline_image
    }

    pub fn offline_home(&self) -> &str {
        &self.offline_home
    }
}
