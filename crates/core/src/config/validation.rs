//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

fn check_timeout(field: &str, value: u64) -> Result<(), ConfigError> {
    if value < 100 {
        return Err(invalid(field, "must be at least 100ms"));
    }
    if value > 300_000 {
        return Err(invalid(field, "must not exceed 5 minutes (300000ms)"));
    }
    Ok(())
}

fn check_paths<'a>(field: &str, paths: impl IntoIterator<Item = &'a String>) -> Result<(), ConfigError> {
    for path in paths {
        if !path.starts_with('/') {
            return Err(invalid(field, format!("'{path}' must start with '/'")));
        }
    }
    Ok(())
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` or `network_timeout_ms` is below 100ms or above 5 minutes
    /// - `user_agent`, `cache_namespace` or `cache_version` is empty
    /// - `origin` is not an absolute http(s) URL
    /// - a route path does not start with `/`
    ///
    /// Returns `ConfigError::Missing` if `listen_addr` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        check_timeout("timeout_ms", self.timeout_ms)?;
        check_timeout("network_timeout_ms", self.network_timeout_ms)?;

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }
        if self.cache_namespace.is_empty() {
            return Err(invalid("cache_namespace", "must not be empty"));
        }
        if self.cache_version.is_empty() {
            return Err(invalid("cache_version", "must not be empty"));
        }

        if self.listen_addr.is_empty() {
            return Err(ConfigError::Missing {
                field: "listen_addr".into(),
                hint: "Set SWCACHE_LISTEN_ADDR environment variable".into(),
            });
        }

        match url::Url::parse(&self.origin) {
            Ok(origin) if matches!(origin.scheme(), "http" | "https") => {}
            Ok(origin) => return Err(invalid("origin", format!("unsupported scheme: {}", origin.scheme()))),
            Err(e) => return Err(invalid("origin", e.to_string())),
        }

        let routes = &self.routes;
        if routes.static_prefix.is_empty() {
            return Err(invalid("routes.static_prefix", "must not be empty"));
        }
        check_paths("routes.static_prefix", [&routes.static_prefix])?;
        check_paths("routes.static_assets", &routes.static_assets)?;
        check_paths("routes.network_first", &routes.network_first)?;
        check_paths("routes.cacheable", &routes.cacheable)?;
        check_paths("routes.offline_image", [&routes.offline_image])?;
        check_paths("routes.offline_home", [&routes.offline_home])?;

        if let Some(asset) = routes.static_assets.iter().find(|a| !a.starts_with(&routes.static_prefix)) {
            tracing::warn!(
                asset = %asset,
                static_prefix = %routes.static_prefix,
                "static asset lies outside the static prefix; it will be pre-cached but served stale-while-revalidate"
            );
        }

        Ok(())
    }
}
