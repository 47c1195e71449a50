//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SWCACHE_*)
//! 2. TOML config file (if SWCACHE_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! Nested sections use a double underscore, e.g. `SWCACHE_ROUTES__STATIC_PREFIX`.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::cache::Generations;

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SWCACHE_*)
/// 2. TOML config file (if SWCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the page-origin server being fronted.
    ///
    /// Set via SWCACHE_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Socket address the proxy listens on.
    ///
    /// Set via SWCACHE_LISTEN_ADDR environment variable.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Path to SQLite cache database.
    ///
    /// Set via SWCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Prefix shared by every generation name.
    #[serde(default = "default_cache_namespace")]
    pub cache_namespace: String,

    /// Version tag baked into generation names. Bumping it retires the old
    /// generations on the next activation.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// User-Agent string for origin requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to read from an origin response.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP client timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Upper bound on every network call the worker makes, in milliseconds.
    #[serde(default = "default_network_timeout_ms")]
    pub network_timeout_ms: u64,

    #[serde(default)]
    pub routes: RoutesConfig,

    #[serde(default)]
    pub notifications: NotificationConfig,
}

/// Manifest inputs and route tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutesConfig {
    /// Paths under this prefix are served cache-first.
    #[serde(default = "default_static_prefix")]
    pub static_prefix: String,

    /// Assets pre-cached into the static generation at install time.
    #[serde(default = "default_static_assets")]
    pub static_assets: Vec<String>,

    /// Path prefixes that always go to the network first.
    #[serde(default = "default_network_first")]
    pub network_first: Vec<String>,

    /// Path prefixes whose successful responses may be kept for offline use.
    /// Also pre-cached into the dynamic generation at install time.
    #[serde(default = "default_cacheable")]
    pub cacheable: Vec<String>,

    /// Substring marking a static path as an image.
    #[serde(default = "default_image_marker")]
    pub image_marker: String,

    /// Placeholder served for images that are neither cached nor reachable.
    #[serde(default = "default_offline_image")]
    pub offline_image: String,

    /// Page served to offline navigations that have no cached copy.
    #[serde(default = "default_offline_home")]
    pub offline_home: String,
}

/// Push notification presentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_notification_title")]
    pub default_title: String,

    #[serde(default = "default_notification_body")]
    pub default_body: String,

    #[serde(default = "default_notification_icon")]
    pub icon: String,

    #[serde(default = "default_notification_badge")]
    pub badge: String,

    #[serde(default = "default_action_icon")]
    pub action_icon: String,

    /// Opened when the user picks the "View" action.
    #[serde(default = "default_dashboard_url")]
    pub dashboard_url: String,
}

fn default_origin() -> String {
    "http://127.0.0.1:5000".into()
}

fn default_listen_addr() -> String {
    "127.0.0.1:8080".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./swcache.sqlite")
}

fn default_cache_namespace() -> String {
    "swcache".into()
}

fn default_cache_version() -> String {
    "v1".into()
}

fn default_user_agent() -> String {
    "swcache/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_network_timeout_ms() -> u64 {
    10_000
}

fn default_static_prefix() -> String {
    "/static/".into()
}

fn default_static_assets() -> Vec<String> {
    [
        "/static/css/bootstrap-icons.min.css",
        "/static/css/styles.css",
        "/static/css/newbasefilelooks.css",
        "/static/css/iconslooks.css",
        "/static/css/profile_css.css",
        "/static/css/navigation_enhancements.css",
        "/static/js/scripts.js",
        "/static/js/interactivity.js",
        "/static/js/bootstrap.bundle.min.js",
        "/static/manifest.json",
        "/static/img/favicon.ico",
        "/static/img/apple-touch-icon.png",
        "/static/img/favicon-32x32.png",
        "/static/img/favicon-16x16.png",
        "/static/img/default_profile.png",
        "/static/img/ficore_africa_logo.png",
        "/static/img/ficore_logo.png",
        "/static/img/icons/icon-192x192.png",
        "/static/fonts/bootstrap-icons.woff2",
        "/static/fonts/bootstrap-icons.woff",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_network_first() -> Vec<String> {
    [
        "/users/login",
        "/users/logout",
        "/users/signup",
        "/users/forgot_password",
        "/users/reset_password",
        "/users/verify_2fa",
        "/api/notifications/count",
        "/api/notifications",
        "/dashboard",
        "/debtors",
        "/creditors",
        "/payments",
        "/receipts",
        "/reports",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_cacheable() -> Vec<String> {
    ["/general/home", "/general/about", "/general/contact", "/general/privacy", "/general/terms", "/set-language"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_image_marker() -> String {
    "/img/".into()
}

fn default_offline_image() -> String {
    "/static/img/default_profile.png".into()
}

fn default_offline_home() -> String {
    "/general/home".into()
}

fn default_notification_title() -> String {
    "FiCore Notification".into()
}

fn default_notification_body() -> String {
    "You have a new notification".into()
}

fn default_notification_icon() -> String {
    "/static/img/icons/icon-192x192.png".into()
}

fn default_notification_badge() -> String {
    "/static/img/favicon-32x32.png".into()
}

fn default_action_icon() -> String {
    "/static/img/favicon-16x16.png".into()
}

fn default_dashboard_url() -> String {
    "/dashboard".into()
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            static_prefix: default_static_prefix(),
            static_assets: default_static_assets(),
            network_first: default_network_first(),
            cacheable: default_cacheable(),
            image_marker: default_image_marker(),
            offline_image: default_offline_image(),
            offline_home: default_offline_home(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            default_title: default_notification_title(),
            default_body: default_notification_body(),
            icon: default_notification_icon(),
            badge: default_notification_badge(),
            action_icon: default_action_icon(),
            dashboard_url: default_dashboard_url(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            listen_addr: default_listen_addr(),
            db_path: default_db_path(),
            cache_namespace: default_cache_namespace(),
            cache_version: default_cache_version(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            network_timeout_ms: default_network_timeout_ms(),
            routes: RoutesConfig::default(),
            notifications: NotificationConfig::default(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Bound applied by the worker to each network call.
    pub fn network_timeout(&self) -> Duration {
        Duration::from_millis(self.network_timeout_ms)
    }

    /// The two generation names this configuration keeps alive.
    pub fn generations(&self) -> Generations {
        Generations::new(&self.cache_namespace, &self.cache_version)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SWCACHE_`
    /// 2. TOML file from `SWCACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SWCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SWCACHE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
