//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (FOLIO_*)
//! 2. TOML config file (if FOLIO_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod routes;
mod validation;

pub use routes::{RouteMatcher, RouteSpec, Strategy, default_routes};
pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (FOLIO_*)
/// 2. TOML config file (if FOLIO_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Deployment version encoded into the cache store name.
    ///
    /// Set via FOLIO_CACHE_VERSION environment variable.
    /// Required before a router can be built.
    #[serde(default)]
    pub cache_version: Option<String>,

    /// Prefix of the cache store name (`{prefix}-v{version}`).
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Origin the router serves, e.g. `https://jane.dev`.
    ///
    /// Set via FOLIO_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Path to SQLite cache database.
    ///
    /// Set via FOLIO_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for network requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via FOLIO_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Fail installation when any precache entry fails.
    ///
    /// Set via FOLIO_STRICT_INSTALL environment variable.
    #[serde(default)]
    pub strict_install: bool,

    /// Paths cached during install.
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,

    /// Document served when a navigation misses both network and cache.
    #[serde(default = "default_offline_path")]
    pub offline_path: String,

    /// Background sync tag that triggers replay of pending tasks.
    #[serde(default = "default_sync_tag")]
    pub sync_tag: String,

    /// Title used for push notifications.
    #[serde(default = "default_notification_title")]
    pub notification_title: String,

    /// Ordered route classification rules. First match wins.
    #[serde(default = "default_routes")]
    pub routes: Vec<RouteSpec>,
}

fn default_cache_prefix() -> String {
    "portfolio".into()
}

fn default_origin() -> String {
    "http://localhost:3000".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./folio-cache.sqlite")
}

fn default_user_agent() -> String {
    "folio-sw/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_precache() -> Vec<String> {
    ["/", "/offline.html", "/manifest.json", "/icons/icon-192x192.png", "/icons/icon-512x512.png"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_offline_path() -> String {
    "/offline.html".into()
}

fn default_sync_tag() -> String {
    "background-sync".into()
}

fn default_notification_title() -> String {
    "Portfolio Update".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_version: None,
            cache_prefix: default_cache_prefix(),
            origin: default_origin(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            strict_install: false,
            precache: default_precache(),
            offline_path: default_offline_path(),
            sync_tag: default_sync_tag(),
            notification_title: default_notification_title(),
            routes: default_routes(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `FOLIO_`
    /// 2. TOML file from `FOLIO_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment()
            .extract()
            .map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("FOLIO_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment.merge(
            Env::prefixed("FOLIO_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        )
    }

    /// The deployment version, required to name the cache store.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if no version is configured.
    pub fn require_cache_version(&self) -> Result<&str, ConfigError> {
        self.cache_version.as_deref().ok_or_else(|| ConfigError::Missing {
            field: "cache_version".into(),
            hint: "Set FOLIO_CACHE_VERSION environment variable".into(),
        })
    }
}
