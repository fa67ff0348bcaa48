//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::{AppConfig, RouteMatcher};
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

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `cache_version` is set but blank or contains whitespace
    /// - `cache_prefix` or `user_agent` is empty
    /// - `origin` is not an http(s) origin
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `offline_path` or any `precache` entry is not an absolute path
    /// - `routes` is empty or has duplicate names
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(version) = &self.cache_version
            && (version.trim().is_empty() || version.chars().any(char::is_whitespace))
        {
            return Err(invalid("cache_version", "must be non-empty and contain no whitespace"));
        }

        if self.cache_prefix.is_empty() {
            return Err(invalid("cache_prefix", "must not be empty"));
        }

        if !(self.origin.starts_with("http://") || self.origin.starts_with("https://")) {
            return Err(invalid("origin", "must start with http:// or https://"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if !self.offline_path.starts_with('/') {
            return Err(invalid("offline_path", "must be an absolute path"));
        }

        if let Some(bad) = self.precache.iter().find(|p| !p.starts_with('/')) {
            return Err(ConfigError::Invalid {
                field: "precache".into(),
                reason: format!("entry {bad:?} must be an absolute path"),
            });
        }

        if !self.precache.contains(&self.offline_path) {
            tracing::warn!(
                offline_path = %self.offline_path,
                "offline_path is not in precache; navigations will fall back to the built-in placeholder"
            );
        }

        if self.routes.is_empty() {
            return Err(invalid("routes", "at least one route is required"));
        }

        for (i, route) in self.routes.iter().enumerate() {
            if self.routes[..i].iter().any(|r| r.name == route.name) {
                return Err(ConfigError::Invalid {
                    field: "routes".into(),
                    reason: format!("duplicate route name {:?}", route.name),
                });
            }
            if let RouteMatcher::Path(path) = &route.matcher
                && !path.starts_with('/')
            {
                return Err(ConfigError::Invalid {
                    field: "routes".into(),
                    reason: format!("route {:?} path must be absolute", route.name),
                });
            }
        }

        Ok(())
    }
}
