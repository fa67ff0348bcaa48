//! Router construction parameters.

use folio_core::{AppConfig, Error, RouteSpec, config::default_routes};
use url::Url;

/// Everything a [`Router`](super::Router) needs besides its collaborators.
///
/// `version` is the only required value; the rest default to the portfolio
/// deployment described by `AppConfig::default()`.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub version: String,
    pub cache_prefix: String,
    pub origin: Url,
    pub precache: Vec<String>,
    pub offline_path: String,
    /// Fail install when any precache entry fails instead of logging it.
    pub strict_install: bool,
    pub sync_tag: String,
    pub notification_title: String,
    pub routes: Vec<RouteSpec>,
}

impl RouterConfig {
    pub fn new(version: impl Into<String>, origin: Url) -> Self {
        let defaults = AppConfig::default();
        Self {
            version: version.into(),
            cache_prefix: defaults.cache_prefix,
            origin,
            precache: defaults.precache,
            offline_path: defaults.offline_path,
            strict_install: defaults.strict_install,
            sync_tag: defaults.sync_tag,
            notification_title: defaults.notification_title,
            routes: default_routes(),
        }
    }

    /// Build from loaded application configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` when no cache version is configured and
    /// `Error::InvalidUrl` when the origin does not parse.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, Error> {
        let version = config
            .require_cache_version()
            .map_err(|e| Error::InvalidInput(e.to_string()))?;
        let origin = Url::parse(&config.origin).map_err(|e| Error::InvalidUrl(format!("{}: {e}", config.origin)))?;

        Ok(Self {
            version: version.to_string(),
            cache_prefix: config.cache_prefix.clone(),
            origin,
            precache: config.precache.clone(),
            offline_path: config.offline_path.clone(),
            strict_install: config.strict_install,
            sync_tag: config.sync_tag.clone(),
            notification_title: config.notification_title.clone(),
            routes: config.routes.clone(),
        })
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict_install = strict;
        self
    }

    /// Name of the versioned cache store, e.g. `portfolio-v1.4.0`.
    pub fn cache_name(&self) -> String {
        format!("{}-v{}", self.cache_prefix, self.version)
    }
}
