//! sw_install / sw_activate tool implementations.
//!
//! Install builds a router for a deployment version and parks it as the
//! waiting worker; activate promotes it and deletes stale cache stores.

use std::sync::Arc;

use folio_client::Router;
use folio_core::Error;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{WorkerHost, json_result};

/// Parameters for the sw_install tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SwInstallParams {
    /// Deployment version to install. Defaults to the configured version.
    #[serde(default)]
    pub version: Option<String>,

    /// Override the configured install policy: fail on any precache error.
    #[serde(default)]
    pub strict: Option<bool>,
}

/// Implementation of the sw_install tool.
pub async fn install_impl(host: &WorkerHost, params: SwInstallParams) -> Result<CallToolResult, McpError> {
    let mut config = host.config.clone();

    if let Some(version) = params.version {
        if version.trim().is_empty() || version.chars().any(char::is_whitespace) {
            return Err(Error::InvalidInput(format!("invalid version: {version:?}")).into());
        }
        config.version = version;
    }
    if let Some(strict) = params.strict {
        config = config.strict(strict);
    }

    let router = Arc::new(Router::new(config, host.cache.clone(), host.network.clone())?);
    let report = host.registration.register(router).await?;

    json_result(&report)
}

/// Implementation of the sw_activate tool.
pub async fn activate_impl(host: &WorkerHost) -> Result<CallToolResult, McpError> {
    let report = host.registration.activate().await?;
    json_result(&report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{offline_host, output_text};

    #[tokio::test]
    async fn test_best_effort_install_offline() {
        let host = offline_host().await;

        let result = install_impl(&host, SwInstallParams::default()).await.unwrap();
        let output: serde_json::Value = serde_json::from_str(&output_text(&result)).unwrap();
        assert_eq!(output["cache_name"], "portfolio-v1");
        assert_eq!(output["failed"].as_array().unwrap().len(), 5);
        assert!(host.registration.waiting().await.is_some());
    }

    #[tokio::test]
    async fn test_strict_install_offline_fails() {
        let host = offline_host().await;
        let params = SwInstallParams { version: None, strict: Some(true) };

        assert!(install_impl(&host, params).await.is_err());
        assert!(host.registration.waiting().await.is_none());
    }

    #[tokio::test]
    async fn test_install_rejects_blank_version() {
        let host = offline_host().await;
        let params = SwInstallParams { version: Some(" ".into()), strict: None };
        assert!(install_impl(&host, params).await.is_err());
    }

    #[tokio::test]
    async fn test_install_then_activate() {
        let host = offline_host().await;
        let params = SwInstallParams { version: Some("9".into()), strict: None };
        install_impl(&host, params).await.unwrap();

        let result = activate_impl(&host).await.unwrap();
        let output: serde_json::Value = serde_json::from_str(&output_text(&result)).unwrap();
        assert_eq!(output["cache_name"], "portfolio-v9");
        assert_eq!(host.current_store().await, "portfolio-v9");
    }

    #[tokio::test]
    async fn test_activate_without_install() {
        let host = offline_host().await;
        assert!(activate_impl(&host).await.is_err());
    }
}
