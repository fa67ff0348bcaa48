//! MCP tool implementations.
//!
//! Each tool drives one lifecycle event of the worker hosted by this server,
//! or inspects its cache storage.

pub mod cache;
pub mod sw_events;
pub mod sw_fetch;
pub mod sw_lifecycle;

use std::sync::Arc;

use folio_client::{Network, Registration, RouterConfig};
use folio_core::{CacheDb, Error};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

pub use sw_events::{SwMessageParams, SwPushParams, SwSubmitParams, SwSyncParams};
pub use sw_fetch::SwFetchParams;
pub use sw_lifecycle::SwInstallParams;

/// Everything the tools share: the registration plus what is needed to
/// build new router versions.
pub struct WorkerHost {
    pub registration: Registration,
    pub cache: CacheDb,
    pub network: Arc<dyn Network>,
    pub config: RouterConfig,
}

impl WorkerHost {
    pub fn new(config: RouterConfig, cache: CacheDb, network: Arc<dyn Network>) -> Self {
        Self { registration: Registration::new(), cache, network, config }
    }

    /// Store name tools default to: the active version, else the configured one.
    pub async fn current_store(&self) -> String {
        match self.registration.active().await {
            Some(router) => router.cache_name().to_string(),
            None => self.config.cache_name(),
        }
    }
}

/// Serialize a tool output as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
