//! cache_purge tool implementation.
//!
//! Purges entries of one store by domain or count, or drops the store.

use folio_core::Error;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::{WorkerHost, json_result};

/// Parameters for the cache_purge tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeParams {
    /// Store to purge (default: the active version's store).
    #[serde(default)]
    pub store: Option<String>,

    /// Purge entries whose URL contains this domain.
    #[serde(default)]
    pub domain: Option<String>,

    /// Keep only the newest N entries.
    #[serde(default)]
    pub max_entries: Option<usize>,

    /// Delete the whole store.
    #[serde(default)]
    pub drop_store: bool,
}

/// Output from the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachePurgeOutput {
    pub store: String,
    /// Number of entries deleted.
    pub deleted: u64,
}

/// Implementation of the cache_purge tool.
pub async fn purge_impl(host: &WorkerHost, params: CachePurgeParams) -> Result<CallToolResult, McpError> {
    if params.domain.is_none() && params.max_entries.is_none() && !params.drop_store {
        return Err(
            Error::InvalidInput("At least one of domain, max_entries, or drop_store must be specified".to_string()).into(),
        );
    }

    let store = match params.store {
        Some(store) => store,
        None => host.current_store().await,
    };

    let mut deleted = 0u64;

    if params.drop_store {
        deleted += host.cache.delete_store(&store).await?;
    } else {
        if let Some(domain) = &params.domain {
            deleted += host.cache.purge_entries_by_domain(&store, domain).await?;
        }
        if let Some(max_entries) = params.max_entries {
            deleted += host.cache.purge_lru_entries(&store, max_entries).await?;
        }
    }

    tracing::info!(store = %store, deleted, "cache purged");
    json_result(&CachePurgeOutput { store, deleted })
}
