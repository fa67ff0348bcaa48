//! cache_get tool implementation.
//!
//! Looks up one stored response, or lists a store when no URL is given.

use folio_core::{CachedEntry, Error};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::{WorkerHost, json_result};

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// Absolute URL of the cached request. Omit to list the store.
    #[serde(default)]
    pub url: Option<String>,

    /// Request method (default: GET).
    #[serde(default)]
    pub method: Option<String>,

    /// Store to read (default: the active version's store).
    #[serde(default)]
    pub store: Option<String>,
}

/// Entry as reported by cache_get; the body is decoded lossily as text.
#[derive(Debug, Clone, Serialize)]
pub struct EntryView {
    pub store: String,
    pub method: String,
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub stored_at: String,
    pub size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_text: Option<String>,
}

impl EntryView {
    fn new(entry: CachedEntry, with_body: bool) -> Self {
        let body_text = with_body.then(|| String::from_utf8_lossy(&entry.body).into_owned());
        Self {
            size: entry.body.len(),
            store: entry.store,
            method: entry.method,
            url: entry.url,
            status: entry.status,
            headers: entry.headers,
            stored_at: entry.stored_at,
            body_text,
        }
    }
}

#[derive(Debug, Serialize)]
struct StoreListing {
    store: String,
    stores: Vec<String>,
    entries: Vec<EntryView>,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(host: &WorkerHost, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let store = match params.store {
        Some(store) => store,
        None => host.current_store().await,
    };

    let Some(url) = params.url else {
        let entries = host.cache.list_entries(&store).await?;
        let listing = StoreListing {
            stores: host.cache.list_stores().await?,
            entries: entries.into_iter().map(|e| EntryView::new(e, false)).collect(),
            store,
        };
        return json_result(&listing);
    };

    let method = params.method.as_deref().unwrap_or("GET");
    let entry = host
        .cache
        .match_entry(&store, method, &url)
        .await?
        .ok_or_else(|| Error::CacheMiss(format!("{method} {url} in {store}")))?;

    json_result(&EntryView::new(entry, true))
}
