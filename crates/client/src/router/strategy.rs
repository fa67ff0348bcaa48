//! The four caching strategies.
//!
//! Each returns `Err` only when it has nothing to answer with; cache write
//! failures are logged and never change the response.

use std::sync::Arc;

use folio_core::{CacheDb, Error};
use reqwest::StatusCode;
use reqwest::header::{self, HeaderMap, HeaderValue};
use tokio::sync::RwLock;

use super::Router;
use crate::fetch::{Request, Response, ResponseSource};

const OFFLINE_PLACEHOLDER: &str = "<!DOCTYPE html>\
<html lang=\"en\"><head><meta charset=\"utf-8\"><title>Offline</title></head>\
<body><h1>You are offline</h1><p>Check your connection and try again.</p></body></html>";

/// Write access to the router's own store, closed once a newer version
/// takes over.
#[derive(Clone)]
pub(crate) struct StoreWriter {
    cache: CacheDb,
    store: String,
    open: Arc<RwLock<bool>>,
}

impl StoreWriter {
    pub(crate) fn new(cache: CacheDb, store: String) -> Self {
        Self { cache, store, open: Arc::new(RwLock::new(true)) }
    }

    /// Store a copy of a 2xx response. Holds the read side of the gate for
    /// the whole write.
    async fn put(&self, request: &Request, response: &Response) {
        if !response.status.is_success() {
            return;
        }
        let open = self.open.read().await;
        if !*open {
            tracing::debug!(url = %request.url, store = %self.store, "store closed, skipping cache write");
            return;
        }
        if let Err(e) = self.cache.put_entry(&response.to_entry(&self.store, request)).await {
            tracing::warn!(url = %request.url, error = %e, "cache write failed");
        }
    }

    /// Returns once no write is in flight.
    async fn set_open(&self, open: bool) {
        *self.open.write().await = open;
    }
}

impl Router {
    /// Cached copy for `request`, treating unreadable entries as misses.
    async fn cached(&self, request: &Request) -> Option<Response> {
        let entry = match self
            .cache
            .match_entry(&self.cache_name, request.method.as_str(), request.url.as_str())
            .await
        {
            Ok(entry) => entry?,
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "cache read failed");
                return None;
            }
        };

        match Response::from_entry(entry) {
            Ok(response) => Some(response),
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "discarding unreadable cache entry");
                None
            }
        }
    }

    /// Network, storing a copy on success; cached copy on network failure.
    pub(crate) async fn network_first(&self, request: &Request) -> Result<Response, Error> {
        match self.network.fetch(request).await {
            Ok(response) => {
                self.writer.put(request, &response).await;
                Ok(response)
            }
            Err(e) if e.is_network() => match self.cached(request).await {
                Some(cached) => {
                    tracing::debug!(url = %request.url, error = %e, "network failed, serving cached copy");
                    Ok(cached)
                }
                None => Err(e),
            },
            Err(e) => Err(e),
        }
    }

    /// Cached copy without touching the network; otherwise network, then 404.
    pub(crate) async fn cache_first(&self, request: &Request) -> Result<Response, Error> {
        if let Some(cached) = self.cached(request).await {
            tracing::debug!(url = %request.url, "cache hit");
            return Ok(cached);
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                self.writer.put(request, &response).await;
                Ok(response)
            }
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "cache miss and network failed");
                Ok(Response::not_found())
            }
        }
    }

    /// Cached copy right away plus a background refresh; network when cold.
    pub(crate) async fn stale_while_revalidate(&self, request: &Request) -> Result<Response, Error> {
        let Some(cached) = self.cached(request).await else {
            let response = self.network.fetch(request).await?;
            self.writer.put(request, &response).await;
            return Ok(response);
        };

        let network = self.network.clone();
        let writer = self.writer.clone();
        let request = request.clone();
        self.spawn_background(async move {
            match network.fetch(&request).await {
                Ok(response) => writer.put(&request, &response).await,
                Err(e) => tracing::debug!(url = %request.url, error = %e, "background refresh failed"),
            }
        });

        Ok(cached)
    }

    /// Network-first for navigations, ending at the offline document.
    pub(crate) async fn network_first_offline(&self, request: &Request) -> Result<Response, Error> {
        match self.network_first(request).await {
            Ok(response) => Ok(response),
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "navigation offline, serving fallback document");
                Ok(self.offline_document().await)
            }
        }
    }

    /// Stop writing into this router's store. In-flight writes finish
    /// before this returns; later ones are dropped.
    pub(crate) async fn close_store(&self) {
        self.writer.set_open(false).await;
    }

    pub(crate) async fn reopen_store(&self) {
        self.writer.set_open(true).await;
    }

    /// The precached offline page, or a built-in placeholder when it was
    /// never cached.
    async fn offline_document(&self) -> Response {
        if let Ok(url) = self.own_url(&self.config.offline_path)
            && let Some(mut cached) = self.cached(&Request::get(url)).await
        {
            cached.source = ResponseSource::Offline;
            return cached;
        }

        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8"));
        Response {
            status: StatusCode::SERVICE_UNAVAILABLE,
            headers,
            body: bytes::Bytes::from_static(OFFLINE_PLACEHOLDER.as_bytes()),
            source: ResponseSource::Offline,
        }
    }
}
