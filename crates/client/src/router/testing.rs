//! Scripted network and router builders for router tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use folio_core::{CacheDb, Error};
use reqwest::StatusCode;
use reqwest::header::{self, HeaderMap, HeaderValue};
use tokio::sync::Semaphore;
use url::Url;

use super::{Router, RouterConfig};
use crate::fetch::{Network, Request, Response, ResponseSource};

#[derive(Clone)]
enum Scripted {
    Serve(StatusCode, String),
    Fail,
    Reject,
}

#[derive(Default)]
struct Inner {
    routes: HashMap<String, Scripted>,
    offline: bool,
    fetched: Vec<String>,
    posted: Vec<(String, String)>,
    post_status: Option<StatusCode>,
    gates: HashMap<String, Arc<Semaphore>>,
}

/// In-memory [`Network`]: unknown URLs fail as if offline.
#[derive(Clone, Default)]
pub struct FakeNetwork {
    inner: Arc<Mutex<Inner>>,
}

impl FakeNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(&self, url: &str, status: StatusCode, body: &str) {
        self.inner
            .lock()
            .unwrap()
            .routes
            .insert(url.to_string(), Scripted::Serve(status, body.to_string()));
    }

    pub fn serve_ok(&self, url: &str, body: &str) {
        self.serve(url, StatusCode::OK, body);
    }

    pub fn fail(&self, url: &str) {
        self.inner.lock().unwrap().routes.insert(url.to_string(), Scripted::Fail);
    }

    /// Serve every default precache entry under `origin`.
    pub fn serve_manifest(&self, origin: &str) {
        self.serve_ok(&format!("{origin}/"), "<html>home</html>");
        self.serve_ok(&format!("{origin}/offline.html"), "<html>You are offline</html>");
        self.serve_ok(&format!("{origin}/manifest.json"), r#"{"name":"Jane"}"#);
        self.serve_ok(&format!("{origin}/icons/icon-192x192.png"), "png-192");
        self.serve_ok(&format!("{origin}/icons/icon-512x512.png"), "png-512");
    }

    /// Hold fetches of `url` until permits are added to the returned gate.
    pub fn gate(&self, url: &str) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.inner.lock().unwrap().gates.insert(url.to_string(), gate.clone());
        gate
    }

    /// Scripted non-network failure for `url`.
    pub fn reject(&self, url: &str) {
        self.inner.lock().unwrap().routes.insert(url.to_string(), Scripted::Reject);
    }

    pub fn set_offline(&self, offline: bool) {
        self.inner.lock().unwrap().offline = offline;
    }

    pub fn set_post_status(&self, status: StatusCode) {
        self.inner.lock().unwrap().post_status = Some(status);
    }

    /// Number of GET fetches performed so far.
    pub fn calls(&self) -> usize {
        self.inner.lock().unwrap().fetched.len()
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.inner.lock().unwrap().fetched.iter().filter(|u| *u == url).count()
    }

    pub fn posted(&self) -> Vec<(String, String)> {
        self.inner.lock().unwrap().posted.clone()
    }
}

#[async_trait]
impl Network for FakeNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let gate = self.inner.lock().unwrap().gates.get(request.url.as_str()).cloned();
        if let Some(gate) = gate {
            gate.acquire().await.unwrap().forget();
        }

        let mut inner = self.inner.lock().unwrap();
        inner.fetched.push(request.url.to_string());
        if inner.offline {
            return Err(Error::NetworkFailed("offline".into()));
        }
        match inner.routes.get(request.url.as_str()).cloned() {
            Some(Scripted::Reject) => Err(Error::InvalidInput(format!("rejected: {}", request.url))),
            Some(Scripted::Serve(status, body)) => {
                let mut headers = HeaderMap::new();
                headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
                Ok(Response { status, headers, body: Bytes::from(body), source: ResponseSource::Network })
            }
            Some(Scripted::Fail) | None => Err(Error::NetworkFailed(format!("unreachable: {}", request.url))),
        }
    }

    async fn post(&self, url: &Url, body: &str, _content_type: &str) -> Result<StatusCode, Error> {
        let mut inner = self.inner.lock().unwrap();
        if inner.offline {
            return Err(Error::NetworkFailed("offline".into()));
        }
        inner.posted.push((url.to_string(), body.to_string()));
        Ok(inner.post_status.unwrap_or(StatusCode::OK))
    }
}

pub fn test_config(version: &str) -> RouterConfig {
    RouterConfig::new(version, Url::parse("https://jane.dev").unwrap())
}

pub async fn router_with(network: FakeNetwork, version: &str) -> Router {
    let cache = CacheDb::open_in_memory().await.unwrap();
    Router::new(test_config(version), cache, Arc::new(network)).unwrap()
}

pub async fn strict_router_with(network: FakeNetwork, version: &str) -> Router {
    let cache = CacheDb::open_in_memory().await.unwrap();
    Router::new(test_config(version).strict(true), cache, Arc::new(network)).unwrap()
}

/// Installed and activated router with the default manifest precached.
pub async fn controlling_router(network: FakeNetwork, version: &str) -> Router {
    network.serve_manifest("https://jane.dev");
    let router = router_with(network, version).await;
    router.on_install().await.unwrap();
    router.on_activate().await.unwrap();
    router
}
