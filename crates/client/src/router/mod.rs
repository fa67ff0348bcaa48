//! Offline request router.
//!
//! The router is a service worker expressed as an explicit interface: one
//! method per lifecycle event instead of registered event listeners.
//!
//! ### Lifecycle
//! - `on_install`: precache the manifest into the versioned store
//! - `on_activate`: delete every store of an older version, take control
//! - `on_fetch`: classify and answer intercepted GET requests
//!
//! ### Fetch contract
//! Every GET the router takes resolves to a [`Response`]. Strategies report
//! failures as `Err`; `on_fetch` is the single place turning those into the
//! synthetic 408 response.

mod config;
mod events;
mod registration;
mod routes;
mod strategy;
mod sync;

#[cfg(test)]
mod testing;

use std::sync::{Arc, Mutex, MutexGuard};

use folio_core::{CacheDb, Error, Strategy};
use reqwest::Method;
use serde::Serialize;
use tokio::task::JoinSet;
use url::Url;

use crate::fetch::{Network, Request, Response, is_fetchable_scheme, resolve};

pub use config::RouterConfig;
pub use events::{ClientMessage, MessageReply, Notification, NotificationAction};
pub use registration::Registration;
pub use routes::{Route, RouteTable};
pub use sync::{SubmitOutcome, SyncReport};

use strategy::StoreWriter;

/// Service-worker lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LifecycleState {
    Idle,
    Installing,
    /// Installed, waiting for activation.
    Waiting,
    /// Active and answering fetches.
    Controlling,
    /// Still controlling while a newer version waits.
    Updating,
    /// Replaced by a newer version.
    Redundant,
}

/// Result of intercepting one request.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Not ours: the host performs the request normally.
    Passthrough,
    Respond(Response),
}

impl FetchOutcome {
    pub fn response(self) -> Option<Response> {
        match self {
            FetchOutcome::Respond(response) => Some(response),
            FetchOutcome::Passthrough => None,
        }
    }
}

/// What `on_install` cached.
#[derive(Debug, Clone, Default, Serialize)]
pub struct InstallReport {
    pub cache_name: String,
    pub cached: Vec<String>,
    /// (url, reason) for each entry that could not be cached.
    pub failed: Vec<(String, String)>,
}

/// What `on_activate` cleaned up.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ActivateReport {
    pub cache_name: String,
    pub deleted: Vec<String>,
}

/// The offline request router for one deployment version.
pub struct Router {
    config: RouterConfig,
    cache_name: String,
    routes: RouteTable,
    cache: CacheDb,
    network: Arc<dyn Network>,
    writer: StoreWriter,
    state: Mutex<LifecycleState>,
    background: Mutex<JoinSet<()>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Router {
    /// Build a router; compiles the route table up front.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidRoute` if a route regex does not compile.
    pub fn new(config: RouterConfig, cache: CacheDb, network: Arc<dyn Network>) -> Result<Self, Error> {
        let routes = RouteTable::compile(&config.origin, &config.routes)?;
        let cache_name = config.cache_name();
        let writer = StoreWriter::new(cache.clone(), cache_name.clone());
        Ok(Self {
            config,
            cache_name,
            routes,
            writer,
            cache,
            network,
            state: Mutex::new(LifecycleState::Idle),
            background: Mutex::new(JoinSet::new()),
        })
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    pub fn cache(&self) -> &CacheDb {
        &self.cache
    }

    pub fn state(&self) -> LifecycleState {
        *lock(&self.state)
    }

    pub(crate) fn set_state(&self, next: LifecycleState) {
        let mut state = lock(&self.state);
        tracing::info!(cache = %self.cache_name, from = ?*state, to = ?next, "lifecycle transition");
        *state = next;
    }

    /// Strategy `on_fetch` would apply to `request`, if it intercepts it at all.
    pub fn classify(&self, request: &Request) -> Option<Strategy> {
        if request.method != Method::GET || !is_fetchable_scheme(&request.url) {
            return None;
        }
        self.routes.classify(request).map(|route| route.strategy)
    }

    /// Precache the install manifest into the current store.
    ///
    /// Every manifest entry is fetched before anything is written. Under the
    /// strict policy one failure aborts the phase and leaves the store
    /// untouched; otherwise failures are logged and the rest is cached.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidState` unless the router is idle
    /// - `Error::InstallFailed` on any failure under the strict policy
    pub async fn on_install(&self) -> Result<InstallReport, Error> {
        {
            let mut state = lock(&self.state);
            if *state != LifecycleState::Idle {
                return Err(Error::InvalidState(format!("install called while {:?}", *state)));
            }
            *state = LifecycleState::Installing;
        }
        tracing::info!(cache = %self.cache_name, entries = self.config.precache.len(), "installing");

        let mut fetched = Vec::new();
        let mut failed = Vec::new();

        for path in &self.config.precache {
            let url = match resolve(&self.config.origin, path) {
                Ok(url) => url,
                Err(e) => {
                    failed.push((path.clone(), e.to_string()));
                    continue;
                }
            };
            let request = Request::get(url);
            match self.network.fetch(&request).await {
                Ok(response) if response.status.is_success() => fetched.push((request, response)),
                Ok(response) => failed.push((request.url.to_string(), format!("status {}", response.status.as_u16()))),
                Err(e) => failed.push((request.url.to_string(), e.to_string())),
            }
        }

        if self.config.strict_install && !failed.is_empty() {
            self.set_state(LifecycleState::Idle);
            let detail = failed
                .iter()
                .map(|(url, reason)| format!("{url} ({reason})"))
                .collect::<Vec<_>>()
                .join(", ");
            return Err(Error::InstallFailed(detail));
        }

        let mut cached = Vec::with_capacity(fetched.len());
        for (request, response) in &fetched {
            match self.cache.put_entry(&response.to_entry(&self.cache_name, request)).await {
                Ok(()) => cached.push(request.url.to_string()),
                Err(e) => failed.push((request.url.to_string(), e.to_string())),
            }
        }

        for (url, reason) in &failed {
            tracing::warn!(url = %url, reason = %reason, "precache entry failed; continuing install");
        }

        self.set_state(LifecycleState::Waiting);
        Ok(InstallReport { cache_name: self.cache_name.clone(), cached, failed })
    }

    /// Delete stale stores and take control.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidState` unless the router is waiting
    /// - database errors while listing or deleting stores
    pub async fn on_activate(&self) -> Result<ActivateReport, Error> {
        let current = self.state();
        if current != LifecycleState::Waiting {
            return Err(Error::InvalidState(format!("activate called while {current:?}")));
        }

        let mut deleted = Vec::new();
        for store in self.cache.list_stores().await? {
            if store == self.cache_name {
                continue;
            }
            let entries = self.cache.delete_store(&store).await?;
            tracing::info!(store = %store, entries, "deleted stale cache store");
            deleted.push(store);
        }

        self.set_state(LifecycleState::Controlling);
        Ok(ActivateReport { cache_name: self.cache_name.clone(), deleted })
    }

    /// Answer one intercepted request.
    ///
    /// Non-GET requests, non-http(s) schemes, out-of-scope URLs and any
    /// request arriving before activation pass through untouched.
    pub async fn on_fetch(&self, request: &Request) -> FetchOutcome {
        if !matches!(self.state(), LifecycleState::Controlling | LifecycleState::Updating) {
            return FetchOutcome::Passthrough;
        }

        let Some(strategy) = self.classify(request) else {
            return FetchOutcome::Passthrough;
        };

        tracing::debug!(url = %request.url, strategy = %strategy, "routing request");

        let result = match strategy {
            Strategy::NetworkFirst => self.network_first(request).await,
            Strategy::CacheFirst => self.cache_first(request).await,
            Strategy::StaleWhileRevalidate => self.stale_while_revalidate(request).await,
            Strategy::NetworkFirstOffline => self.network_first_offline(request).await,
        };

        match result {
            Ok(response) => FetchOutcome::Respond(response),
            Err(e) => {
                tracing::warn!(url = %request.url, strategy = %strategy, error = %e, "fetch handler failed");
                FetchOutcome::Respond(Response::request_timeout())
            }
        }
    }

    /// Wait for background cache refreshes spawned by earlier fetches.
    pub async fn wait_until_idle(&self) {
        loop {
            let mut tasks = std::mem::take(&mut *lock(&self.background));
            if tasks.is_empty() {
                return;
            }
            while let Some(joined) = tasks.join_next().await {
                if let Err(e) = joined {
                    tracing::warn!(error = %e, "background refresh task aborted");
                }
            }
        }
    }

    pub(crate) fn spawn_background<F>(&self, task: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let mut tasks = lock(&self.background);
        while tasks.try_join_next().is_some() {}
        tasks.spawn(task);
    }

    /// Absolute URL of a configured path on the router's origin.
    pub(crate) fn own_url(&self, path: &str) -> Result<Url, Error> {
        resolve(&self.config.origin, path).map_err(|e| Error::InvalidUrl(format!("{path}: {e}")))
    }
}
