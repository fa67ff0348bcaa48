//! Version handover between routers.
//!
//! A registration holds at most one active and one waiting router. A new
//! version installs next to the active one, which keeps answering fetches in
//! the `Updating` state until the newcomer activates and replaces it.

use std::sync::Arc;

use folio_core::Error;
use tokio::sync::RwLock;

use super::{ActivateReport, ClientMessage, FetchOutcome, InstallReport, LifecycleState, MessageReply, Router};
use crate::fetch::Request;

#[derive(Default)]
pub struct Registration {
    active: RwLock<Option<Arc<Router>>>,
    waiting: RwLock<Option<Arc<Router>>>,
}

impl Registration {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn active(&self) -> Option<Arc<Router>> {
        self.active.read().await.clone()
    }

    pub async fn waiting(&self) -> Option<Arc<Router>> {
        self.waiting.read().await.clone()
    }

    /// Install `router` and park it as the waiting worker.
    ///
    /// A previously waiting router is discarded.
    ///
    /// # Errors
    ///
    /// Propagates install failures; the registration is left unchanged.
    pub async fn register(&self, router: Arc<Router>) -> Result<InstallReport, Error> {
        let report = router.on_install().await?;

        if let Some(active) = self.active.read().await.as_ref()
            && active.cache_name() != router.cache_name()
        {
            active.set_state(LifecycleState::Updating);
        }

        if let Some(previous) = self.waiting.write().await.replace(router) {
            previous.set_state(LifecycleState::Redundant);
        }

        Ok(report)
    }

    /// Activate the waiting router and make it the active one.
    ///
    /// The active router keeps answering fetches throughout, but its store
    /// is closed for writes and its background refreshes are drained before
    /// stale stores are deleted.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidState` when nothing is waiting, or the
    /// activation error (the router stays waiting, the active one keeps
    /// writing).
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        let mut waiting = self.waiting.write().await;
        let Some(next) = waiting.clone() else {
            return Err(Error::InvalidState("no waiting worker to activate".into()));
        };

        let previous = self.active().await;
        if let Some(previous) = &previous
            && previous.cache_name() != next.cache_name()
        {
            previous.close_store().await;
            previous.wait_until_idle().await;
        }

        let report = match next.on_activate().await {
            Ok(report) => report,
            Err(e) => {
                if let Some(previous) = &previous {
                    previous.reopen_store().await;
                }
                return Err(e);
            }
        };
        waiting.take();

        let replaced = self.active.write().await.replace(next);
        if let Some(replaced) = replaced {
            replaced.set_state(LifecycleState::Redundant);
            replaced.wait_until_idle().await;
        }

        Ok(report)
    }

    /// Promote the waiting router without waiting for pages to close.
    ///
    /// # Errors
    ///
    /// Same as [`Registration::activate`].
    pub async fn skip_waiting(&self) -> Result<ActivateReport, Error> {
        self.activate().await
    }

    /// Route a request through the active router.
    pub async fn fetch(&self, request: &Request) -> FetchOutcome {
        match self.active().await {
            Some(router) => router.on_fetch(request).await,
            None => FetchOutcome::Passthrough,
        }
    }

    /// Deliver a page message; `SkipWaiting` promotes the waiting router.
    ///
    /// Messages are answered by the active router, or the waiting one when
    /// nothing is active yet.
    pub async fn message(&self, message: &ClientMessage) -> Result<MessageReply, Error> {
        let target = match self.active().await {
            Some(router) => router,
            None => self
                .waiting()
                .await
                .ok_or_else(|| Error::InvalidState("no worker registered".into()))?,
        };

        match target.on_message(message) {
            MessageReply::SkipWaiting => {
                if self.waiting().await.is_some() {
                    self.skip_waiting().await?;
                }
                Ok(MessageReply::SkipWaiting)
            }
            reply => Ok(reply),
        }
    }
}
