//! Form submissions and background sync replay.

use folio_core::{Error, PendingTask};
use reqwest::StatusCode;
use serde::Serialize;
use url::Url;

use super::Router;

/// What happened to a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum SubmitOutcome {
    Delivered { status: u16 },
    /// Parked in the replay queue until the next sync.
    Queued { id: String },
}

/// Result of one background sync pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub tag: String,
    /// Ids delivered and removed from the queue.
    pub delivered: Vec<String>,
    /// Ids that failed again and stay queued.
    pub failed: Vec<String>,
}

fn endpoint(task: &PendingTask) -> Result<Url, Error> {
    Url::parse(&task.endpoint).map_err(|e| Error::InvalidUrl(format!("{}: {e}", task.endpoint)))
}

impl Router {
    async fn deliver(&self, task: &PendingTask) -> Result<StatusCode, Error> {
        let url = endpoint(task)?;
        let status = self.network.post(&url, &task.body, &task.content_type).await?;
        if status.is_success() {
            Ok(status)
        } else {
            Err(Error::HttpError(format!("status {}", status.as_u16())))
        }
    }

    /// Send a submission now, or queue it for replay when that fails.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidUrl` for an unparseable endpoint (nothing is
    /// queued) and database errors from the queue.
    pub async fn submit(&self, task: PendingTask) -> Result<SubmitOutcome, Error> {
        endpoint(&task)?;

        match self.deliver(&task).await {
            Ok(status) => Ok(SubmitOutcome::Delivered { status: status.as_u16() }),
            Err(e) => {
                tracing::info!(id = %task.id, kind = %task.kind, error = %e, "submission failed, queued for background sync");
                let id = self.cache.enqueue_task(&task).await?;
                Ok(SubmitOutcome::Queued { id })
            }
        }
    }

    /// Replay the pending queue when `tag` is the configured sync tag.
    ///
    /// Delivered tasks are removed; failed ones are kept with their attempt
    /// count bumped. Other tags are ignored.
    pub async fn on_sync(&self, tag: &str) -> Result<SyncReport, Error> {
        let mut report = SyncReport { tag: tag.to_string(), ..Default::default() };
        if tag != self.config.sync_tag {
            tracing::debug!(tag, "ignoring unknown sync tag");
            return Ok(report);
        }

        for task in self.cache.list_pending_tasks().await? {
            match self.deliver(&task).await {
                Ok(_) => {
                    self.cache.remove_task(&task.id).await?;
                    report.delivered.push(task.id);
                }
                Err(e) => {
                    self.cache.record_task_failure(&task.id, &e.to_string()).await?;
                    report.failed.push(task.id);
                }
            }
        }

        tracing::info!(delivered = report.delivered.len(), failed = report.failed.len(), "background sync finished");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{FakeNetwork, controlling_router};
    use super::*;

    const CONTACT: &str = "https://api.emailjs.com/api/v1.0/email/send";

    #[tokio::test]
    async fn test_submit_online_delivers() {
        let network = FakeNetwork::new();
        let router = controlling_router(network.clone(), "1").await;

        let outcome = router.submit(PendingTask::form(CONTACT, r#"{"msg":"hi"}"#)).await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Delivered { status: 200 });
        assert_eq!(network.posted(), vec![(CONTACT.to_string(), r#"{"msg":"hi"}"#.to_string())]);
        assert!(router.cache().list_pending_tasks().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_submit_offline_queues() {
        let network = FakeNetwork::new();
        let router = controlling_router(network.clone(), "1").await;
        network.set_offline(true);

        let task = PendingTask::form(CONTACT, r#"{"msg":"hi"}"#);
        let outcome = router.submit(task.clone()).await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Queued { id: task.id.clone() });
        assert_eq!(router.cache().list_pending_tasks().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_submit_invalid_endpoint_is_rejected() {
        let router = controlling_router(FakeNetwork::new(), "1").await;
        let result = router.submit(PendingTask::form("not a url", "{}")).await;
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
        assert!(router.cache().list_pending_tasks().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sync_replays_and_removes() {
        let network = FakeNetwork::new();
        let router = controlling_router(network.clone(), "1").await;
        network.set_offline(true);
        router.submit(PendingTask::form(CONTACT, "{\"n\":1}")).await.unwrap();
        router.submit(PendingTask::form(CONTACT, "{\"n\":2}")).await.unwrap();

        network.set_offline(false);
        let report = router.on_sync("background-sync").await.unwrap();

        assert_eq!(report.delivered.len(), 2);
        assert!(report.failed.is_empty());
        assert_eq!(network.posted().len(), 2);
        assert!(router.cache().list_pending_tasks().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sync_keeps_failed_tasks() {
        let network = FakeNetwork::new();
        let router = controlling_router(network.clone(), "1").await;
        network.set_offline(true);
        router.submit(PendingTask::form(CONTACT, "{}")).await.unwrap();

        network.set_offline(false);
        network.set_post_status(StatusCode::SERVICE_UNAVAILABLE);
        let report = router.on_sync("background-sync").await.unwrap();

        assert!(report.delivered.is_empty());
        assert_eq!(report.failed.len(), 1);
        let pending = router.cache().list_pending_tasks().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].attempts, 1);
        assert_eq!(pending[0].last_error.as_deref(), Some("HTTP_ERROR: status 503"));
    }

    #[tokio::test]
    async fn test_sync_ignores_other_tags() {
        let network = FakeNetwork::new();
        let router = controlling_router(network.clone(), "1").await;
        network.set_offline(true);
        router.submit(PendingTask::form(CONTACT, "{}")).await.unwrap();
        network.set_offline(false);

        let report = router.on_sync("periodic-refresh").await.unwrap();
        assert!(report.delivered.is_empty());
        assert!(network.posted().is_empty());
        assert_eq!(router.cache().list_pending_tasks().await.unwrap().len(), 1);
    }
}
