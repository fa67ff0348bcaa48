//! sw_sync, sw_push, sw_message and sw_submit tool implementations.

use std::sync::Arc;

use folio_client::{ClientMessage, Router};
use folio_core::{Error, PendingTask, TaskKind};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{WorkerHost, json_result};

/// The active router, falling back to the waiting one for events that do
/// not depend on control (push, notification clicks).
async fn any_router(host: &WorkerHost) -> Result<Arc<Router>, Error> {
    if let Some(router) = host.registration.active().await {
        return Ok(router);
    }
    host.registration
        .waiting()
        .await
        .ok_or_else(|| Error::InvalidState("no worker registered; run sw_install first".into()))
}

async fn active_router(host: &WorkerHost) -> Result<Arc<Router>, Error> {
    host.registration
        .active()
        .await
        .ok_or_else(|| Error::InvalidState("no active worker; run sw_activate first".into()))
}

/// Parameters for the sw_sync tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SwSyncParams {
    /// Sync tag to fire (default: the configured tag).
    #[serde(default)]
    pub tag: Option<String>,
}

/// Implementation of the sw_sync tool.
pub async fn sync_impl(host: &WorkerHost, params: SwSyncParams) -> Result<CallToolResult, McpError> {
    let router = active_router(host).await?;
    let tag = params.tag.unwrap_or_else(|| host.config.sync_tag.clone());
    let report = router.on_sync(&tag).await?;
    json_result(&report)
}

/// Parameters for the sw_push tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SwPushParams {
    /// Push payload text.
    #[serde(default)]
    pub payload: Option<String>,

    /// Simulate a click on the notification with this action
    /// ("view", "close"); an empty string clicks the body.
    #[serde(default)]
    pub click: Option<String>,
}

#[derive(Debug, Serialize)]
struct SwPushOutput {
    notification: folio_client::Notification,
    #[serde(skip_serializing_if = "Option::is_none")]
    opens: Option<Option<String>>,
}

/// Implementation of the sw_push tool.
pub async fn push_impl(host: &WorkerHost, params: SwPushParams) -> Result<CallToolResult, McpError> {
    let router = any_router(host).await?;
    let notification = router.on_push(params.payload.as_deref());

    let opens = params.click.map(|action| {
        let action = Some(action.as_str()).filter(|a| !a.is_empty());
        router.on_notification_click(action).map(|url| url.to_string())
    });

    json_result(&SwPushOutput { notification, opens })
}

/// Parameters for the sw_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwMessageParams {
    /// Message object, e.g. `{"type": "SKIP_WAITING"}`,
    /// `{"type": "GET_VERSION"}` or
    /// `{"type": "PERFORMANCE_METRIC", "name": "LCP", "value": 1840}`.
    pub message: serde_json::Value,
}

/// Implementation of the sw_message tool.
pub async fn message_impl(host: &WorkerHost, params: SwMessageParams) -> Result<CallToolResult, McpError> {
    let message: ClientMessage = serde_json::from_value(params.message)
        .map_err(|e| Error::InvalidInput(format!("unrecognized message: {e}")))?;

    let reply = host.registration.message(&message).await?;
    json_result(&reply)
}

fn default_content_type() -> String {
    "application/json".to_string()
}

/// Parameters for the sw_submit tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwSubmitParams {
    /// Absolute URL the submission is POSTed to.
    pub endpoint: String,

    /// Request body.
    pub body: String,

    /// Body content type (default: application/json).
    #[serde(default = "default_content_type")]
    pub content_type: String,

    /// Task kind (default: form-submission).
    #[serde(default)]
    pub kind: Option<TaskKind>,
}

/// Implementation of the sw_submit tool.
pub async fn submit_impl(host: &WorkerHost, params: SwSubmitParams) -> Result<CallToolResult, McpError> {
    let router = active_router(host).await?;
    let kind = params.kind.unwrap_or(TaskKind::FormSubmission);
    let task = PendingTask::new(kind, &params.endpoint, &params.body, &params.content_type);

    let outcome = router.submit(task).await?;
    json_result(&outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::sw_lifecycle::{SwInstallParams, activate_impl, install_impl};
    use crate::tools::test_support::{offline_host, output_text};

    const CONTACT: &str = "https://api.emailjs.com/api/v1.0/email/send";

    fn parse(result: CallToolResult) -> serde_json::Value {
        serde_json::from_str(&output_text(&result)).unwrap()
    }

    async fn activated_host() -> WorkerHost {
        let host = offline_host().await;
        install_impl(&host, SwInstallParams::default()).await.unwrap();
        activate_impl(&host).await.unwrap();
        host
    }

    fn submission(endpoint: &str) -> SwSubmitParams {
        SwSubmitParams {
            endpoint: endpoint.into(),
            body: r#"{"name":"Sam"}"#.into(),
            content_type: default_content_type(),
            kind: None,
        }
    }

    #[tokio::test]
    async fn test_events_require_registration() {
        let host = offline_host().await;
        assert!(push_impl(&host, SwPushParams::default()).await.is_err());
        assert!(sync_impl(&host, SwSyncParams::default()).await.is_err());
        assert!(submit_impl(&host, submission(CONTACT)).await.is_err());
    }

    #[tokio::test]
    async fn test_push_on_waiting_worker() {
        let host = offline_host().await;
        install_impl(&host, SwInstallParams::default()).await.unwrap();

        let params = SwPushParams { payload: Some("New post".into()), click: Some("view".into()) };
        let output = parse(push_impl(&host, params).await.unwrap());
        assert_eq!(output["notification"]["body"], "New post");
        assert_eq!(output["notification"]["vibrate"], serde_json::json!([100, 50, 100]));
        assert_eq!(output["opens"], "https://jane.dev/");
    }

    #[tokio::test]
    async fn test_push_close_opens_nothing() {
        let host = activated_host().await;
        let params = SwPushParams { payload: None, click: Some("close".into()) };
        let output = parse(push_impl(&host, params).await.unwrap());
        assert_eq!(output["notification"]["body"], "New content available!");
        assert!(output["opens"].is_null());
    }

    #[tokio::test]
    async fn test_submit_offline_then_sync() {
        let host = activated_host().await;

        let output = parse(submit_impl(&host, submission(CONTACT)).await.unwrap());
        assert_eq!(output["outcome"], "queued");
        assert_eq!(host.cache.list_pending_tasks().await.unwrap().len(), 1);

        let output = parse(sync_impl(&host, SwSyncParams::default()).await.unwrap());
        assert_eq!(output["tag"], "background-sync");
        assert_eq!(output["failed"].as_array().unwrap().len(), 1);
        assert_eq!(host.cache.list_pending_tasks().await.unwrap()[0].attempts, 1);
    }

    #[tokio::test]
    async fn test_submit_invalid_endpoint() {
        let host = activated_host().await;
        assert!(submit_impl(&host, submission("not a url")).await.is_err());
    }

    #[tokio::test]
    async fn test_message_get_version_and_skip_waiting() {
        let host = offline_host().await;
        install_impl(&host, SwInstallParams::default()).await.unwrap();

        let params = SwMessageParams { message: serde_json::json!({"type": "GET_VERSION"}) };
        let output = parse(message_impl(&host, params).await.unwrap());
        assert_eq!(output["cache_name"], "portfolio-v1");

        let params = SwMessageParams { message: serde_json::json!({"type": "SKIP_WAITING"}) };
        message_impl(&host, params).await.unwrap();
        assert!(host.registration.active().await.is_some());
    }

    #[tokio::test]
    async fn test_message_unknown_type() {
        let host = activated_host().await;
        let params = SwMessageParams { message: serde_json::json!({"type": "CLEAR_ALL"}) };
        assert!(message_impl(&host, params).await.is_err());
    }
}
