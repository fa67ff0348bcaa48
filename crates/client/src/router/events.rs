//! Push, notification click and client message events.

use serde::{Deserialize, Serialize};
use url::Url;

use super::Router;

const DEFAULT_PUSH_BODY: &str = "New content available!";
const NOTIFICATION_ICON: &str = "/icons/icon-192x192.png";

/// Button shown on a push notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    pub icon: Option<String>,
}

/// Notification rendered from a push payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    /// Milliseconds since the epoch, used by the page to order notifications.
    pub timestamp: i64,
    pub actions: Vec<NotificationAction>,
}

/// Message posted to the worker by a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    /// Activate the waiting version without waiting for pages to close.
    SkipWaiting,
    /// Web-vitals style metric relayed from the page.
    PerformanceMetric {
        name: String,
        value: f64,
        #[serde(default)]
        page: Option<String>,
    },
    GetVersion,
}

/// Worker answer to a [`ClientMessage`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum MessageReply {
    Ack,
    /// The registration must promote its waiting worker.
    SkipWaiting,
    Version { cache_name: String },
}

impl Router {
    /// Build the notification for a push event. An empty or missing payload
    /// falls back to a generic body.
    pub fn on_push(&self, payload: Option<&str>) -> Notification {
        let body = payload
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .unwrap_or(DEFAULT_PUSH_BODY)
            .to_string();

        let icon = self.own_url(NOTIFICATION_ICON).map(|u| u.to_string()).unwrap_or_else(|_| NOTIFICATION_ICON.into());

        Notification {
            title: self.config.notification_title.clone(),
            body,
            icon: icon.clone(),
            badge: icon.clone(),
            vibrate: vec![100, 50, 100],
            timestamp: chrono::Utc::now().timestamp_millis(),
            actions: vec![
                NotificationAction { action: "view".into(), title: "View".into(), icon: Some(icon) },
                NotificationAction { action: "close".into(), title: "Close".into(), icon: None },
            ],
        }
    }

    /// Page to open for a notification click; `None` means just dismiss.
    ///
    /// A click on the notification body (no action) behaves like `view`.
    pub fn on_notification_click(&self, action: Option<&str>) -> Option<Url> {
        match action {
            None | Some("view") => Some(self.config.origin.clone()),
            Some("close") => None,
            Some(other) => {
                tracing::debug!(action = other, "unknown notification action");
                None
            }
        }
    }

    pub fn on_message(&self, message: &ClientMessage) -> MessageReply {
        match message {
            ClientMessage::SkipWaiting => MessageReply::SkipWaiting,
            ClientMessage::PerformanceMetric { name, value, page } => {
                tracing::info!(
                    metric = %name,
                    value = *value,
                    page = page.as_deref().unwrap_or("-"),
                    cache = %self.cache_name,
                    "performance metric"
                );
                MessageReply::Ack
            }
            ClientMessage::GetVersion => MessageReply::Version { cache_name: self.cache_name.clone() },
        }
    }
}
