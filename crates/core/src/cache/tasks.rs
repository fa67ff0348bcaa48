//! Background replay queue.
//!
//! Submissions that fail while offline are parked here and replayed when a
//! background sync fires. Tasks leave the queue only through `remove_task`,
//! after the endpoint acknowledged delivery.

use std::fmt;
use std::str::FromStr;

use super::connection::CacheDb;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// What a pending task carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum TaskKind {
    FormSubmission,
    Analytics,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::FormSubmission => "form-submission",
            TaskKind::Analytics => "analytics",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "form-submission" => Ok(TaskKind::FormSubmission),
            "analytics" => Ok(TaskKind::Analytics),
            other => Err(Error::CorruptEntry(format!("unknown task kind {other:?}"))),
        }
    }
}

/// A deferred POST waiting for connectivity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PendingTask {
    pub id: String,
    pub kind: TaskKind,
    pub endpoint: String,
    pub body: String,
    pub content_type: String,
    pub created_at: String,
    pub attempts: u32,
    pub last_error: Option<String>,
}

impl PendingTask {
    /// New task with a fresh UUID v4 identifier and no attempts recorded.
    pub fn new(kind: TaskKind, endpoint: &str, body: &str, content_type: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            endpoint: endpoint.to_string(),
            body: body.to_string(),
            content_type: content_type.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            attempts: 0,
            last_error: None,
        }
    }

    /// JSON form submission, the common case for the contact form.
    pub fn form(endpoint: &str, body: &str) -> Self {
        Self::new(TaskKind::FormSubmission, endpoint, body, "application/json")
    }
}

impl CacheDb {
    /// Queue a task. Returns its identifier.
    pub async fn enqueue_task(&self, task: &PendingTask) -> Result<String, Error> {
        let task = task.clone();
        self.conn
            .call(move |conn| -> Result<String, Error> {
                conn.execute(
                    "INSERT INTO pending_tasks (
                        id, kind, endpoint, body, content_type, created_at, attempts, last_error
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        &task.id,
                        task.kind.as_str(),
                        &task.endpoint,
                        &task.body,
                        &task.content_type,
                        &task.created_at,
                        task.attempts,
                        &task.last_error,
                    ],
                )?;
                Ok(task.id)
            })
            .await
            .map_err(Error::from)
    }

    /// Every queued task, oldest first.
    pub async fn list_pending_tasks(&self) -> Result<Vec<PendingTask>, Error> {
        let rows = self
            .conn
            .call(|conn| -> Result<Vec<(PendingTask, String)>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT id, kind, endpoint, body, content_type, created_at, attempts, last_error
                     FROM pending_tasks ORDER BY created_at ASC, rowid ASC",
                )?;
                let rows = stmt
                    .query_map([], |row| {
                        let kind: String = row.get(1)?;
                        Ok((
                            PendingTask {
                                id: row.get(0)?,
                                kind: TaskKind::FormSubmission,
                                endpoint: row.get(2)?,
                                body: row.get(3)?,
                                content_type: row.get(4)?,
                                created_at: row.get(5)?,
                                attempts: row.get(6)?,
                                last_error: row.get(7)?,
                            },
                            kind,
                        ))
                    })?
                    .collect::<Result<Vec<_>, rusqlite::Error>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)?;

        rows.into_iter()
            .map(|(mut task, kind)| -> Result<PendingTask, Error> {
                task.kind = kind.parse()?;
                Ok(task)
            })
            .collect()
    }

    /// Remove a delivered task. Returns whether it was queued.
    pub async fn remove_task(&self, id: &str) -> Result<bool, Error> {
        let id = id.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM pending_tasks WHERE id = ?1", params![id])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Record a failed delivery attempt, keeping the task queued.
    pub async fn record_task_failure(&self, id: &str, reason: &str) -> Result<(), Error> {
        let id = id.to_string();
        let reason = reason.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "UPDATE pending_tasks SET attempts = attempts + 1, last_error = ?2 WHERE id = ?1",
                    params![id, reason],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_enqueue_and_list() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let task = PendingTask::form("https://api.emailjs.com/api/v1.0/email/send", r#"{"name":"Ada"}"#);

        let id = db.enqueue_task(&task).await.unwrap();
        assert_eq!(id, task.id);

        let pending = db.list_pending_tasks().await.unwrap();
        assert_eq!(pending, vec![task]);
    }

    #[tokio::test]
    async fn test_list_is_oldest_first() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let mut first = PendingTask::new(TaskKind::Analytics, "https://jane.dev/collect", "{}", "application/json");
        first.created_at = "2026-01-01T00:00:00+00:00".to_string();
        let second = PendingTask::form("https://jane.dev/contact", "{}");

        db.enqueue_task(&second).await.unwrap();
        db.enqueue_task(&first).await.unwrap();

        let ids: Vec<String> = db.list_pending_tasks().await.unwrap().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[tokio::test]
    async fn test_remove_task() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let task = PendingTask::form("https://jane.dev/contact", "{}");
        db.enqueue_task(&task).await.unwrap();

        assert!(db.remove_task(&task.id).await.unwrap());
        assert!(!db.remove_task(&task.id).await.unwrap());
        assert!(db.list_pending_tasks().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_record_failure_keeps_task() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let task = PendingTask::form("https://jane.dev/contact", "{}");
        db.enqueue_task(&task).await.unwrap();

        db.record_task_failure(&task.id, "NETWORK_FAILED: offline").await.unwrap();

        let pending = db.list_pending_tasks().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].attempts, 1);
        assert_eq!(pending[0].last_error.as_deref(), Some("NETWORK_FAILED: offline"));
    }

    #[test]
    fn test_task_ids_are_unique() {
        let a = PendingTask::form("https://jane.dev/contact", "{}");
        let b = PendingTask::form("https://jane.dev/contact", "{}");
        assert_ne!(a.id, b.id);
    }
}
