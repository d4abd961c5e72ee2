use async_trait::async_trait;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::ServiceError;
use crate::database::models::Notification;

/// Deliveries in flight at once during a fan-out
const MAX_CONCURRENT_DELIVERIES: usize = 8;

#[derive(Debug, Clone, Deserialize)]
pub struct OutgoingNotification {
    #[serde(default = "default_kind")]
    pub kind: String,
    pub title: String,
    pub body: String,
}

fn default_kind() -> String {
    "info".to_string()
}

impl OutgoingNotification {
    pub fn new(kind: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            title: title.into(),
            body: body.into(),
        }
    }
}

/// Delivery seam for notifications
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, user_id: Uuid, notification: &OutgoingNotification) -> Result<(), ServiceError>;
}

/// Stores notifications so users can read them through the API
pub struct DatabaseSink {
    pool: PgPool,
}

impl DatabaseSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationSink for DatabaseSink {
    async fn deliver(&self, user_id: Uuid, notification: &OutgoingNotification) -> Result<(), ServiceError> {
        sqlx::query(
            "INSERT INTO notifications (id, user_id, kind, title, body, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&notification.kind)
        .bind(&notification.title)
        .bind(&notification.body)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn deliver(&self, user_id: Uuid, notification: &OutgoingNotification) -> Result<(), ServiceError> {
        info!(
            user_id = %user_id,
            kind = %notification.kind,
            title = %notification.title,
            "notification"
        );
        Ok(())
    }
}

pub struct NotificationService {
    pool: PgPool,
    sink: Arc<dyn NotificationSink>,
}

impl NotificationService {
    /// Service backed by the database sink
    pub fn new(pool: PgPool) -> Self {
        let sink = Arc::new(DatabaseSink::new(pool.clone()));
        Self { pool, sink }
    }

    pub fn with_sink(pool: PgPool, sink: Arc<dyn NotificationSink>) -> Self {
        Self { pool, sink }
    }

    /// Deliver to the given users, or to every active user when the list is
    /// empty. Returns the number of successful deliveries; failures are
    /// logged and skipped.
    pub async fn notify(&self, user_ids: &[Uuid], notification: &OutgoingNotification) -> Result<usize, ServiceError> {
        let recipients: Vec<Uuid> = if user_ids.is_empty() {
            sqlx::query_scalar("SELECT id FROM users WHERE is_active")
                .fetch_all(&self.pool)
                .await?
        } else {
            dedup(user_ids)
        };

        let delivered = deliver_all(
            self.sink.as_ref(),
            &recipients,
            notification,
            MAX_CONCURRENT_DELIVERIES,
        )
        .await;

        info!(
            kind = %notification.kind,
            recipients = recipients.len(),
            delivered,
            "notifications sent"
        );
        Ok(delivered)
    }

    /// Unread first, newest first
    pub async fn list_for_user(&self, user_id: Uuid, unread_only: bool) -> Result<Vec<Notification>, ServiceError> {
        let rows = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications
             WHERE user_id = $1 AND (read_at IS NULL OR NOT $2)
             ORDER BY (read_at IS NULL) DESC, created_at DESC
             LIMIT 200",
        )
        .bind(user_id)
        .bind(unread_only)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Marking an already read notification is a no-op. Other users'
    /// notifications look missing.
    pub async fn mark_read(&self, user_id: Uuid, id: Uuid) -> Result<Notification, ServiceError> {
        let row = sqlx::query_as::<_, Notification>(
            "UPDATE notifications SET read_at = COALESCE(read_at, $3)
             WHERE id = $1 AND user_id = $2
             RETURNING *",
        )
        .bind(id)
        .bind(user_id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Notification {} not found", id)))?;
        Ok(row)
    }
}

fn dedup(ids: &[Uuid]) -> Vec<Uuid> {
    let mut out: Vec<Uuid> = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(id) {
            out.push(*id);
        }
    }
    out
}

/// Fan out with at most `concurrency` deliveries in flight. Returns the
/// number that succeeded.
async fn deliver_all(
    sink: &dyn NotificationSink,
    recipients: &[Uuid],
    notification: &OutgoingNotification,
    concurrency: usize,
) -> usize {
    let results: Vec<_> = stream::iter(recipients.iter().copied())
        .map(|user_id| async move { (user_id, sink.deliver(user_id, notification).await) })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut delivered = 0;
    for (user_id, result) in results {
        match result {
            Ok(()) => delivered += 1,
            Err(e) => warn!(user_id = %user_id, "notification delivery failed: {}", e),
        }
    }
    delivered
}
