use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::database::repository::Table;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub device_fingerprint: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Why this session can no longer be used, if it can't.
    /// An `idle_limit` of zero disables the idle check.
    pub fn rejection(&self, now: DateTime<Utc>, idle_limit: Duration) -> Option<&'static str> {
        if self.revoked_at.is_some() {
            return Some("Session has been revoked");
        }
        if now >= self.expires_at {
            return Some("Session has expired");
        }
        if idle_limit > Duration::zero() && now - self.last_seen_at > idle_limit {
            return Some("Session timed out due to inactivity");
        }
        None
    }
}

impl Table for Session {
    const TABLE: &'static str = "sessions";
    const NAME: &'static str = "Session";
}
