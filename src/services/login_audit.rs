use axum::http::HeaderMap;
use chrono::{Duration, Utc};
use serde::Deserialize;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::net::SocketAddr;
use tracing::{info, warn};
use uuid::Uuid;

use super::ServiceError;
use crate::database::models::LoginLog;

/// Failure reason written for attempts refused by the lockout
pub const LOCKED_OUT: &str = "locked_out";

const DEFAULT_LIST_LIMIT: i64 = 100;
const MAX_LIST_LIMIT: i64 = 1000;

/// One login attempt, successful or not
#[derive(Debug, Clone, Default)]
pub struct LoginAttempt {
    pub user_id: Option<Uuid>,
    pub username: String,
    pub success: bool,
    pub failure_reason: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub device_fingerprint: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginLogQuery {
    pub user_id: Option<Uuid>,
    pub username: Option<String>,
    pub success: Option<bool>,
    pub limit: Option<i64>,
}

pub struct LoginAudit {
    pool: PgPool,
}

impl LoginAudit {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Write the audit row. Audit failures are logged, never propagated:
    /// a login must not fail because its audit trail could not be written.
    pub async fn record(&self, attempt: &LoginAttempt) {
        if attempt.success {
            info!(username = %attempt.username, ip = ?attempt.ip_address, "login succeeded");
        } else {
            warn!(
                username = %attempt.username,
                ip = ?attempt.ip_address,
                reason = ?attempt.failure_reason,
                "login failed"
            );
        }

        let result = sqlx::query(
            "INSERT INTO login_logs
                (id, user_id, username, success, failure_reason, ip_address, user_agent, device_fingerprint, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(Uuid::new_v4())
        .bind(attempt.user_id)
        .bind(&attempt.username)
        .bind(attempt.success)
        .bind(&attempt.failure_reason)
        .bind(&attempt.ip_address)
        .bind(&attempt.user_agent)
        .bind(&attempt.device_fingerprint)
        .bind(Utc::now())
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            warn!("Failed to write login audit row for '{}': {}", attempt.username, e);
        }
    }

    /// Failed attempts for a username inside the window, counting only
    /// those after its most recent success. Attempts refused by the lockout
    /// itself do not count, so the lockout ends once the window passes.
    pub async fn recent_failures(&self, username: &str, window: Duration) -> Result<i64, ServiceError> {
        let since = Utc::now() - window;
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM login_logs
             WHERE username = $1
               AND success = FALSE
               AND failure_reason IS DISTINCT FROM $3
               AND created_at > $2
               AND created_at > COALESCE(
                   (SELECT MAX(created_at) FROM login_logs WHERE username = $1 AND success = TRUE),
                   '-infinity'::timestamptz
               )",
        )
        .bind(username)
        .bind(since)
        .bind(LOCKED_OUT)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    pub async fn list(&self, query: &LoginLogQuery) -> Result<Vec<LoginLog>, ServiceError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM login_logs WHERE TRUE");

        if let Some(user_id) = query.user_id {
            builder.push(" AND user_id = ").push_bind(user_id);
        }
        if let Some(username) = &query.username {
            builder.push(" AND username = ").push_bind(username.clone());
        }
        if let Some(success) = query.success {
            builder.push(" AND success = ").push_bind(success);
        }

        let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);
        builder.push(" ORDER BY created_at DESC LIMIT ").push_bind(limit);

        let rows = builder.build_query_as::<LoginLog>().fetch_all(&self.pool).await?;
        Ok(rows)
    }
}

/// Resolve the client address: first X-Forwarded-For hop, then X-Real-IP,
/// then the socket peer.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(first) = header("x-forwarded-for").and_then(|v| v.split(',').next()) {
        let first = first.trim();
        if !first.is_empty() {
            return Some(first.to_string());
        }
    }
    if let Some(real) = header("x-real-ip") {
        return Some(real.to_string());
    }
    peer.map(|addr| addr.ip().to_string())
}
