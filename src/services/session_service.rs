use axum::http::{header, HeaderMap};
use chrono::{Duration, Utc};
use sqlx::PgPool;
use std::net::SocketAddr;
use tracing::info;
use uuid::Uuid;

use super::login_audit::client_ip;
use super::ServiceError;
use crate::config;
use crate::database::models::Session;
use crate::fingerprint::{self, DeviceInfo};

const DEFAULT_LIST_LIMIT: i64 = 200;

/// Where a request came from
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub fingerprint: Option<String>,
}

impl ClientContext {
    pub fn from_request(headers: &HeaderMap, peer: Option<SocketAddr>, device: Option<&DeviceInfo>) -> Self {
        Self {
            ip_address: client_ip(headers, peer),
            user_agent: headers
                .get(header::USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            fingerprint: Some(fingerprint::resolve(device, headers)),
        }
    }
}

pub struct SessionService {
    pool: PgPool,
}

impl SessionService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn open(&self, user_id: Uuid, client: &ClientContext) -> Result<Session, ServiceError> {
        let now = Utc::now();
        let expires_at = now + Duration::hours(config::config().security.jwt_expiry_hours as i64);

        let session = sqlx::query_as::<_, Session>(
            "INSERT INTO sessions
                (id, user_id, device_fingerprint, ip_address, user_agent, created_at, last_seen_at, expires_at)
             VALUES ($1, $2, $3, $4, $5, $6, $6, $7)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&client.fingerprint)
        .bind(&client.ip_address)
        .bind(&client.user_agent)
        .bind(now)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;

        info!(user_id = %user_id, session_id = %session.id, "session opened");
        Ok(session)
    }

    /// Check that the session exists, belongs to the user and is still
    /// usable, then record the activity.
    pub async fn validate(&self, session_id: Uuid, user_id: Uuid) -> Result<Session, ServiceError> {
        let session = sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE id = $1")
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::Unauthorized("Session not found".to_string()))?;

        if session.user_id != user_id {
            return Err(ServiceError::Unauthorized("Session does not belong to this user".to_string()));
        }

        let now = Utc::now();
        let idle = Duration::minutes(config::config().security.session_idle_minutes as i64);
        if let Some(reason) = session.rejection(now, idle) {
            return Err(ServiceError::Unauthorized(reason.to_string()));
        }

        sqlx::query("UPDATE sessions SET last_seen_at = $2 WHERE id = $1")
            .bind(session_id)
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(Session {
            last_seen_at: now,
            ..session
        })
    }

    pub async fn revoke(&self, session_id: Uuid) -> Result<(), ServiceError> {
        let result = sqlx::query("UPDATE sessions SET revoked_at = $2 WHERE id = $1 AND revoked_at IS NULL")
            .bind(session_id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound(format!("Active session {} not found", session_id)));
        }
        info!(session_id = %session_id, "session revoked");
        Ok(())
    }

    pub async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<u64, ServiceError> {
        let result = sqlx::query("UPDATE sessions SET revoked_at = $2 WHERE user_id = $1 AND revoked_at IS NULL")
            .bind(user_id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        let revoked = result.rows_affected();
        if revoked > 0 {
            info!(user_id = %user_id, revoked, "revoked all sessions for user");
        }
        Ok(revoked)
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Session>, ServiceError> {
        let rows = sqlx::query_as::<_, Session>(
            "SELECT * FROM sessions WHERE user_id = $1 ORDER BY last_seen_at DESC LIMIT $2",
        )
        .bind(user_id)
        .bind(DEFAULT_LIST_LIMIT)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Sessions that are neither revoked nor expired
    pub async fn list_active(&self, limit: Option<i64>) -> Result<Vec<Session>, ServiceError> {
        let rows = sqlx::query_as::<_, Session>(
            "SELECT * FROM sessions
             WHERE revoked_at IS NULL AND expires_at > now()
             ORDER BY last_seen_at DESC
             LIMIT $1",
        )
        .bind(limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, 1000))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
