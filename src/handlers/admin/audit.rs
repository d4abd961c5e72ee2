use axum::extract::{Path, Query};
use uuid::Uuid;

use super::LimitQuery;
use crate::database::models::{LoginLog, Session};
use crate::handlers::{self, Deleted};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::LoginLogQuery;

/// GET /api/admin/login-logs[?user_id=&username=&success=&limit=]
pub async fn login_logs(Query(query): Query<LoginLogQuery>) -> ApiResult<Vec<LoginLog>> {
    Ok(ApiResponse::success(handlers::login_audit().await?.list(&query).await?))
}

/// GET /api/admin/sessions - sessions that are neither revoked nor expired
pub async fn sessions(Query(query): Query<LimitQuery>) -> ApiResult<Vec<Session>> {
    Ok(ApiResponse::success(handlers::sessions().await?.list_active(query.limit).await?))
}

/// DELETE /api/admin/sessions/:id - force logout of one session
pub async fn revoke_session(Path(id): Path<Uuid>) -> ApiResult<Deleted> {
    handlers::sessions().await?.revoke(id).await?;
    Ok(ApiResponse::success(Deleted { id }))
}
