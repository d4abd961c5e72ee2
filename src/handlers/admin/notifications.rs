use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::handlers;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::OutgoingNotification;

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    /// Empty or omitted broadcasts to every active user
    #[serde(default)]
    pub user_ids: Vec<Uuid>,
    #[serde(flatten)]
    pub notification: OutgoingNotification,
}

#[derive(Debug, Serialize)]
pub struct SendReport {
    pub delivered: usize,
}

/// POST /api/admin/notifications
pub async fn send(Json(body): Json<SendRequest>) -> ApiResult<SendReport> {
    let delivered = handlers::notifications()
        .await?
        .notify(&body.user_ids, &body.notification)
        .await?;
    Ok(ApiResponse::success(SendReport { delivered }))
}
