use axum::{
    extract::{Path, Query},
    Extension,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::Notification;
use crate::handlers;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};

#[derive(Debug, Default, Deserialize)]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread: bool,
}

/// GET /api/notifications[?unread=true]
pub async fn list(
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<NotificationQuery>,
) -> ApiResult<Vec<Notification>> {
    let rows = handlers::notifications()
        .await?
        .list_for_user(current.id(), query.unread)
        .await?;
    Ok(ApiResponse::success(rows))
}

/// PUT /api/notifications/:id/read
pub async fn mark_read(Extension(current): Extension<CurrentUser>, Path(id): Path<Uuid>) -> ApiResult<Notification> {
    let row = handlers::notifications().await?.mark_read(current.id(), id).await?;
    Ok(ApiResponse::success(row))
}
