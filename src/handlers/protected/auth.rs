use axum::Extension;
use serde::Serialize;
use tracing::info;

use crate::database::models::{Session, User};
use crate::handlers::{self, Deleted};
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};

#[derive(Debug, Serialize)]
pub struct WhoAmI {
    pub user: User,
    pub session: Session,
}

/// GET /api/auth/whoami
pub async fn whoami(Extension(current): Extension<CurrentUser>) -> ApiResult<WhoAmI> {
    Ok(ApiResponse::success(WhoAmI {
        user: current.user,
        session: current.session,
    }))
}

/// GET /api/auth/sessions - the caller's sessions, most recently used first
pub async fn sessions(Extension(current): Extension<CurrentUser>) -> ApiResult<Vec<Session>> {
    let sessions = handlers::sessions().await?.list_for_user(current.id()).await?;
    Ok(ApiResponse::success(sessions))
}

/// DELETE /api/auth/session - logout; the current token stops working
pub async fn logout(Extension(current): Extension<CurrentUser>) -> ApiResult<Deleted> {
    handlers::sessions().await?.revoke(current.session.id).await?;
    info!(username = %current.user.username, "logged out");
    Ok(ApiResponse::success(Deleted { id: current.session.id }))
}
