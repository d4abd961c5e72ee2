use axum::{extract::Request, middleware::Next, response::Response};
use tracing::warn;
use uuid::Uuid;

use crate::auth::Claims;
use crate::database::models::{Session, User};
use crate::database::{DatabaseManager, Repository};
use crate::error::ApiError;
use crate::services::SessionService;

/// The authenticated user and the session their token belongs to
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub user: User,
    pub session: Session,
}

impl CurrentUser {
    pub fn id(&self) -> Uuid {
        self.user.id
    }

    pub fn is_admin(&self) -> bool {
        self.user.is_admin()
    }
}

/// Middleware that checks the token's session against the sessions table
/// and loads the user it belongs to. The user must still be active.
pub async fn validate_session_middleware(mut request: Request, next: Next) -> Result<Response, ApiError> {
    let claims = request
        .extensions()
        .get::<Claims>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("JWT authentication required before session validation"))?;

    let pool = DatabaseManager::pool().await?;
    let session = SessionService::new(pool.clone())
        .validate(claims.sid, claims.sub)
        .await?;

    let user = Repository::<User>::new(pool)?
        .select_optional(claims.sub)
        .await?
        .filter(|user| user.is_active)
        .ok_or_else(|| {
            warn!(user_id = %claims.sub, username = %claims.username, "token presented for inactive or missing user");
            ApiError::forbidden("Account is disabled")
        })?;

    request.extensions_mut().insert(CurrentUser { user, session });
    Ok(next.run(request).await)
}
