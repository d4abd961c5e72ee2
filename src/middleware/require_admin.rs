use axum::{extract::Request, middleware::Next, response::Response};
use tracing::warn;

use super::validate_session::CurrentUser;
use crate::error::ApiError;

/// Admin tier gate. The role is read from the database user loaded by the
/// session middleware, so a demoted admin loses access immediately.
pub async fn require_admin_middleware(request: Request, next: Next) -> Result<Response, ApiError> {
    let current = request
        .extensions()
        .get::<CurrentUser>()
        .ok_or_else(|| ApiError::unauthorized("Session validation required before admin check"))?;

    if !current.is_admin() {
        warn!(
            username = %current.user.username,
            path = %request.uri().path(),
            "non-admin denied admin route"
        );
        return Err(ApiError::forbidden("Administrator access required"));
    }

    Ok(next.run(request).await)
}
