use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use uuid::Uuid;

use super::LimitQuery;
use crate::auth::ROLE_ADMIN;
use crate::database::models::User;
use crate::error::ApiError;
use crate::handlers;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::services::UserUpdate;

/// GET /api/admin/users
pub async fn list(Query(query): Query<LimitQuery>) -> ApiResult<Vec<User>> {
    let users = handlers::users().await?.list(query.limit.unwrap_or(200)).await?;
    Ok(ApiResponse::success(users))
}

/// PUT /api/admin/users/:id - change role or active flag
pub async fn update(
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(update): Json<UserUpdate>,
) -> ApiResult<User> {
    check_self_update(&current, id, &update)?;
    let user = handlers::users().await?.update(id, &update).await?;
    Ok(ApiResponse::success(user))
}

/// An admin cannot lock themselves out
fn check_self_update(current: &CurrentUser, id: Uuid, update: &UserUpdate) -> Result<(), ApiError> {
    if current.id() != id {
        return Ok(());
    }
    if update.is_active == Some(false) {
        return Err(ApiError::bad_request("You cannot deactivate your own account"));
    }
    if update.role.as_deref().is_some_and(|role| role != ROLE_ADMIN) {
        return Err(ApiError::bad_request("You cannot remove your own admin role"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::Session;
    use chrono::Utc;

    fn admin() -> CurrentUser {
        let now = Utc::now();
        let id = Uuid::new_v4();
        CurrentUser {
            user: User {
                id,
                username: "root".into(),
                display_name: None,
                password_hash: String::new(),
                role: ROLE_ADMIN.into(),
                is_active: true,
                created_at: now,
                updated_at: now,
                last_login_at: None,
            },
            session: Session {
                id: Uuid::new_v4(),
                user_id: id,
                device_fingerprint: None,
                ip_address: None,
                user_agent: None,
                created_at: now,
                last_seen_at: now,
                expires_at: now,
                revoked_at: None,
            },
        }
    }

    #[test]
    fn admin_cannot_demote_or_disable_self() {
        let me = admin();
        let disable = UserUpdate {
            is_active: Some(false),
            ..Default::default()
        };
        let demote = UserUpdate {
            role: Some("user".into()),
            ..Default::default()
        };
        assert!(check_self_update(&me, me.id(), &disable).is_err());
        assert!(check_self_update(&me, me.id(), &demote).is_err());
        assert!(check_self_update(&me, Uuid::new_v4(), &disable).is_ok());
    }
}
