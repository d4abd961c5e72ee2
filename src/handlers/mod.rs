// handlers/mod.rs - Three handler tiers
//
// Public (no auth) → Protected (JWT + active session) → Admin (protected + admin role)
pub mod admin;
pub mod protected;
pub mod public;

use uuid::Uuid;

use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::services::{
    AnswerService, ExamService, LoginAudit, NotificationService, ResultService, SessionService, UserService,
};

/// Service constructors over the shared pool. A missing database surfaces
/// as 503 from here.
pub(crate) async fn exams() -> Result<ExamService, ApiError> {
    Ok(ExamService::new(DatabaseManager::pool().await?))
}

pub(crate) async fn answers() -> Result<AnswerService, ApiError> {
    Ok(AnswerService::new(DatabaseManager::pool().await?))
}

pub(crate) async fn results() -> Result<ResultService, ApiError> {
    Ok(ResultService::new(DatabaseManager::pool().await?))
}

pub(crate) async fn users() -> Result<UserService, ApiError> {
    Ok(UserService::new(DatabaseManager::pool().await?))
}

pub(crate) async fn sessions() -> Result<SessionService, ApiError> {
    Ok(SessionService::new(DatabaseManager::pool().await?))
}

pub(crate) async fn login_audit() -> Result<LoginAudit, ApiError> {
    Ok(LoginAudit::new(DatabaseManager::pool().await?))
}

pub(crate) async fn notifications() -> Result<NotificationService, ApiError> {
    Ok(NotificationService::new(DatabaseManager::pool().await?))
}

/// `{"id": ...}` payload for deletes and revocations
#[derive(Debug, serde::Serialize)]
pub struct Deleted {
    pub id: Uuid,
}
