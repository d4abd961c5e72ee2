pub mod answer_service;
pub mod exam_service;
pub mod login_audit;
pub mod notification_service;
pub mod result_service;
pub mod session_service;
pub mod user_service;

use std::collections::HashMap;

use crate::auth::JwtError;
use crate::database::manager::DatabaseError;
use crate::scoring::ScoringError;

pub use answer_service::{AnswerInput, AnswerService, RescoreReport, SubmissionReceipt};
pub use exam_service::{ExamInput, ExamService, QuestionInput};
pub use login_audit::{client_ip, LoginAttempt, LoginAudit, LoginLogQuery};
pub use notification_service::{
    DatabaseSink, LogSink, NotificationService, NotificationSink, OutgoingNotification,
};
pub use result_service::ResultService;
pub use session_service::{ClientContext, SessionService};
pub use user_service::{LoginOutcome, NewUser, UserService, UserUpdate};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Jwt(#[from] JwtError),

    #[error(transparent)]
    Scoring(#[from] ScoringError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{message}")]
    Validation {
        message: String,
        field_errors: HashMap<String, String>,
    },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Too many requests: {0}")]
    TooManyRequests(String),
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        ServiceError::Database(err.into())
    }
}

impl ServiceError {
    pub fn validation(message: impl Into<String>, field_errors: HashMap<String, String>) -> Self {
        ServiceError::Validation {
            message: message.into(),
            field_errors,
        }
    }
}

/// Collects field errors and turns them into a single validation failure
#[derive(Debug, Default)]
pub(crate) struct FieldErrors(HashMap<String, String>);

impl FieldErrors {
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.add(field, message);
        }
    }

    pub fn into_result(self, message: &str) -> Result<(), ServiceError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::validation(message, self.0))
        }
    }
}
