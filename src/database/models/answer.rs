use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::database::repository::Table;
use crate::scoring::ScoredAnswer;

/// One user's latest response to one question
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Answer {
    pub id: Uuid,
    pub user_id: Uuid,
    pub exam_id: Uuid,
    pub question_id: Uuid,
    pub response: Value,
    pub is_correct: bool,
    pub score: f64,
    pub submitted_at: DateTime<Utc>,
    pub scored_at: DateTime<Utc>,
}

impl Answer {
    pub fn scored(&self) -> ScoredAnswer {
        ScoredAnswer {
            user_id: self.user_id,
            question_id: self.question_id,
            is_correct: self.is_correct,
            score: self.score,
            submitted_at: self.submitted_at,
        }
    }
}

impl Table for Answer {
    const TABLE: &'static str = "answers";
    const NAME: &'static str = "Answer";
}
