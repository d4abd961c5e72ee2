use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{types::Json, FromRow};
use uuid::Uuid;

use crate::database::repository::Table;
use crate::scoring::{AnswerKey, QuestionPoints, QuestionType, ScoringError};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Question {
    pub id: Uuid,
    pub exam_id: Uuid,
    pub position: i32,
    pub question_type: String,
    pub prompt: String,
    pub options: Json<Vec<String>>,
    pub answer_key: Value,
    pub points: f64,
    pub explanation: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What an exam taker sees: no answer key, no explanation
#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub id: Uuid,
    pub position: i32,
    pub question_type: String,
    pub prompt: String,
    pub options: Vec<String>,
    pub points: f64,
}

impl Question {
    pub fn kind(&self) -> Result<QuestionType, ScoringError> {
        self.question_type.parse()
    }

    pub fn key(&self) -> Result<AnswerKey, ScoringError> {
        AnswerKey::parse(self.kind()?, &self.answer_key)
    }

    pub fn points(&self) -> QuestionPoints {
        QuestionPoints {
            question_id: self.id,
            points: self.points,
        }
    }

    pub fn view(&self) -> QuestionView {
        QuestionView {
            id: self.id,
            position: self.position,
            question_type: self.question_type.clone(),
            prompt: self.prompt.clone(),
            options: self.options.0.clone(),
            points: self.points,
        }
    }
}

impl Table for Question {
    const TABLE: &'static str = "questions";
    const NAME: &'static str = "Question";
}
