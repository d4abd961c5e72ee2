//! Auto-scoring engine
//!
//! Compares submitted responses against stored answer keys and rolls the
//! per-question results up into per-exam summaries.
//!
//! - [`answer_key`]: parsing and validation of answer keys and responses
//! - [`compare`]: per-question comparison rules for each question type
//! - [`aggregate`]: grouping and summation of scored answers

pub mod aggregate;
pub mod answer_key;
pub mod compare;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use aggregate::{question_stats, summarize, summarize_user, ExamSummary, QuestionPoints, QuestionStats, ScoredAnswer};
pub use answer_key::{AnswerKey, Response};
pub use compare::{score_question, QuestionScore, ScoringOptions};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoringError {
    #[error("Unknown question type: {0}")]
    UnknownQuestionType(String),

    #[error("Invalid answer key for {question_type}: {reason}")]
    InvalidAnswerKey {
        question_type: QuestionType,
        reason: String,
    },
}

impl ScoringError {
    pub(crate) fn invalid_key(question_type: QuestionType, reason: impl Into<String>) -> Self {
        ScoringError::InvalidAnswerKey {
            question_type,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    SingleChoice,
    MultipleChoice,
    ShortAnswer,
    FillBlank,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::SingleChoice => "single_choice",
            QuestionType::MultipleChoice => "multiple_choice",
            QuestionType::ShortAnswer => "short_answer",
            QuestionType::FillBlank => "fill_blank",
        }
    }

    /// Choice questions carry an option list the key must draw from
    pub fn is_choice(&self) -> bool {
        matches!(self, QuestionType::SingleChoice | QuestionType::MultipleChoice)
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = ScoringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single_choice" | "single" => Ok(QuestionType::SingleChoice),
            "multiple_choice" | "multiple" => Ok(QuestionType::MultipleChoice),
            "short_answer" | "short" => Ok(QuestionType::ShortAnswer),
            "fill_blank" | "fill_in_blank" => Ok(QuestionType::FillBlank),
            other => Err(ScoringError::UnknownQuestionType(other.to_string())),
        }
    }
}

/// Round a score to two decimal places
pub(crate) fn round_score(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_question_type_aliases() {
        assert_eq!("single".parse::<QuestionType>().unwrap(), QuestionType::SingleChoice);
        assert_eq!("fill_in_blank".parse::<QuestionType>().unwrap(), QuestionType::FillBlank);
        assert_eq!(
            "essay".parse::<QuestionType>(),
            Err(ScoringError::UnknownQuestionType("essay".to_string()))
        );
    }

    #[test]
    fn question_type_serializes_snake_case() {
        let value = serde_json::to_value(QuestionType::MultipleChoice).unwrap();
        assert_eq!(value, serde_json::json!("multiple_choice"));
        assert_eq!(QuestionType::ShortAnswer.to_string(), "short_answer");
    }

    #[test]
    fn rounds_to_two_places() {
        assert_eq!(round_score(3.333333), 3.33);
        assert_eq!(round_score(0.666666), 0.67);
    }
}
