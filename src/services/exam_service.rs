use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use sqlx::{types::Json, PgConnection, PgPool};
use tracing::info;
use uuid::Uuid;

use super::{FieldErrors, ServiceError};
use crate::config;
use crate::database::models::{Exam, Question};
use crate::database::Repository;
use crate::scoring::{AnswerKey, QuestionType};

const MAX_TITLE_CHARS: usize = 200;

#[derive(Debug, Clone, Deserialize)]
pub struct ExamInput {
    pub title: String,
    pub description: Option<String>,
    pub duration_minutes: Option<i32>,
    pub passing_score: Option<f64>,
    #[serde(default)]
    pub is_published: bool,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuestionInput {
    pub question_type: String,
    pub prompt: String,
    #[serde(default)]
    pub options: Vec<String>,
    pub answer_key: Value,
    #[serde(default = "default_points")]
    pub points: f64,
    /// Appended after the last question when omitted
    pub position: Option<i32>,
    pub explanation: Option<String>,
}

fn default_points() -> f64 {
    1.0
}

pub struct ExamService {
    pool: PgPool,
}

impl ExamService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, include_unpublished: bool) -> Result<Vec<Exam>, ServiceError> {
        let exams = sqlx::query_as::<_, Exam>(
            "SELECT * FROM exams WHERE is_published OR $1 ORDER BY created_at DESC",
        )
        .bind(include_unpublished)
        .fetch_all(&self.pool)
        .await?;
        Ok(exams)
    }

    pub async fn get(&self, id: Uuid) -> Result<Exam, ServiceError> {
        Ok(Repository::<Exam>::new(self.pool.clone())?.select_404(id).await?)
    }

    /// Unpublished exams look like missing ones to exam takers
    pub async fn get_published(&self, id: Uuid) -> Result<Exam, ServiceError> {
        let exam = self.get(id).await?;
        if !exam.is_published {
            return Err(ServiceError::NotFound(format!("Exam {} not found", id)));
        }
        Ok(exam)
    }

    pub async fn create(&self, input: &ExamInput, created_by: Option<Uuid>) -> Result<Exam, ServiceError> {
        validate_exam(input)?;
        let mut conn = self.pool.acquire().await?;
        let exam = insert_exam(&mut conn, input, created_by, Utc::now()).await?;

        info!(exam_id = %exam.id, title = %exam.title, "exam created");
        Ok(exam)
    }

    /// Create an exam and all of its questions in one transaction. Every
    /// input is validated before anything is written, so a failure leaves
    /// no partial exam behind.
    pub async fn create_with_questions(
        &self,
        input: &ExamInput,
        questions: &[QuestionInput],
        created_by: Option<Uuid>,
    ) -> Result<(Exam, Vec<Question>), ServiceError> {
        let kinds = validate_exam_with_questions(input, questions)?;
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;
        let exam = insert_exam(&mut tx, input, created_by, now).await?;
        let mut created = Vec::with_capacity(questions.len());
        for (i, (question, kind)) in questions.iter().zip(kinds).enumerate() {
            let position = question.position.unwrap_or(i as i32 + 1);
            created.push(insert_question(&mut tx, exam.id, kind, question, position, now).await?);
        }
        tx.commit().await?;

        info!(exam_id = %exam.id, title = %exam.title, questions = created.len(), "exam created");
        Ok((exam, created))
    }

    /// Full replacement of the exam's editable fields
    pub async fn update(&self, id: Uuid, input: &ExamInput) -> Result<Exam, ServiceError> {
        validate_exam(input)?;

        let exam = sqlx::query_as::<_, Exam>(
            "UPDATE exams SET
                title = $2, description = $3, duration_minutes = $4, passing_score = $5,
                is_published = $6, starts_at = $7, ends_at = $8, updated_at = $9
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(input.title.trim())
        .bind(&input.description)
        .bind(input.duration_minutes)
        .bind(input.passing_score)
        .bind(input.is_published)
        .bind(input.starts_at)
        .bind(input.ends_at)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Exam {} not found", id)))?;

        Ok(exam)
    }

    /// Deletes the exam together with its questions and answers
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        Repository::<Exam>::new(self.pool.clone())?.delete(id).await?;
        info!(exam_id = %id, "exam deleted");
        Ok(())
    }

    pub async fn questions(&self, exam_id: Uuid) -> Result<Vec<Question>, ServiceError> {
        let questions = sqlx::query_as::<_, Question>(
            "SELECT * FROM questions WHERE exam_id = $1 ORDER BY position, created_at",
        )
        .bind(exam_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(questions)
    }

    pub async fn get_question(&self, id: Uuid) -> Result<Question, ServiceError> {
        Ok(Repository::<Question>::new(self.pool.clone())?.select_404(id).await?)
    }

    pub async fn create_question(&self, exam_id: Uuid, input: &QuestionInput) -> Result<Question, ServiceError> {
        let kind = validate_question(input)?;
        // 404 before insert rather than a foreign key error
        self.get(exam_id).await?;

        let position = match input.position {
            Some(p) => p,
            None => {
                let (max,): (Option<i32>,) =
                    sqlx::query_as("SELECT MAX(position) FROM questions WHERE exam_id = $1")
                        .bind(exam_id)
                        .fetch_one(&self.pool)
                        .await?;
                max.map_or(1, |m| m + 1)
            }
        };
        let mut conn = self.pool.acquire().await?;
        let question = insert_question(&mut conn, exam_id, kind, input, position, Utc::now()).await?;
        Ok(question)
    }

    /// Replace a question. Existing answers keep their old scores until the
    /// exam is rescored.
    pub async fn update_question(&self, id: Uuid, input: &QuestionInput) -> Result<Question, ServiceError> {
        let kind = validate_question(input)?;
        let current = self.get_question(id).await?;

        let question = sqlx::query_as::<_, Question>(
            "UPDATE questions SET
                position = $2, question_type = $3, prompt = $4, options = $5, answer_key = $6,
                points = $7, explanation = $8, updated_at = $9
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(input.position.unwrap_or(current.position))
        .bind(kind.as_str())
        .bind(input.prompt.trim())
        .bind(Json(&input.options))
        .bind(&input.answer_key)
        .bind(input.points)
        .bind(&input.explanation)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(question)
    }

    pub async fn delete_question(&self, id: Uuid) -> Result<(), ServiceError> {
        Repository::<Question>::new(self.pool.clone())?.delete(id).await?;
        Ok(())
    }
}

async fn insert_exam(
    conn: &mut PgConnection,
    input: &ExamInput,
    created_by: Option<Uuid>,
    now: DateTime<Utc>,
) -> Result<Exam, ServiceError> {
    let exam = sqlx::query_as::<_, Exam>(
        "INSERT INTO exams
            (id, title, description, duration_minutes, passing_score, is_published,
             starts_at, ends_at, created_by, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(input.title.trim())
    .bind(&input.description)
    .bind(input.duration_minutes)
    .bind(input.passing_score)
    .bind(input.is_published)
    .bind(input.starts_at)
    .bind(input.ends_at)
    .bind(created_by)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(exam)
}

async fn insert_question(
    conn: &mut PgConnection,
    exam_id: Uuid,
    kind: QuestionType,
    input: &QuestionInput,
    position: i32,
    now: DateTime<Utc>,
) -> Result<Question, ServiceError> {
    let question = sqlx::query_as::<_, Question>(
        "INSERT INTO questions
            (id, exam_id, position, question_type, prompt, options, answer_key, points,
             explanation, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(exam_id)
    .bind(position)
    .bind(kind.as_str())
    .bind(input.prompt.trim())
    .bind(Json(&input.options))
    .bind(&input.answer_key)
    .bind(input.points)
    .bind(&input.explanation)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(question)
}

pub(crate) fn validate_exam(input: &ExamInput) -> Result<(), ServiceError> {
    let mut errors = FieldErrors::default();
    let title = input.title.trim();
    errors.check(!title.is_empty(), "title", "is required");
    errors.check(
        title.chars().count() <= MAX_TITLE_CHARS,
        "title",
        "must be at most 200 characters",
    );
    if let Some(score) = input.passing_score {
        errors.check((0.0..=100.0).contains(&score), "passing_score", "must be between 0 and 100");
    }
    if let Some(minutes) = input.duration_minutes {
        errors.check(minutes > 0, "duration_minutes", "must be positive");
    }
    if let (Some(start), Some(end)) = (input.starts_at, input.ends_at) {
        errors.check(end > start, "ends_at", "must be after starts_at");
    }
    errors.into_result("Invalid exam")
}

/// Validate a question and its answer key; returns the parsed type
pub(crate) fn validate_question(input: &QuestionInput) -> Result<QuestionType, ServiceError> {
    let mut errors = FieldErrors::default();
    errors.check(!input.prompt.trim().is_empty(), "prompt", "is required");
    errors.check(
        input.points.is_finite() && input.points > 0.0,
        "points",
        "must be greater than 0",
    );

    let kind = match input.question_type.parse::<QuestionType>() {
        Ok(kind) => kind,
        Err(e) => {
            errors.add("question_type", e.to_string());
            return Err(ServiceError::validation("Invalid question", errors.0));
        }
    };

    if kind.is_choice() {
        let case_sensitive = config::config().scoring.case_sensitive_text;
        let mut seen: Vec<String> = Vec::new();
        for option in &input.options {
            let normalized = crate::scoring::answer_key::normalize(option, case_sensitive);
            if normalized.is_empty() {
                errors.add("options", "options must not be blank");
            } else if seen.contains(&normalized) {
                errors.add("options", format!("duplicate option '{}'", option.trim()));
            }
            seen.push(normalized);
        }

        if let Err(e) = AnswerKey::parse(kind, &input.answer_key)
            .and_then(|key| key.check_options(&input.options, case_sensitive))
        {
            errors.add("answer_key", e.to_string());
        }
    } else if let Err(e) = AnswerKey::parse(kind, &input.answer_key) {
        errors.add("answer_key", e.to_string());
    }

    errors.into_result("Invalid question")?;
    Ok(kind)
}

/// Validate an exam and its questions together. Question errors are keyed
/// `questions[i].<field>`.
pub(crate) fn validate_exam_with_questions(
    exam: &ExamInput,
    questions: &[QuestionInput],
) -> Result<Vec<QuestionType>, ServiceError> {
    let mut errors = FieldErrors::default();
    match validate_exam(exam) {
        Ok(()) => {}
        Err(ServiceError::Validation { field_errors, .. }) => errors.0.extend(field_errors),
        Err(e) => return Err(e),
    }

    let mut kinds = Vec::with_capacity(questions.len());
    for (i, question) in questions.iter().enumerate() {
        match validate_question(question) {
            Ok(kind) => kinds.push(kind),
            Err(ServiceError::Validation { field_errors, .. }) => {
                for (field, message) in field_errors {
                    errors.add(format!("questions[{}].{}", i, field), message);
                }
            }
            Err(e) => return Err(e),
        }
    }

    errors.into_result("Invalid exam")?;
    Ok(kinds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn exam_input() -> ExamInput {
        ExamInput {
            title: "Chemistry midterm".into(),
            description: None,
            duration_minutes: Some(60),
            passing_score: Some(70.0),
            is_published: false,
            starts_at: None,
            ends_at: None,
        }
    }

    fn question(kind: &str, options: &[&str], key: Value) -> QuestionInput {
        QuestionInput {
            question_type: kind.into(),
            prompt: "Pick".into(),
            options: options.iter().map(|s| s.to_string()).collect(),
            answer_key: key,
            points: 2.0,
            position: None,
            explanation: None,
        }
    }

    fn fields(result: Result<impl std::fmt::Debug, ServiceError>) -> Vec<String> {
        match result {
            Err(ServiceError::Validation { field_errors, .. }) => {
                let mut keys: Vec<String> = field_errors.into_keys().collect();
                keys.sort();
                keys
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn valid_exam_passes() {
        assert!(validate_exam(&exam_input()).is_ok());
    }

    #[test]
    fn rejects_bad_exam_fields() {
        let mut input = exam_input();
        input.title = "   ".into();
        input.passing_score = Some(120.0);
        input.duration_minutes = Some(0);
        let now = Utc::now();
        input.starts_at = Some(now);
        input.ends_at = Some(now - Duration::hours(1));
        assert_eq!(
            fields(validate_exam(&input)),
            vec!["duration_minutes", "ends_at", "passing_score", "title"]
        );
    }

    #[test]
    fn validates_each_question_type() {
        assert_eq!(
            validate_question(&question("single_choice", &["A", "B"], json!("A"))).unwrap(),
            QuestionType::SingleChoice
        );
        assert_eq!(
            validate_question(&question("multiple_choice", &["A", "B", "C"], json!(["A", "C"]))).unwrap(),
            QuestionType::MultipleChoice
        );
        assert_eq!(
            validate_question(&question("short_answer", &[], json!(["Paris", "paris, france"]))).unwrap(),
            QuestionType::ShortAnswer
        );
        assert_eq!(
            validate_question(&question("fill_blank", &[], json!(["H", "O"]))).unwrap(),
            QuestionType::FillBlank
        );
    }

    #[test]
    fn rejects_key_outside_options() {
        let input = question("single_choice", &["A", "B"], json!("D"));
        assert_eq!(fields(validate_question(&input)), vec!["answer_key"]);
    }

    #[test]
    fn rejects_duplicate_options_and_bad_points() {
        let mut input = question("multiple_choice", &["A", "a"], json!(["A"]));
        input.points = 0.0;
        assert_eq!(fields(validate_question(&input)), vec!["options", "points"]);
    }

    #[test]
    fn rejects_unknown_type() {
        let input = question("essay", &[], json!("anything"));
        assert_eq!(fields(validate_question(&input)), vec!["question_type"]);
    }

    #[test]
    fn validates_exam_and_questions_before_writing() {
        let questions = vec![
            question("single_choice", &["A", "B"], json!("A")),
            question("fill_blank", &[], json!(["H", "O"])),
        ];
        assert_eq!(
            validate_exam_with_questions(&exam_input(), &questions).unwrap(),
            vec![QuestionType::SingleChoice, QuestionType::FillBlank]
        );

        let mut exam = exam_input();
        exam.passing_score = Some(150.0);
        let questions = vec![
            question("single_choice", &["A", "B"], json!("A")),
            question("single_choice", &["A", "B"], json!("Z")),
        ];
        assert_eq!(
            fields(validate_exam_with_questions(&exam, &questions)),
            vec!["passing_score", "questions[1].answer_key"]
        );
    }
}
