use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{PgConnection, PgPool};
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};
use uuid::Uuid;

use super::exam_service::ExamService;
use super::notification_service::{NotificationService, OutgoingNotification};
use super::{FieldErrors, ServiceError};
use crate::config;
use crate::database::models::{Answer, Question};
use crate::scoring::{self, AnswerKey, ExamSummary, QuestionScore, Response, ScoringOptions};

#[derive(Debug, Clone, Deserialize)]
pub struct AnswerInput {
    pub question_id: Uuid,
    #[serde(default)]
    pub response: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnswerResult {
    pub question_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
    pub score: f64,
    pub max_score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReceipt {
    pub results: Vec<AnswerResult>,
    pub summary: ExamSummary,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RescoreReport {
    pub exam_id: Uuid,
    /// Answers examined
    pub answers: usize,
    pub changed: usize,
    pub users_affected: usize,
    /// Answers left alone because their question's key is invalid
    pub skipped: usize,
}

/// A stored answer whose score differs under the current key
#[derive(Debug, Clone, PartialEq)]
struct Rescored {
    answer_id: Uuid,
    user_id: Uuid,
    /// Submission the new score was computed from
    submitted_at: DateTime<Utc>,
    score: QuestionScore,
}

pub struct AnswerService {
    pool: PgPool,
    exams: ExamService,
    notifications: NotificationService,
}

impl AnswerService {
    pub fn new(pool: PgPool) -> Self {
        let notifications = NotificationService::new(pool.clone());
        Self::with_notifications(pool, notifications)
    }

    pub fn with_notifications(pool: PgPool, notifications: NotificationService) -> Self {
        Self {
            exams: ExamService::new(pool.clone()),
            pool,
            notifications,
        }
    }

    /// Score and store a batch of answers for one exam. A later submission
    /// for the same question replaces the earlier one.
    pub async fn submit(
        &self,
        user_id: Uuid,
        exam_id: Uuid,
        inputs: &[AnswerInput],
    ) -> Result<SubmissionReceipt, ServiceError> {
        let exam = self.exams.get_published(exam_id).await?;
        let now = Utc::now();
        if !exam.is_open_at(now) {
            return Err(ServiceError::Forbidden("Exam is not open for submissions".to_string()));
        }
        if inputs.is_empty() {
            return Err(ServiceError::InvalidInput("No answers submitted".to_string()));
        }

        let questions = self.exams.questions(exam_id).await?;
        let by_id: HashMap<Uuid, &Question> = questions.iter().map(|q| (q.id, q)).collect();
        check_inputs(inputs, &by_id)?;

        let options = ScoringOptions::from(&config::config().scoring);
        let mut scored = Vec::with_capacity(inputs.len());
        for input in inputs {
            let question = by_id[&input.question_id];
            let score = score_response(&question.key()?, &input.response, question.points, options);
            scored.push((input, score));
        }

        let mut tx = self.pool.begin().await?;
        for (input, score) in &scored {
            sqlx::query(
                "INSERT INTO answers
                    (id, user_id, exam_id, question_id, response, is_correct, score, submitted_at, scored_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
                 ON CONFLICT (user_id, question_id) DO UPDATE SET
                    response = EXCLUDED.response,
                    is_correct = EXCLUDED.is_correct,
                    score = EXCLUDED.score,
                    submitted_at = EXCLUDED.submitted_at,
                    scored_at = EXCLUDED.scored_at",
            )
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(exam_id)
            .bind(input.question_id)
            .bind(&input.response)
            .bind(score.is_correct)
            .bind(score.score)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        info!(user_id = %user_id, exam_id = %exam_id, answers = scored.len(), "answers submitted");

        let reveal = config::config().api.reveal_correctness;
        let results = scored
            .iter()
            .map(|(input, score)| AnswerResult {
                question_id: input.question_id,
                is_correct: reveal.then_some(score.is_correct),
                score: score.score,
                max_score: score.max_score,
            })
            .collect();

        let answers = self.answers_for_user(user_id, exam_id).await?;
        let points: Vec<_> = questions.iter().map(Question::points).collect();
        let summary = scoring::summarize_user(exam_id, user_id, &points, &answers, exam.passing_score);

        Ok(SubmissionReceipt { results, summary })
    }

    /// Re-score every stored answer of an exam against the current keys and
    /// persist the ones that changed
    pub async fn rescore_exam(&self, exam_id: Uuid) -> Result<RescoreReport, ServiceError> {
        let exam = self.exams.get(exam_id).await?;
        let questions = self.exams.questions(exam_id).await?;

        let mut keys: HashMap<Uuid, (AnswerKey, f64)> = HashMap::new();
        for question in &questions {
            match question.key() {
                Ok(key) => {
                    keys.insert(question.id, (key, question.points));
                }
                Err(e) => warn!(question_id = %question.id, "skipping question with invalid key: {}", e),
            }
        }

        let answers = sqlx::query_as::<_, Answer>("SELECT * FROM answers WHERE exam_id = $1")
            .bind(exam_id)
            .fetch_all(&self.pool)
            .await?;

        let options = ScoringOptions::from(&config::config().scoring);
        let (changes, skipped) = plan_rescore(&keys, &answers, options);

        let mut tx = self.pool.begin().await?;
        let written = write_rescored(&mut tx, &changes, Utc::now()).await?;
        tx.commit().await?;

        let affected: Vec<Uuid> = written
            .iter()
            .map(|c| c.user_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let report = RescoreReport {
            exam_id,
            answers: answers.len(),
            changed: written.len(),
            users_affected: affected.len(),
            skipped,
        };
        info!(
            exam_id = %exam_id,
            answers = report.answers,
            changed = report.changed,
            users_affected = report.users_affected,
            skipped = report.skipped,
            "exam rescored"
        );

        if !affected.is_empty() {
            let notice = OutgoingNotification::new(
                "rescore",
                format!("Results updated: {}", exam.title),
                "Your answers were rescored. Check your result for the new score.",
            );
            self.notifications.notify(&affected, &notice).await?;
        }

        Ok(report)
    }

    async fn answers_for_user(&self, user_id: Uuid, exam_id: Uuid) -> Result<Vec<scoring::ScoredAnswer>, ServiceError> {
        let rows = sqlx::query_as::<_, Answer>("SELECT * FROM answers WHERE user_id = $1 AND exam_id = $2")
            .bind(user_id)
            .bind(exam_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(Answer::scored).collect())
    }
}

/// Store new scores. A row resubmitted since it was read keeps the score its
/// own submission produced and is left out of the result.
async fn write_rescored<'a>(
    conn: &mut PgConnection,
    changes: &'a [Rescored],
    now: DateTime<Utc>,
) -> Result<Vec<&'a Rescored>, ServiceError> {
    let mut written = Vec::with_capacity(changes.len());
    for change in changes {
        let result = sqlx::query(
            "UPDATE answers SET is_correct = $2, score = $3, scored_at = $4
             WHERE id = $1 AND submitted_at = $5",
        )
        .bind(change.answer_id)
        .bind(change.score.is_correct)
        .bind(change.score.score)
        .bind(now)
        .bind(change.submitted_at)
        .execute(&mut *conn)
        .await?;
        if result.rows_affected() == 1 {
            written.push(change);
        }
    }
    Ok(written)
}

fn score_response(key: &AnswerKey, raw: &Value, points: f64, options: ScoringOptions) -> QuestionScore {
    let response = Response::parse(key.question_type(), raw);
    scoring::score_question(key, &response, points, options)
}

/// Every submitted question must belong to the exam and appear once
fn check_inputs(inputs: &[AnswerInput], questions: &HashMap<Uuid, &Question>) -> Result<(), ServiceError> {
    let mut errors = FieldErrors::default();
    let mut seen = HashSet::new();
    for (i, input) in inputs.iter().enumerate() {
        let field = format!("answers[{}].question_id", i);
        if !questions.contains_key(&input.question_id) {
            errors.add(field, "is not a question of this exam");
        } else if !seen.insert(input.question_id) {
            errors.add(field, "is answered more than once");
        }
    }
    errors.into_result("Invalid answers")
}

/// Returns the answers whose score or correctness changed, plus the number
/// of answers skipped for lack of a valid key
fn plan_rescore(
    keys: &HashMap<Uuid, (AnswerKey, f64)>,
    answers: &[Answer],
    options: ScoringOptions,
) -> (Vec<Rescored>, usize) {
    let mut changes = Vec::new();
    let mut skipped = 0;

    for answer in answers {
        let Some((key, points)) = keys.get(&answer.question_id) else {
            skipped += 1;
            continue;
        };
        let score = score_response(key, &answer.response, *points, options);
        if score.is_correct != answer.is_correct || (score.score - answer.score).abs() > f64::EPSILON {
            changes.push(Rescored {
                answer_id: answer.id,
                user_id: answer.user_id,
                submitted_at: answer.submitted_at,
                score,
            });
        }
    }
    (changes, skipped)
}
