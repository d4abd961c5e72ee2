use sqlx::PgPool;
use uuid::Uuid;

use super::exam_service::ExamService;
use super::ServiceError;
use crate::database::models::{Answer, Exam};
use crate::scoring::{self, ExamSummary, QuestionPoints, QuestionStats, ScoredAnswer};

/// Exams the user has answered that are still visible to exam takers
const ANSWERED_EXAMS_SQL: &str = "SELECT e.* FROM exams e
     WHERE e.is_published
       AND EXISTS (SELECT 1 FROM answers a WHERE a.exam_id = e.id AND a.user_id = $1)";

/// Results are always computed from the stored answers; nothing is cached
pub struct ResultService {
    pool: PgPool,
    exams: ExamService,
}

impl ResultService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            exams: ExamService::new(pool.clone()),
            pool,
        }
    }

    /// One user's result on a published exam
    pub async fn user_summary(&self, user_id: Uuid, exam_id: Uuid) -> Result<ExamSummary, ServiceError> {
        let exam = self.exams.get_published(exam_id).await?;
        let points = self.question_points(exam_id).await?;
        let answers = self
            .answers(
                "SELECT * FROM answers WHERE exam_id = $1 AND user_id = $2",
                exam_id,
                Some(user_id),
            )
            .await?;
        Ok(scoring::summarize_user(exam_id, user_id, &points, &answers, exam.passing_score))
    }

    /// Summaries for every published exam the user has answered, newest
    /// activity first
    pub async fn user_summaries(&self, user_id: Uuid) -> Result<Vec<ExamSummary>, ServiceError> {
        let exams = sqlx::query_as::<_, Exam>(ANSWERED_EXAMS_SQL)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        let mut summaries = Vec::with_capacity(exams.len());
        for exam in exams {
            let points = self.question_points(exam.id).await?;
            let answers = self
                .answers(
                    "SELECT * FROM answers WHERE exam_id = $1 AND user_id = $2",
                    exam.id,
                    Some(user_id),
                )
                .await?;
            summaries.push(scoring::summarize_user(
                exam.id,
                user_id,
                &points,
                &answers,
                exam.passing_score,
            ));
        }
        summaries.sort_by(|a, b| b.last_submitted_at.cmp(&a.last_submitted_at));
        Ok(summaries)
    }

    /// Ranked summaries of everyone who answered the exam
    pub async fn exam_summaries(&self, exam_id: Uuid) -> Result<Vec<ExamSummary>, ServiceError> {
        let exam = self.exams.get(exam_id).await?;
        let points = self.question_points(exam_id).await?;
        let answers = self
            .answers("SELECT * FROM answers WHERE exam_id = $1", exam_id, None)
            .await?;
        Ok(scoring::summarize(exam_id, &points, &answers, exam.passing_score))
    }

    pub async fn exam_stats(&self, exam_id: Uuid) -> Result<Vec<QuestionStats>, ServiceError> {
        self.exams.get(exam_id).await?;
        let points = self.question_points(exam_id).await?;
        let answers = self
            .answers("SELECT * FROM answers WHERE exam_id = $1", exam_id, None)
            .await?;
        Ok(scoring::question_stats(&points, &answers))
    }

    async fn question_points(&self, exam_id: Uuid) -> Result<Vec<QuestionPoints>, ServiceError> {
        let rows: Vec<(Uuid, f64)> =
            sqlx::query_as("SELECT id, points FROM questions WHERE exam_id = $1 ORDER BY position, created_at")
                .bind(exam_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows
            .into_iter()
            .map(|(question_id, points)| QuestionPoints { question_id, points })
            .collect())
    }

    async fn answers(&self, sql: &str, exam_id: Uuid, user_id: Option<Uuid>) -> Result<Vec<ScoredAnswer>, ServiceError> {
        let mut query = sqlx::query_as::<_, Answer>(sql).bind(exam_id);
        if let Some(user_id) = user_id {
            query = query.bind(user_id);
        }
        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.iter().map(Answer::scored).collect())
    }
}
