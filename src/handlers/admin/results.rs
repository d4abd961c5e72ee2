use axum::extract::Path;
use uuid::Uuid;

use crate::handlers;
use crate::middleware::{ApiResponse, ApiResult};
use crate::scoring::{ExamSummary, QuestionStats};
use crate::services::RescoreReport;

/// GET /api/admin/exams/:id/results - ranked by total score
pub async fn exam_results(Path(id): Path<Uuid>) -> ApiResult<Vec<ExamSummary>> {
    Ok(ApiResponse::success(handlers::results().await?.exam_summaries(id).await?))
}

/// GET /api/admin/exams/:id/stats - per-question attempt statistics
pub async fn exam_stats(Path(id): Path<Uuid>) -> ApiResult<Vec<QuestionStats>> {
    Ok(ApiResponse::success(handlers::results().await?.exam_stats(id).await?))
}

/// POST /api/admin/exams/:id/rescore
pub async fn rescore(Path(id): Path<Uuid>) -> ApiResult<RescoreReport> {
    Ok(ApiResponse::success(handlers::answers().await?.rescore_exam(id).await?))
}
