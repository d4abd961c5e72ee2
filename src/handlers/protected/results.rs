use axum::{extract::Path, Extension};
use uuid::Uuid;

use crate::handlers;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::scoring::ExamSummary;

/// GET /api/exams/:id/result - the caller's result on one exam
pub async fn exam_result(Extension(current): Extension<CurrentUser>, Path(id): Path<Uuid>) -> ApiResult<ExamSummary> {
    let summary = handlers::results().await?.user_summary(current.id(), id).await?;
    Ok(ApiResponse::success(summary))
}

/// GET /api/results - the caller's results across every exam they answered
pub async fn my_results(Extension(current): Extension<CurrentUser>) -> ApiResult<Vec<ExamSummary>> {
    let summaries = handlers::results().await?.user_summaries(current.id()).await?;
    Ok(ApiResponse::success(summaries))
}
