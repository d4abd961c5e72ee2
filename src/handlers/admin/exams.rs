use axum::{extract::Path, Extension, Json};
use serde::Serialize;
use uuid::Uuid;

use crate::database::models::{Exam, Question};
use crate::handlers::{self, Deleted};
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::services::ExamInput;

/// An exam with its full questions, answer keys included
#[derive(Debug, Serialize)]
pub struct ExamDetail {
    pub exam: Exam,
    pub questions: Vec<Question>,
}

/// GET /api/admin/exams - every exam, published or not
pub async fn list() -> ApiResult<Vec<Exam>> {
    let exams = handlers::exams().await?.list(true).await?;
    Ok(ApiResponse::success(exams))
}

/// POST /api/admin/exams
pub async fn create(Extension(current): Extension<CurrentUser>, Json(input): Json<ExamInput>) -> ApiResult<Exam> {
    let exam = handlers::exams().await?.create(&input, Some(current.id())).await?;
    Ok(ApiResponse::created(exam))
}

/// GET /api/admin/exams/:id
pub async fn get(Path(id): Path<Uuid>) -> ApiResult<ExamDetail> {
    let service = handlers::exams().await?;
    let exam = service.get(id).await?;
    let questions = service.questions(id).await?;
    Ok(ApiResponse::success(ExamDetail { exam, questions }))
}

/// PUT /api/admin/exams/:id
pub async fn update(Path(id): Path<Uuid>, Json(input): Json<ExamInput>) -> ApiResult<Exam> {
    let exam = handlers::exams().await?.update(id, &input).await?;
    Ok(ApiResponse::success(exam))
}

/// DELETE /api/admin/exams/:id - removes its questions and answers too
pub async fn delete(Path(id): Path<Uuid>) -> ApiResult<Deleted> {
    handlers::exams().await?.delete(id).await?;
    Ok(ApiResponse::success(Deleted { id }))
}
