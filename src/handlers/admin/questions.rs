use axum::{extract::Path, Json};
use uuid::Uuid;

use crate::database::models::Question;
use crate::handlers::{self, Deleted};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::QuestionInput;

/// GET /api/admin/exams/:id/questions
pub async fn list(Path(exam_id): Path<Uuid>) -> ApiResult<Vec<Question>> {
    let service = handlers::exams().await?;
    service.get(exam_id).await?;
    Ok(ApiResponse::success(service.questions(exam_id).await?))
}

/// POST /api/admin/exams/:id/questions
pub async fn create(Path(exam_id): Path<Uuid>, Json(input): Json<QuestionInput>) -> ApiResult<Question> {
    let question = handlers::exams().await?.create_question(exam_id, &input).await?;
    Ok(ApiResponse::created(question))
}

/// PUT /api/admin/questions/:id - stored answers keep their scores until a rescore
pub async fn update(Path(id): Path<Uuid>, Json(input): Json<QuestionInput>) -> ApiResult<Question> {
    let question = handlers::exams().await?.update_question(id, &input).await?;
    Ok(ApiResponse::success(question))
}

/// DELETE /api/admin/questions/:id
pub async fn delete(Path(id): Path<Uuid>) -> ApiResult<Deleted> {
    handlers::exams().await?.delete_question(id).await?;
    Ok(ApiResponse::success(Deleted { id }))
}
