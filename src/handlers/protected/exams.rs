use axum::{extract::Path, Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::models::{Exam, QuestionView};
use crate::handlers;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::services::{AnswerInput, SubmissionReceipt};

#[derive(Debug, Serialize)]
pub struct ExamPaper {
    pub exam: Exam,
    pub questions: Vec<QuestionView>,
}

/// Answers may be posted as a bare array or wrapped in `{"answers": [...]}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SubmitRequest {
    Bare(Vec<AnswerInput>),
    Wrapped { answers: Vec<AnswerInput> },
}

impl SubmitRequest {
    fn into_answers(self) -> Vec<AnswerInput> {
        match self {
            SubmitRequest::Bare(answers) | SubmitRequest::Wrapped { answers } => answers,
        }
    }
}

/// GET /api/exams - published exams
pub async fn list() -> ApiResult<Vec<Exam>> {
    let exams = handlers::exams().await?.list(false).await?;
    Ok(ApiResponse::success(exams))
}

/// GET /api/exams/:id - the exam with its questions, answer keys stripped
pub async fn get(Path(id): Path<Uuid>) -> ApiResult<ExamPaper> {
    let service = handlers::exams().await?;
    let exam = service.get_published(id).await?;
    let questions = service.questions(id).await?.iter().map(|q| q.view()).collect();
    Ok(ApiResponse::success(ExamPaper { exam, questions }))
}

/// POST /api/exams/:id/answers
pub async fn submit(
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<SubmitRequest>,
) -> ApiResult<SubmissionReceipt> {
    let receipt = handlers::answers()
        .await?
        .submit(current.id(), id, &body.into_answers())
        .await?;
    Ok(ApiResponse::success(receipt))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_bare_and_wrapped_submissions() {
        let q = Uuid::new_v4();
        let bare: SubmitRequest = serde_json::from_value(json!([{"question_id": q, "response": "A"}])).unwrap();
        let wrapped: SubmitRequest =
            serde_json::from_value(json!({"answers": [{"question_id": q, "response": ["A", "B"]}]})).unwrap();

        assert_eq!(bare.into_answers()[0].question_id, q);
        assert_eq!(wrapped.into_answers()[0].response, json!(["A", "B"]));
    }

    #[test]
    fn missing_response_means_unanswered() {
        let q = Uuid::new_v4();
        let body: SubmitRequest = serde_json::from_value(json!([{"question_id": q}])).unwrap();
        assert!(body.into_answers()[0].response.is_null());
    }
}
