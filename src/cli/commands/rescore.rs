use anyhow::Context;
use std::sync::Arc;
use uuid::Uuid;

use crate::cli::{utils::output_success, OutputFormat};
use crate::database::DatabaseManager;
use crate::services::{AnswerService, LogSink, NotificationService};

pub async fn handle(exam_id: Uuid, log_notifications: bool, output_format: OutputFormat) -> anyhow::Result<()> {
    let pool = DatabaseManager::pool().await?;
    let service = if log_notifications {
        AnswerService::with_notifications(
            pool.clone(),
            NotificationService::with_sink(pool, Arc::new(LogSink)),
        )
    } else {
        AnswerService::new(pool)
    };

    let report = service
        .rescore_exam(exam_id)
        .await
        .with_context(|| format!("failed to rescore exam {}", exam_id))?;

    output_success(
        output_format,
        &format!(
            "Rescored {} answers: {} changed, {} users affected",
            report.answers, report.changed, report.users_affected
        ),
        Some(serde_json::to_value(&report)?),
    )
}
