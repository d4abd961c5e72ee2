use anyhow::Context;
use serde_json::json;

use crate::cli::{utils::output_success, OutputFormat};
use crate::database::models::{Exam, Question, User};
use crate::database::{DatabaseManager, Repository};

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    DatabaseManager::migrate()
        .await
        .context("failed to apply migrations")?;

    let pool = DatabaseManager::pool().await?;
    let users = Repository::<User>::new(pool.clone())?.count().await?;
    let exams = Repository::<Exam>::new(pool.clone())?.count().await?;
    let questions = Repository::<Question>::new(pool)?.count().await?;

    output_success(
        output_format,
        &format!("Migrations applied ({} users, {} exams, {} questions)", users, exams, questions),
        Some(json!({ "users": users, "exams": exams, "questions": questions })),
    )
}
