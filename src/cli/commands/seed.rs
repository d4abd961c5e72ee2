use anyhow::Context;
use serde::Deserialize;
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

use crate::cli::{utils::output_success, OutputFormat};
use crate::database::DatabaseManager;
use crate::services::exam_service::validate_exam_with_questions;
use crate::services::{ExamInput, ExamService, NewUser, QuestionInput, ServiceError, UserService};

#[derive(Debug, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub users: Vec<NewUser>,
    #[serde(default)]
    pub exams: Vec<SeedExam>,
}

#[derive(Debug, Deserialize)]
pub struct SeedExam {
    #[serde(flatten)]
    pub exam: ExamInput,
    #[serde(default)]
    pub questions: Vec<QuestionInput>,
}

#[derive(Debug, Default)]
struct SeedCounts {
    users_created: usize,
    users_skipped: usize,
    exams_created: usize,
    exams_skipped: usize,
    questions_created: usize,
}

pub fn parse_seed(yaml: &str) -> anyhow::Result<SeedFile> {
    serde_yaml::from_str(yaml).context("invalid seed file")
}

/// Check every exam and question in the file before touching the database
pub fn validate_seed(seed: &SeedFile) -> anyhow::Result<()> {
    let mut problems = Vec::new();
    for seed_exam in &seed.exams {
        match validate_exam_with_questions(&seed_exam.exam, &seed_exam.questions) {
            Ok(_) => {}
            Err(ServiceError::Validation { field_errors, .. }) => {
                let mut fields: Vec<_> = field_errors.into_iter().collect();
                fields.sort();
                for (field, message) in fields {
                    problems.push(format!("'{}' {}: {}", seed_exam.exam.title.trim(), field, message));
                }
            }
            Err(e) => return Err(e.into()),
        }
    }
    if !problems.is_empty() {
        anyhow::bail!("invalid seed file:\n  {}", problems.join("\n  "));
    }
    Ok(())
}

/// Users are matched by username and exams by title; existing ones are
/// left untouched, so running the seed twice changes nothing.
pub async fn handle(file: PathBuf, output_format: OutputFormat) -> anyhow::Result<()> {
    let yaml = std::fs::read_to_string(&file).with_context(|| format!("failed to read {}", file.display()))?;
    let seed = parse_seed(&yaml)?;
    validate_seed(&seed)?;

    let pool = DatabaseManager::pool().await?;
    let users = UserService::new(pool.clone());
    let exams = ExamService::new(pool.clone());
    let mut counts = SeedCounts::default();

    for new_user in &seed.users {
        if users.find_by_username(new_user.username.trim()).await?.is_some() {
            counts.users_skipped += 1;
            continue;
        }
        users
            .create(new_user)
            .await
            .with_context(|| format!("failed to seed user '{}'", new_user.username))?;
        counts.users_created += 1;
    }

    for seed_exam in &seed.exams {
        let title = seed_exam.exam.title.trim();
        let existing: Option<(uuid::Uuid,)> = sqlx::query_as("SELECT id FROM exams WHERE title = $1")
            .bind(title)
            .fetch_optional(&pool)
            .await?;
        if existing.is_some() {
            counts.exams_skipped += 1;
            continue;
        }

        let (exam, questions) = exams
            .create_with_questions(&seed_exam.exam, &seed_exam.questions, None)
            .await
            .with_context(|| format!("failed to seed exam '{}'", title))?;
        counts.questions_created += questions.len();
        counts.exams_created += 1;
        info!(exam_id = %exam.id, title, questions = seed_exam.questions.len(), "seeded exam");
    }

    output_success(
        output_format,
        &format!(
            "Seeded {} users, {} exams, {} questions from {}",
            counts.users_created,
            counts.exams_created,
            counts.questions_created,
            file.display()
        ),
        Some(json!({
            "users_created": counts.users_created,
            "users_skipped": counts.users_skipped,
            "exams_created": counts.exams_created,
            "exams_skipped": counts.exams_skipped,
            "questions_created": counts.questions_created,
        })),
    )
}
