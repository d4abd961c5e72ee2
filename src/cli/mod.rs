pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "examctl")]
#[command(about = "examctl - operator CLI for the Exam API database")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Apply pending database migrations")]
    Migrate,

    #[command(about = "Load users, exams and questions from a YAML fixture (idempotent)")]
    Seed {
        #[arg(long, help = "Fixture file", default_value = "fixtures/demo.yaml")]
        file: PathBuf,
    },

    #[command(about = "User management")]
    User {
        #[command(subcommand)]
        cmd: commands::user::UserCommands,
    },

    #[command(about = "Rescore every stored answer of an exam against its current keys")]
    Rescore {
        #[arg(help = "Exam id")]
        exam_id: Uuid,
        #[arg(long, help = "Log notifications instead of storing them")]
        log_notifications: bool,
    },

    #[command(about = "Print the device fingerprint for a set of device attributes")]
    Fingerprint(commands::fingerprint::FingerprintArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Migrate => commands::migrate::handle(output_format).await,
        Commands::Seed { file } => commands::seed::handle(file, output_format).await,
        Commands::User { cmd } => commands::user::handle(cmd, output_format).await,
        Commands::Rescore {
            exam_id,
            log_notifications,
        } => commands::rescore::handle(exam_id, log_notifications, output_format).await,
        Commands::Fingerprint(args) => commands::fingerprint::handle(args, output_format),
    }
}
