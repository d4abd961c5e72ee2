use anyhow::Context;
use clap::Subcommand;
use serde_json::json;

use crate::auth::{ROLE_ADMIN, ROLE_USER};
use crate::cli::{utils::output_success, OutputFormat};
use crate::database::DatabaseManager;
use crate::services::{NewUser, UserService};

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Create a user account")]
    Create {
        #[arg(long, help = "Username")]
        username: String,
        #[arg(long, help = "Password (at least 8 characters)")]
        password: String,
        #[arg(long, help = "Display name")]
        display_name: Option<String>,
        #[arg(long, help = "Grant the admin role")]
        admin: bool,
    },
}

pub async fn handle(cmd: UserCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        UserCommands::Create {
            username,
            password,
            display_name,
            admin,
        } => {
            let pool = DatabaseManager::pool().await?;
            let new_user = NewUser {
                username,
                password,
                display_name,
                role: Some(if admin { ROLE_ADMIN } else { ROLE_USER }.to_string()),
            };
            let user = UserService::new(pool)
                .create(&new_user)
                .await
                .with_context(|| format!("failed to create user '{}'", new_user.username))?;

            output_success(
                output_format,
                &format!("User '{}' created", user.username),
                Some(json!({ "id": user.id, "role": user.role })),
            )
        }
    }
}
