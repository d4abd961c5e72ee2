use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

/// Development-only signing secret. Never used when APP_ENV=production.
const DEV_JWT_SECRET: &str = "exam-api-development-secret";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub scoring: ScoringConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub max_request_size_bytes: usize,
    pub allow_registration: bool,
    /// Show per-question correctness in the submit response
    pub reveal_correctness: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    /// Sessions unused for longer than this are rejected. 0 disables the check.
    pub session_idle_minutes: u64,
    pub login_max_failures: u32,
    pub login_failure_window_minutes: u64,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub multiple_choice_partial_credit: bool,
    pub case_sensitive_text: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_ACQUIRE_TIMEOUT_SECS") {
            self.database.acquire_timeout_secs = v.parse().unwrap_or(self.database.acquire_timeout_secs);
        }
        if let Ok(v) = env::var("DATABASE_RUN_MIGRATIONS") {
            self.database.run_migrations = v.parse().unwrap_or(self.database.run_migrations);
        }

        // API overrides
        if let Some(port) = env::var("EXAM_API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse().ok())
        {
            self.api.port = port;
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }
        if let Ok(v) = env::var("API_ALLOW_REGISTRATION") {
            self.api.allow_registration = v.parse().unwrap_or(self.api.allow_registration);
        }
        if let Ok(v) = env::var("API_REVEAL_CORRECTNESS") {
            self.api.reveal_correctness = v.parse().unwrap_or(self.api.reveal_correctness);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_SESSION_IDLE_MINUTES") {
            self.security.session_idle_minutes = v.parse().unwrap_or(self.security.session_idle_minutes);
        }
        if let Ok(v) = env::var("SECURITY_LOGIN_MAX_FAILURES") {
            self.security.login_max_failures = v.parse().unwrap_or(self.security.login_max_failures);
        }
        if let Ok(v) = env::var("SECURITY_LOGIN_FAILURE_WINDOW_MINUTES") {
            self.security.login_failure_window_minutes =
                v.parse().unwrap_or(self.security.login_failure_window_minutes);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Scoring overrides
        if let Ok(v) = env::var("SCORING_MULTIPLE_CHOICE_PARTIAL_CREDIT") {
            self.scoring.multiple_choice_partial_credit =
                v.parse().unwrap_or(self.scoring.multiple_choice_partial_credit);
        }
        if let Ok(v) = env::var("SCORING_CASE_SENSITIVE_TEXT") {
            self.scoring.case_sensitive_text = v.parse().unwrap_or(self.scoring.case_sensitive_text);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                acquire_timeout_secs: 5,
                run_migrations: true,
            },
            api: ApiConfig {
                port: 3000,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
                allow_registration: true,
                reveal_correctness: true,
            },
            security: SecurityConfig {
                jwt_secret: DEV_JWT_SECRET.to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                session_idle_minutes: 0,
                login_max_failures: 10,
                login_failure_window_minutes: 15,
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ],
            },
            scoring: ScoringConfig::default(),
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                acquire_timeout_secs: 5,
                run_migrations: true,
            },
            api: ApiConfig {
                port: 3000,
                max_request_size_bytes: 1024 * 1024, // 1MB
                allow_registration: true,
                reveal_correctness: false,
            },
            security: SecurityConfig {
                jwt_secret: DEV_JWT_SECRET.to_string(),
                jwt_expiry_hours: 24,
                session_idle_minutes: 120,
                login_max_failures: 5,
                login_failure_window_minutes: 15,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
            scoring: ScoringConfig::default(),
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                acquire_timeout_secs: 3,
                run_migrations: false,
            },
            api: ApiConfig {
                port: 3000,
                max_request_size_bytes: 512 * 1024, // 512KB
                allow_registration: false,
                reveal_correctness: false,
            },
            security: SecurityConfig {
                // Must be supplied through JWT_SECRET
                jwt_secret: String::new(),
                jwt_expiry_hours: 8,
                session_idle_minutes: 60,
                login_max_failures: 5,
                login_failure_window_minutes: 30,
                cors_origins: vec!["https://exams.example.com".to_string()],
            },
            scoring: ScoringConfig::default(),
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            multiple_choice_partial_credit: false,
            case_sensitive_text: false,
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert!(config.api.allow_registration);
        assert!(!config.security.jwt_secret.is_empty());
        assert_eq!(config.security.session_idle_minutes, 0);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(config.security.jwt_secret.is_empty());
        assert!(!config.api.allow_registration);
        assert!(!config.api.reveal_correctness);
        assert!(!config.database.run_migrations);
    }

    #[test]
    fn test_scoring_defaults_are_strict() {
        let scoring = ScoringConfig::default();
        assert!(!scoring.multiple_choice_partial_credit);
        assert!(!scoring.case_sensitive_text);
    }
}
