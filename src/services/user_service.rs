use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::login_audit::{LoginAttempt, LoginAudit, LOCKED_OUT};
use super::session_service::{ClientContext, SessionService};
use super::{FieldErrors, ServiceError};
use crate::auth::{self, password, Claims, ROLE_ADMIN, ROLE_USER};
use crate::config;
use crate::database::models::User;
use crate::database::{Repository, SortOrder};

const INVALID_CREDENTIALS: &str = "Invalid username or password";

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub display_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub display_name: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct LoginOutcome {
    pub token: String,
    /// Seconds until the token expires
    pub expires_in: i64,
    pub session_id: Uuid,
    pub user: User,
}

pub struct UserService {
    pool: PgPool,
    audit: LoginAudit,
    sessions: SessionService,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            audit: LoginAudit::new(pool.clone()),
            sessions: SessionService::new(pool.clone()),
            pool,
        }
    }

    pub async fn create(&self, new_user: &NewUser) -> Result<User, ServiceError> {
        validate_new_user(new_user)?;
        let role = new_user.role.as_deref().unwrap_or(ROLE_USER);

        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (id, username, display_name, password_hash, role, is_active, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, TRUE, $6, $6)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(new_user.username.trim())
        .bind(&new_user.display_name)
        .bind(password::hash_password(&new_user.password))
        .bind(role)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match ServiceError::from(e) {
            ServiceError::Database(crate::database::DatabaseError::Conflict(_)) => {
                ServiceError::Conflict(format!("Username '{}' is already taken", new_user.username.trim()))
            }
            other => other,
        })?;

        info!(username = %user.username, role = %user.role, "user created");
        Ok(user)
    }

    /// Self-service registration always yields a plain user
    pub async fn register(&self, mut new_user: NewUser) -> Result<User, ServiceError> {
        if !config::config().api.allow_registration {
            return Err(ServiceError::Forbidden("Registration is disabled".to_string()));
        }
        new_user.role = None;
        self.create(&new_user).await
    }

    /// Verify credentials, open a session and issue its token. Every
    /// outcome is written to the login audit log.
    pub async fn login(&self, username: &str, plain: &str, client: &ClientContext) -> Result<LoginOutcome, ServiceError> {
        let username = username.trim();
        let security = &config::config().security;
        let mut attempt = LoginAttempt {
            username: username.to_string(),
            ip_address: client.ip_address.clone(),
            user_agent: client.user_agent.clone(),
            device_fingerprint: client.fingerprint.clone(),
            ..Default::default()
        };

        if security.login_max_failures > 0 {
            let window = Duration::minutes(security.login_failure_window_minutes as i64);
            let failures = self.audit.recent_failures(username, window).await?;
            if locked_out(failures, security.login_max_failures) {
                attempt.failure_reason = Some(LOCKED_OUT.to_string());
                self.audit.record(&attempt).await;
                return Err(ServiceError::TooManyRequests(
                    "Too many failed login attempts, try again later".to_string(),
                ));
            }
        }

        let user = match self.find_by_username(username).await? {
            Some(user) => user,
            None => {
                attempt.failure_reason = Some("unknown_user".to_string());
                self.audit.record(&attempt).await;
                return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
            }
        };
        attempt.user_id = Some(user.id);

        if !password::verify_password(plain, &user.password_hash) {
            attempt.failure_reason = Some("bad_password".to_string());
            self.audit.record(&attempt).await;
            return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        if !user.is_active {
            attempt.failure_reason = Some("inactive".to_string());
            self.audit.record(&attempt).await;
            return Err(ServiceError::Forbidden("Account is disabled".to_string()));
        }

        let session = self.sessions.open(user.id, client).await?;
        let claims = Claims::new(user.id, session.id, user.username.clone(), user.role.clone());
        let token = auth::generate_jwt(&claims)?;

        let user = sqlx::query_as::<_, User>("UPDATE users SET last_login_at = $2 WHERE id = $1 RETURNING *")
            .bind(user.id)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;

        attempt.success = true;
        self.audit.record(&attempt).await;

        Ok(LoginOutcome {
            token,
            expires_in: claims.exp - claims.iat,
            session_id: session.id,
            user,
        })
    }

    pub async fn find(&self, id: Uuid) -> Result<User, ServiceError> {
        Ok(Repository::<User>::new(self.pool.clone())?.select_404(id).await?)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, ServiceError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn list(&self, limit: i64) -> Result<Vec<User>, ServiceError> {
        Ok(Repository::<User>::new(self.pool.clone())?
            .select_all("created_at", SortOrder::Asc, limit.clamp(1, 1000))
            .await?)
    }

    /// Admin update. Deactivating a user revokes all of their sessions.
    pub async fn update(&self, id: Uuid, update: &UserUpdate) -> Result<User, ServiceError> {
        if let Some(role) = &update.role {
            check_role(role)?;
        }
        let current = self.find(id).await?;

        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET display_name = $2, role = $3, is_active = $4, updated_at = $5
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(update.display_name.as_ref().or(current.display_name.as_ref()))
        .bind(update.role.as_deref().unwrap_or(&current.role))
        .bind(update.is_active.unwrap_or(current.is_active))
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        if current.is_active && !user.is_active {
            self.sessions.revoke_all_for_user(id).await?;
        }
        Ok(user)
    }
}

fn check_role(role: &str) -> Result<(), ServiceError> {
    if role == ROLE_ADMIN || role == ROLE_USER {
        Ok(())
    } else {
        let mut errors = FieldErrors::default();
        errors.add("role", format!("must be '{}' or '{}'", ROLE_ADMIN, ROLE_USER));
        errors.into_result("Invalid user")
    }
}

fn validate_new_user(new_user: &NewUser) -> Result<(), ServiceError> {
    let username = new_user.username.trim();
    let mut errors = FieldErrors::default();
    errors.check(
        (3..=64).contains(&username.chars().count()),
        "username",
        "must be between 3 and 64 characters",
    );
    errors.check(
        username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')),
        "username",
        "may only contain letters, digits, '_', '.' and '-'",
    );
    errors.check(new_user.password.chars().count() >= 8, "password", "must be at least 8 characters");
    if let Some(role) = &new_user.role {
        errors.check(role == ROLE_ADMIN || role == ROLE_USER, "role", "must be 'admin' or 'user'");
    }
    errors.into_result("Invalid user")
}

/// Whether `failures` inside the window reach the threshold. A threshold
/// of 0 disables the lockout.
fn locked_out(failures: i64, max_failures: u32) -> bool {
    max_failures > 0 && failures >= i64::from(max_failures)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str, password: &str) -> NewUser {
        NewUser {
            username: username.into(),
            password: password.into(),
            display_name: None,
            role: None,
        }
    }

    fn field_errors(result: Result<(), ServiceError>) -> Vec<String> {
        match result {
            Err(ServiceError::Validation { field_errors, .. }) => {
                let mut fields: Vec<String> = field_errors.into_keys().collect();
                fields.sort();
                fields
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn accepts_reasonable_users() {
        assert!(validate_new_user(&new_user("alice.smith", "correct horse")).is_ok());
        assert!(validate_new_user(&new_user("  bob_1  ", "12345678")).is_ok());
    }

    #[test]
    fn rejects_bad_usernames_and_short_passwords() {
        assert_eq!(field_errors(validate_new_user(&new_user("al", "12345678"))), vec!["username"]);
        assert_eq!(field_errors(validate_new_user(&new_user("al ice", "12345678"))), vec!["username"]);
        assert_eq!(
            field_errors(validate_new_user(&new_user("x", "short"))),
            vec!["password", "username"]
        );
    }

    #[test]
    fn rejects_unknown_roles() {
        let mut user = new_user("carol", "12345678");
        user.role = Some("root".into());
        assert_eq!(field_errors(validate_new_user(&user)), vec!["role"]);
        assert!(check_role("admin").is_ok());
        assert!(check_role("superuser").is_err());
    }

    #[test]
    fn locks_out_at_the_threshold() {
        assert!(!locked_out(0, 5));
        assert!(!locked_out(4, 5));
        assert!(locked_out(5, 5));
        assert!(locked_out(6, 5));
        assert!(locked_out(1, 1));
    }

    #[test]
    fn zero_threshold_never_locks_out() {
        assert!(!locked_out(0, 0));
        assert!(!locked_out(1_000, 0));
    }
}
