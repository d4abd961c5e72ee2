pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod fingerprint;
pub mod handlers;
pub mod middleware;
pub mod scoring;
pub mod services;

use axum::{
    http::HeaderValue,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use handlers::{admin, protected, public};

/// The full HTTP application with its three route tiers
pub fn app() -> Router {
    let config = config::config();

    Router::new()
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .merge(public_auth_routes())
        .merge(protected_routes())
        .layer(RequestBodyLimitLayer::new(config.api.max_request_size_bytes))
        .layer(cors_layer(&config.security.cors_origins))
        .layer(TraceLayer::new_for_http())
}

fn public_auth_routes() -> Router {
    use public::auth;

    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
}

/// `/api/*`: JWT first, then session validation. Layers run outermost-last,
/// so the JWT check is added after the session check.
fn protected_routes() -> Router {
    use protected::{auth, exams, notifications, results};

    Router::new()
        .route("/api/auth/whoami", get(auth::whoami))
        .route("/api/auth/sessions", get(auth::sessions))
        .route("/api/auth/session", axum::routing::delete(auth::logout))
        .route("/api/exams", get(exams::list))
        .route("/api/exams/:id", get(exams::get))
        .route("/api/exams/:id/answers", post(exams::submit))
        .route("/api/exams/:id/result", get(results::exam_result))
        .route("/api/results", get(results::my_results))
        .route("/api/notifications", get(notifications::list))
        .route("/api/notifications/:id/read", put(notifications::mark_read))
        .merge(admin_routes())
        .route_layer(axum::middleware::from_fn(middleware::validate_session_middleware))
        .route_layer(axum::middleware::from_fn(middleware::jwt_auth_middleware))
}

fn admin_routes() -> Router {
    use admin::{audit, exams, notifications, questions, results, users};

    Router::new()
        .route("/api/admin/exams", get(exams::list).post(exams::create))
        .route(
            "/api/admin/exams/:id",
            get(exams::get).put(exams::update).delete(exams::delete),
        )
        .route(
            "/api/admin/exams/:id/questions",
            get(questions::list).post(questions::create),
        )
        .route(
            "/api/admin/questions/:id",
            put(questions::update).delete(questions::delete),
        )
        .route("/api/admin/exams/:id/results", get(results::exam_results))
        .route("/api/admin/exams/:id/stats", get(results::exam_stats))
        .route("/api/admin/exams/:id/rescore", post(results::rescore))
        .route("/api/admin/login-logs", get(audit::login_logs))
        .route("/api/admin/sessions", get(audit::sessions))
        .route("/api/admin/sessions/:id", axum::routing::delete(audit::revoke_session))
        .route("/api/admin/users", get(users::list))
        .route("/api/admin/users/:id", put(users::update))
        .route("/api/admin/notifications", post(notifications::send))
        .route_layer(axum::middleware::from_fn(middleware::require_admin_middleware))
}

/// `*` (or no origins) allows any origin
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", o);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
