// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Route Prefix: none (/, /health, /auth/*)
pub mod auth;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::{json, Value};

use crate::database::DatabaseManager;

/// GET / - service description
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Exam API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Exam management and auto-scoring backend",
            "endpoints": {
                "public": "/auth/register, /auth/login (token acquisition)",
                "auth": "/api/auth/whoami, /api/auth/sessions, /api/auth/session (protected)",
                "exams": "/api/exams[/:id[/answers|/result]] (protected)",
                "results": "/api/results (protected)",
                "notifications": "/api/notifications[/:id/read] (protected)",
                "admin": "/api/admin/* (admin role required)",
            }
        }
    }))
}

/// GET /health - reports 503 while the database is unreachable
pub async fn health() -> impl IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}
