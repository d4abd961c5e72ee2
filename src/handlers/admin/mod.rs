// handlers/admin/mod.rs - Administrative handlers
//
// Route Prefix: /api/admin/*
// Middleware: protected tier + admin role check
pub mod audit;
pub mod exams;
pub mod notifications;
pub mod questions;
pub mod results;
pub mod users;

use serde::Deserialize;

/// `?limit=` for admin listings
#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}
