// handlers/protected/mod.rs - Protected handlers
//
// Route Prefix: /api/*
// Middleware: JWT validation + session validation (CurrentUser in extensions)
pub mod auth;
pub mod exams;
pub mod notifications;
pub mod results;
