// handlers/public/auth.rs - Token acquisition
use axum::{
    extract::ConnectInfo,
    http::HeaderMap,
    Json,
};
use serde::Deserialize;
use std::net::SocketAddr;

use crate::database::models::User;
use crate::fingerprint::DeviceInfo;
use crate::handlers;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{ClientContext, LoginOutcome, NewUser};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    /// Browser-reported device attributes, folded into the session fingerprint
    #[serde(default)]
    pub device: Option<DeviceInfo>,
}

/// POST /auth/register - create a plain user account
pub async fn register(Json(body): Json<RegisterRequest>) -> ApiResult<User> {
    let user = handlers::users()
        .await?
        .register(NewUser {
            username: body.username,
            password: body.password,
            display_name: body.display_name,
            role: None,
        })
        .await?;
    Ok(ApiResponse::created(user))
}

/// POST /auth/login - verify credentials, open a session and issue a token
///
/// ```json
/// { "username": "alice", "password": "...", "device": { "platform": "MacIntel" } }
/// ```
pub async fn login(
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<LoginOutcome> {
    let client = ClientContext::from_request(&headers, peer.map(|ConnectInfo(addr)| addr), body.device.as_ref());
    let outcome = handlers::users()
        .await?
        .login(&body.username, &body.password, &client)
        .await?;
    Ok(ApiResponse::success(outcome))
}
