use std::sync::Arc;

use axum::{extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::{
    ApiError, AppJson, AppState,
    auth::{Claims, hash_password, verify_password},
    state::PublicUser,
};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: PublicUser,
}

fn email_registered() -> ApiError {
    ApiError::BadRequest("Email already registered".to_string())
}

fn invalid_credentials() -> ApiError {
    ApiError::Unauthorized("Invalid credentials".to_string())
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    AppJson(body): AppJson<RegisterRequest>,
) -> Result<(StatusCode, AppJson<MessageResponse>), ApiError> {
    let email = body.email.trim().to_string();
    if email.is_empty() || body.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }

    if state.db.read().await.email_taken(&email) {
        return Err(email_registered());
    }

    let password = body.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(ApiError::internal)?
        .map_err(ApiError::internal)?;

    // Checked again under the write lock; a concurrent registration may
    // have won while hashing.
    let user = state
        .db
        .write()
        .await
        .insert_user(email, password_hash, body.name)
        .ok_or_else(email_registered)?;

    tracing::info!(user_id = user.id, "user_registered");
    Ok((
        StatusCode::CREATED,
        AppJson(MessageResponse::new("User created successfully")),
    ))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    AppJson(body): AppJson<LoginRequest>,
) -> Result<AppJson<LoginResponse>, ApiError> {
    let user = state
        .db
        .read()
        .await
        .user_by_email(body.email.trim())
        .cloned()
        .ok_or_else(invalid_credentials)?;

    let password = body.password;
    let hash = user.password_hash.clone();
    let valid = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(ApiError::internal)?;

    if !valid {
        tracing::info!(user_id = user.id, "login_rejected");
        return Err(invalid_credentials());
    }

    let claims = Claims::new(user.id, &user.email, chrono::Utc::now().timestamp());
    let token = state.keys.sign(&claims).map_err(ApiError::internal)?;

    Ok(AppJson(LoginResponse {
        token,
        user: PublicUser::from(&user),
    }))
}
