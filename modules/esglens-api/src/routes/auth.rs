use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use bcrypt::{hash, verify, DEFAULT_COST};
use serde::Deserialize;

use crate::auth::api_key::generate_api_key;
use crate::auth::RequireAuth;
use crate::error::ApiError;
use crate::AppState;

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    username: String,
    email: String,
    password: String,
}

/// Create a user. The response never carries the password in any form.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let username = request.username.trim();
    if username.len() < 3 {
        return Err(ApiError::BadRequest("username must be at least 3 characters".into()));
    }
    if !request.email.contains('@') {
        return Err(ApiError::BadRequest("email is not valid".into()));
    }
    if request.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let hashed = hash(&request.password, DEFAULT_COST)
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))?;

    let user = state
        .auth_store
        .create_user(username, request.email.trim(), &hashed)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "id": user.id,
            "username": user.username,
            "email": user.email,
        })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    username: String,
    password: String,
}

/// Issue a bearer token for valid credentials.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = state
        .auth_store
        .user_by_username(request.username.trim())
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| ApiError::Unauthorized("invalid credentials".into()))?;

    let valid = verify(&request.password, &user.hashed_password)
        .map_err(|e| ApiError::Internal(format!("password verification failed: {e}")))?;
    if !valid {
        return Err(ApiError::Unauthorized("invalid credentials".into()));
    }

    let token = state
        .jwt
        .create_token(user.id, &user.username, user.is_admin)
        .map_err(|e| ApiError::Internal(format!("token creation failed: {e}")))?;

    Ok(Json(serde_json::json!({
        "access_token": token,
        "token_type": "bearer",
        "expires_in": state.jwt.ttl_secs(),
    })))
}

#[derive(Debug, Deserialize)]
pub struct CreateKeyRequest {
    name: String,
    #[serde(default)]
    scopes: Vec<String>,
}

/// Mint an API key for the authenticated user. The full key appears in this
/// response and nowhere else, ever.
pub async fn create_api_key(
    State(state): State<Arc<AppState>>,
    RequireAuth(principal): RequireAuth,
    Json(request): Json<CreateKeyRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let user_id = match principal {
        crate::auth::Principal::User { id, .. } => id,
        crate::auth::Principal::ApiKey { .. } => {
            return Err(ApiError::Forbidden("API keys cannot mint API keys".into()));
        }
    };

    if request.name.trim().is_empty() {
        return Err(ApiError::BadRequest("key name is required".into()));
    }

    let (full_key, key_hash, key_prefix) = generate_api_key();
    let id = state
        .auth_store
        .create_api_key(user_id, &key_hash, &key_prefix, request.name.trim(), &request.scopes, None)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "id": id,
            "name": request.name.trim(),
            "key": full_key,
            "key_prefix": key_prefix,
            "note": "store this key now; it is not shown again",
        })),
    ))
}
