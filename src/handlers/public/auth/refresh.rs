// handlers/public/auth/refresh.rs - POST /auth/refresh

use axum::extract::State;
use serde::Deserialize;

use super::TokenResponse;
use crate::auth::{generate_jwt, validate_jwt};
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub token: Option<String>,
}

/// POST /auth/refresh - exchange a token (expired within the grace window)
/// for a fresh one. The user must still exist.
pub async fn refresh_post(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RefreshRequest>,
) -> ApiResult<TokenResponse> {
    let token = payload
        .token
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::field("token", "token is required"))?;

    let claims = validate_jwt(token.trim(), true)?;

    let user = state
        .storage
        .get_user(claims.sub)
        .await?
        .ok_or_else(|| ApiError::unauthorized("User no longer exists"))?;

    let (token, expires_in) = generate_jwt(&user)?;
    tracing::debug!("Refreshed token for user {}", user.id);

    Ok(ApiResponse::success(TokenResponse { token, expires_in, user }))
}
