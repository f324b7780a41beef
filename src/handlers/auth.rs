//! Authentication HTTP handlers
//!
//! Thin adapters between the JSON API and [`crate::auth::AuthService`].

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::auth::TokenPair;
use crate::error::ApiError;
use crate::middleware::{AdminUser, AuthenticatedUser};
use crate::models::{
    AuthTokensResponse, LoginRequest, RefreshTokenRequest, RegisterRequest, UserResponse,
};
use crate::state::AppState;

fn tokens_response(state: &AppState, pair: TokenPair) -> AuthTokensResponse {
    AuthTokensResponse {
        token_type: "bearer".to_string(),
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        expires_in: state.auth_service.tokens().access_token_ttl().num_seconds(),
    }
}

/// POST /auth/register - Create a buyer account
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    req.validate()?;

    let user = state.auth_service.register(req).await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// POST /auth/token - Exchange username and password for a token pair
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthTokensResponse>, ApiError> {
    let pair = state
        .auth_service
        .login(&req.username, &req.password)
        .await?;

    Ok(Json(tokens_response(&state, pair)))
}

/// POST /auth/refresh - Rotate the refresh token
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(req): Json<RefreshTokenRequest>,
) -> Result<Json<AuthTokensResponse>, ApiError> {
    let pair = state.auth_service.refresh(&req.refresh_token).await?;

    Ok(Json(tokens_response(&state, pair)))
}

/// GET /auth/me - Get current authenticated user
pub async fn get_current_user(AuthenticatedUser(user): AuthenticatedUser) -> Json<UserResponse> {
    Json(user.into())
}

/// POST /auth/logout - End the current session
pub async fn logout(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<StatusCode, ApiError> {
    state.auth_service.logout(&user).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /admin/users/:username - Look up any account (admin only)
pub async fn get_user(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(username): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .auth_service
        .find_user(&username)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User '{}'", username)))?;

    Ok(Json(user.into()))
}

/// GET /health - Store connectivity check
pub async fn health_check(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.auth_service.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Health check failed");
        ApiError::ServiceUnavailable("User store unreachable".to_string())
    })?;

    Ok(StatusCode::OK)
}
