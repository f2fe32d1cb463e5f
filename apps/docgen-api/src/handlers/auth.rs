//! Login and current-user endpoints

use std::sync::Arc;

use axum::{extract::State, Json};
use chrono::Utc;
use shared_types::{AuditAction, User};

use crate::audit::{self, AuditEvent};
use crate::auth::{issue_token, verify_password, AuthUser, ClientInfo};
use crate::error::ApiError;
use crate::models::{ApiResponse, LoginRequest, LoginResponse};
use crate::state::AppState;
use crate::users;

/// Handler: POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    client: ClientInfo,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    let email = req.email.trim();
    if email.is_empty() || req.password.is_empty() {
        return Err(ApiError::InvalidRequest(
            "Email and password are required".to_string(),
        ));
    }

    let row = users::find_user_by_email(&state.db, email)
        .await?
        .filter(|row| verify_password(&req.password, &row.password_hash))
        .ok_or(ApiError::InvalidCredentials)?;

    let user: User = row.into();
    let token = issue_token(user.id, Utc::now().timestamp());

    audit::record(
        &state.db,
        &client,
        AuditEvent::new(AuditAction::UserLogin, user.id, format!("{} logged in", user.email)),
    )
    .await;
    tracing::info!("User {} logged in as {}", user.email, user.role);

    Ok(ApiResponse::ok(LoginResponse { token, user }))
}

/// Handler: GET /api/auth/me
pub async fn me(AuthUser(user): AuthUser) -> Json<ApiResponse<User>> {
    ApiResponse::ok(user)
}
