use axum::{
    Extension, Json,
    extract::{Request, State},
    middleware::Next,
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::validation::{validate_email, validate_username};
use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::services::{AuthError, Registration, UserInfo};

pub const SESSION_USER_KEY: &str = "user_id";

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials | AuthError::UserNotFound => {
                Self::unauthorized(err.to_string())
            }
            AuthError::UsernameTaken | AuthError::EmailTaken => Self::validation(err.to_string()),
            AuthError::Validation(msg) => Self::validation(msg),
            AuthError::Database(msg) => Self::DatabaseError(msg),
            AuthError::Internal(msg) => Self::internal(msg),
        }
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub full_name: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// The authenticated user, resolved by [`auth_middleware`] on every
/// protected request.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub id: i32,
    pub username: String,
}

// ============================================================================
// Middleware
// ============================================================================

/// Requires a session whose user still exists. A session pointing at a
/// deleted user is flushed.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = session
        .get::<i32>(SESSION_USER_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?
        .ok_or_else(|| ApiError::unauthorized("Not logged in"))?;

    let Some(user) = state.store().get_user(user_id).await? else {
        let _ = session.flush().await;
        return Err(ApiError::unauthorized(
            "Session expired. Please log in again.",
        ));
    };

    tracing::Span::current().record("user_id", user.id);
    request.extensions_mut().insert(CurrentUser {
        id: user.id,
        username: user.username,
    });

    Ok(next.run(request).await)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<UserInfo>>, ApiError> {
    let username = validate_username(&payload.username)?.to_string();
    let email = validate_email(&payload.email)?.to_string();
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let user = state
        .auth_service()
        .register(Registration {
            username,
            email,
            password: payload.password,
            full_name: payload.full_name,
        })
        .await?;

    Ok(Json(ApiResponse::success(user)))
}

/// POST /auth/login
/// Stores the user id in the session on success
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<UserInfo>>, ApiError> {
    if payload.username.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let user = state
        .auth_service()
        .login(&payload.username, &payload.password)
        .await?;

    session
        .cycle_id()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;
    session
        .insert(SESSION_USER_KEY, user.id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    tracing::info!(user_id = user.id, "User logged in");

    Ok(Json(ApiResponse::success(user)))
}

/// POST /auth/logout
/// Invalidate the current session
pub async fn logout(session: Session) -> Json<ApiResponse<MessageResponse>> {
    let _ = session.flush().await;
    Json(ApiResponse::success(MessageResponse {
        message: "Logged out successfully".to_string(),
    }))
}

/// GET /auth/me
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<UserInfo>>, ApiError> {
    let info = state.auth_service().get_user(user.id).await?;
    Ok(Json(ApiResponse::success(info)))
}
