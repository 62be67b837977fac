use axum::{
    Extension, Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation::validate_id;
use super::{ApiError, ApiResponse, AppState, FollowResponse, LikeResponse};
use crate::services::SocialError;

impl From<SocialError> for ApiError {
    fn from(err: SocialError) -> Self {
        match err {
            SocialError::SelfFollow => Self::validation(err.to_string()),
            SocialError::Restricted => Self::forbidden(err.to_string()),
            SocialError::UserNotFound(_) | SocialError::PostNotFound(_) => {
                Self::NotFound(err.to_string())
            }
            SocialError::Database(msg) => Self::DatabaseError(msg),
            SocialError::Internal(msg) => Self::internal(msg),
        }
    }
}

/// Toggles a like. Not gated by reputation.
///
/// # Endpoint
/// `POST /api/posts/{id}/like`
pub async fn toggle_like(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(post_id): Path<i32>,
) -> Result<Json<ApiResponse<LikeResponse>>, ApiError> {
    let post_id = validate_id("post", post_id)?;
    let liked = state.social_service().toggle_like(user.id, post_id).await?;
    Ok(Json(ApiResponse::success(LikeResponse { liked })))
}

/// Toggles a follow. Restricted users can unfollow but not follow.
///
/// # Endpoint
/// `POST /api/users/{id}/follow`
pub async fn toggle_follow(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(target_id): Path<i32>,
) -> Result<Json<ApiResponse<FollowResponse>>, ApiError> {
    let target_id = validate_id("user", target_id)?;
    let following = state
        .social_service()
        .toggle_follow(user.id, target_id)
        .await?;
    Ok(Json(ApiResponse::success(FollowResponse { following })))
}
