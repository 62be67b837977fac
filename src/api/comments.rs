//! Comment endpoints. Submissions are scored for bullying before they are
//! stored; see [`CommentService`](crate::services::CommentService).

use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation::validate_id;
use super::{ApiError, ApiResponse, AppState, CommentRequest};
use crate::services::{CommentError, CommentSubmission, CommentView};

impl From<CommentError> for ApiError {
    fn from(err: CommentError) -> Self {
        match err {
            CommentError::Empty | CommentError::TooLong(_) => Self::validation(err.to_string()),
            CommentError::Restricted => Self::forbidden(err.to_string()),
            CommentError::PostNotFound(_) => Self::NotFound(err.to_string()),
            CommentError::UserNotFound => Self::unauthorized(err.to_string()),
            CommentError::Database(msg) => Self::DatabaseError(msg),
            CommentError::Internal(msg) => Self::internal(msg),
        }
    }
}

/// Submits a comment.
///
/// # Endpoint
/// `POST /api/posts/{id}/comments`
///
/// Blank comments are rejected with 400 before the reputation gate is
/// checked, so a restricted user sending an empty comment gets 400, not 403.
pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(post_id): Path<i32>,
    payload: Result<Json<CommentRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<CommentSubmission>>, ApiError> {
    let post_id = validate_id("post", post_id)?;
    let Json(payload) = payload.map_err(|_| ApiError::validation("No data provided"))?;

    let submission = state
        .comment_service()
        .submit(user.id, post_id, &payload.comment)
        .await?;

    Ok(Json(ApiResponse::success(submission)))
}

/// `GET /api/posts/{id}/comments`
pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<i32>,
) -> Result<Json<ApiResponse<Vec<CommentView>>>, ApiError> {
    let post_id = validate_id("post", post_id)?;
    let comments = state.comment_service().list(post_id).await?;
    Ok(Json(ApiResponse::success(comments)))
}
