//! Domain service for posts: uploads, feed, explore and post detail.

use serde::Serialize;
use thiserror::Error;

use crate::services::social_service::UserSummary;

/// Errors specific to post operations.
#[derive(Debug, Error)]
pub enum PostError {
    #[error("No file selected")]
    NoFile,

    #[error("Post {0} not found")]
    NotFound(i32),

    #[error("User not found")]
    UserNotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for PostError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for PostError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PostAuthor {
    pub id: i32,
    pub username: String,
    pub profile_pic: String,
}

/// A post with its author and engagement counts, as seen by one viewer.
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub id: i32,
    pub image: String,
    pub caption: String,
    pub created_at: String,
    pub author: Option<PostAuthor>,
    pub like_count: i64,
    pub comment_count: i64,
    pub liked: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Feed {
    pub posts: Vec<PostView>,
    pub suggestions: Vec<UserSummary>,
}

/// An uploaded file as received from the client.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Domain service trait for posts.
#[async_trait::async_trait]
pub trait PostService: Send + Sync {
    /// Stores the image and creates a post.
    ///
    /// # Errors
    ///
    /// Returns [`PostError::NoFile`] when no file or an unnamed file was sent.
    async fn create(
        &self,
        user_id: i32,
        image: Option<ImageUpload>,
        caption: &str,
    ) -> Result<PostView, PostError>;

    async fn get(&self, viewer_id: i32, post_id: i32) -> Result<PostView, PostError>;

    /// Own and followed users' posts, newest first, plus follow suggestions.
    async fn feed(&self, viewer_id: i32) -> Result<Feed, PostError>;

    /// Random posts by users the viewer does not follow, falling back to
    /// random posts overall when there are none.
    async fn explore(&self, viewer_id: i32) -> Result<Vec<PostView>, PostError>;
}
