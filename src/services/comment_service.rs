//! Domain service for comments.
//!
//! Every submission is scored by the bullying classifier and may lower the
//! author's reputation. Authors below the restriction threshold cannot
//! comment at all.

use serde::Serialize;
use thiserror::Error;

/// Errors specific to comment operations.
#[derive(Debug, Error)]
pub enum CommentError {
    #[error("Comment cannot be empty")]
    Empty,

    #[error("Comment cannot be longer than {0} characters")]
    TooLong(usize),

    #[error("Your account is restricted. You cannot comment on posts.")]
    Restricted,

    #[error("Post {0} not found")]
    PostNotFound(i32),

    #[error("User not found")]
    UserNotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for CommentError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for CommentError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A stored comment as shown under a post.
#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: i32,
    pub text: String,
    pub author: String,
    pub author_pic: String,
    pub created_at: String,
    pub bullying_detected: bool,
}

/// Response to a successful submission.
#[derive(Debug, Clone, Serialize)]
pub struct CommentSubmission {
    #[serde(flatten)]
    pub comment: CommentView,
    /// Author's score after this comment.
    pub user_reputation: f64,
    pub reputation_loss: f64,
    /// True when this comment moved the author from trusted to restricted.
    pub restricted: bool,
}

/// Domain service trait for comments.
#[async_trait::async_trait]
pub trait CommentService: Send + Sync {
    /// Scores and stores a comment, decaying the author's reputation if it
    /// is classified as bullying.
    ///
    /// # Errors
    ///
    /// Returns [`CommentError::Empty`] for blank text (checked before
    /// anything else), [`CommentError::Restricted`] if the author is
    /// restricted and [`CommentError::PostNotFound`] for unknown posts.
    async fn submit(
        &self,
        user_id: i32,
        post_id: i32,
        text: &str,
    ) -> Result<CommentSubmission, CommentError>;

    /// Comments on a post, oldest first.
    async fn list(&self, post_id: i32) -> Result<Vec<CommentView>, CommentError>;
}
