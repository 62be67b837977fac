//! Domain service for the social graph: follows, likes, profiles and search.

use serde::Serialize;
use thiserror::Error;

use crate::services::post_service::PostView;

/// Errors specific to social graph operations.
#[derive(Debug, Error)]
pub enum SocialError {
    #[error("Cannot follow yourself")]
    SelfFollow,

    #[error("Your account is restricted. You cannot follow other users.")]
    Restricted,

    #[error("User {0} not found")]
    UserNotFound(String),

    #[error("Post {0} not found")]
    PostNotFound(i32),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for SocialError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for SocialError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Public card for a user in search results and suggestions.
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: i32,
    pub username: String,
    pub full_name: String,
    pub profile_pic: String,
}

impl From<crate::db::User> for UserSummary {
    fn from(user: crate::db::User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            full_name: user.full_name,
            profile_pic: user.profile_pic,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    pub id: i32,
    pub username: String,
    pub full_name: String,
    pub bio: String,
    pub profile_pic: String,
    pub reputation_score: f64,
    pub post_count: usize,
    pub follower_count: u64,
    pub following_count: u64,
    /// Whether the viewer follows this user. Always false on one's own profile.
    pub is_following: bool,
    pub posts: Vec<PostView>,
}

/// Domain service trait for the social graph.
#[async_trait::async_trait]
pub trait SocialService: Send + Sync {
    /// Follows `target_id` if not already following, otherwise unfollows.
    /// Returns whether the user now follows the target.
    ///
    /// # Errors
    ///
    /// Returns [`SocialError::SelfFollow`] when `user_id == target_id` and
    /// [`SocialError::Restricted`] when a restricted user tries to create a
    /// follow. Unfollowing is always allowed.
    async fn toggle_follow(&self, user_id: i32, target_id: i32) -> Result<bool, SocialError>;

    /// Likes the post if not already liked, otherwise removes the like.
    async fn toggle_like(&self, user_id: i32, post_id: i32) -> Result<bool, SocialError>;

    async fn profile(&self, viewer_id: i32, username: &str) -> Result<ProfileView, SocialError>;

    /// Users whose username or full name contains `query`.
    async fn search(&self, query: &str) -> Result<Vec<UserSummary>, SocialError>;
}
