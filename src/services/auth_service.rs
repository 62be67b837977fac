//! Domain service for accounts.
//!
//! Handles registration, login and profile settings. Sessions themselves
//! live in the web layer; this service only resolves credentials to users.

use serde::Serialize;
use thiserror::Error;

use crate::db::User;
use crate::moderation::ReputationState;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Username already exists")]
    UsernameTaken,

    #[error("Email already exists")]
    EmailTaken,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// User info DTO for responses.
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub bio: String,
    pub profile_pic: String,
    pub reputation_score: f64,
    pub reputation_state: ReputationState,
    pub created_at: String,
}

impl UserInfo {
    #[must_use]
    pub fn new(user: User, state: ReputationState) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            bio: user.bio,
            profile_pic: user.profile_pic,
            reputation_score: user.reputation_score,
            reputation_state: state,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
}

/// Settings form. Absent fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct SettingsUpdate {
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub email: Option<String>,
    /// Original filename and contents of a new profile picture.
    pub profile_pic: Option<(String, Vec<u8>)>,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates an account with the initial reputation score.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UsernameTaken`] or [`AuthError::EmailTaken`] on
    /// duplicates and [`AuthError::Validation`] on empty fields.
    async fn register(&self, registration: Registration) -> Result<UserInfo, AuthError>;

    /// Verifies credentials and returns the user.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] if login fails.
    async fn login(&self, username: &str, password: &str) -> Result<UserInfo, AuthError>;

    /// Gets information for a specific user.
    async fn get_user(&self, user_id: i32) -> Result<UserInfo, AuthError>;

    /// Applies the settings form to the user's profile.
    async fn update_settings(
        &self,
        user_id: i32,
        update: SettingsUpdate,
    ) -> Result<UserInfo, AuthError>;
}
