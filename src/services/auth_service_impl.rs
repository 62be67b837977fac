//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::config::{SecurityConfig, UploadConfig};
use crate::db::{NewUser, ProfileUpdate, Store};
use crate::moderation::ReputationPolicy;
use crate::services::auth_service::{
    AuthError, AuthService, Registration, SettingsUpdate, UserInfo,
};
use crate::services::image::{ImageService, ImageType};

pub struct SeaOrmAuthService {
    store: Store,
    images: Arc<ImageService>,
    policy: ReputationPolicy,
    security: SecurityConfig,
    default_profile_pic: String,
}

impl SeaOrmAuthService {
    #[must_use]
    pub fn new(
        store: Store,
        images: Arc<ImageService>,
        policy: ReputationPolicy,
        security: SecurityConfig,
        uploads: &UploadConfig,
    ) -> Self {
        Self {
            store,
            images,
            policy,
            security,
            default_profile_pic: uploads.default_profile_pic.clone(),
        }
    }

    fn info(&self, user: crate::db::User) -> UserInfo {
        let state = self.policy.state(user.reputation_score);
        UserInfo::new(user, state)
    }
}

fn required(value: &str, field: &str) -> Result<String, AuthError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AuthError::Validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(&self, registration: Registration) -> Result<UserInfo, AuthError> {
        let username = required(&registration.username, "Username")?;
        let email = required(&registration.email, "Email")?;
        let full_name = required(&registration.full_name, "Full name")?;

        if registration.password.len() < self.security.min_password_length {
            return Err(AuthError::Validation(format!(
                "Password must be at least {} characters",
                self.security.min_password_length
            )));
        }

        let users = self.store.user_repo();
        if users.username_exists(&username).await? {
            return Err(AuthError::UsernameTaken);
        }
        if users.email_exists(&email, None).await? {
            return Err(AuthError::EmailTaken);
        }

        let user = users
            .create(
                NewUser {
                    username,
                    email,
                    password: registration.password,
                    full_name,
                    profile_pic: self.default_profile_pic.clone(),
                    reputation_score: self.policy.initial,
                },
                &self.security,
            )
            .await?;

        info!(user_id = user.id, username = %user.username, "User registered");
        metrics::counter!("gramguard_users_registered_total").increment(1);

        Ok(self.info(user))
    }

    async fn login(&self, username: &str, password: &str) -> Result<UserInfo, AuthError> {
        let user = self
            .store
            .user_repo()
            .verify_password(username, password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        Ok(self.info(user))
    }

    async fn get_user(&self, user_id: i32) -> Result<UserInfo, AuthError> {
        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok(self.info(user))
    }

    async fn update_settings(
        &self,
        user_id: i32,
        update: SettingsUpdate,
    ) -> Result<UserInfo, AuthError> {
        let users = self.store.user_repo();

        let email = match update.email {
            Some(email) => {
                let email = required(&email, "Email")?;
                if users.email_exists(&email, Some(user_id)).await? {
                    return Err(AuthError::EmailTaken);
                }
                Some(email)
            }
            None => None,
        };

        let profile_pic = match update.profile_pic {
            Some((name, bytes)) if !name.is_empty() && !bytes.is_empty() => Some(
                self.images
                    .save_upload(&name, &bytes, ImageType::ProfilePicture)
                    .await?,
            ),
            _ => None,
        };

        let user = users
            .update_profile(
                user_id,
                ProfileUpdate {
                    full_name: update.full_name.map(|s| s.trim().to_string()),
                    bio: update.bio,
                    email,
                    profile_pic,
                },
            )
            .await?
            .ok_or(AuthError::UserNotFound)?;

        info!(user_id, "Profile updated");
        Ok(self.info(user))
    }
}
