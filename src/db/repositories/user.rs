use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use tokio::task;

use crate::config::SecurityConfig;
use crate::entities::{prelude::*, users};

/// User data returned from repository (without sensitive password hash)
#[derive(Debug, Clone)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub bio: String,
    pub profile_pic: String,
    pub reputation_score: f64,
    pub created_at: String,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            full_name: model.full_name,
            bio: model.bio,
            profile_pic: model.profile_pic,
            reputation_score: model.reputation_score,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub profile_pic: String,
    pub reputation_score: f64,
}

/// Profile fields editable from settings. `None` leaves the column as is.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub email: Option<String>,
    pub profile_pic: Option<String>,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert a user, hashing the password on the blocking pool.
    pub async fn create(&self, new_user: NewUser, security: &SecurityConfig) -> Result<User> {
        let password = new_user.password;
        let config = security.clone();
        let password_hash = task::spawn_blocking(move || hash_password(&password, Some(&config)))
            .await
            .context("Password hashing task panicked")??;

        let active = users::ActiveModel {
            username: Set(new_user.username),
            email: Set(new_user.email),
            password_hash: Set(password_hash),
            full_name: Set(new_user.full_name),
            bio: Set(String::new()),
            profile_pic: Set(new_user.profile_pic),
            reputation_score: Set(new_user.reputation_score),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert user")?;

        Ok(User::from(model))
    }

    /// Get user by username
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = Users::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")?;

        Ok(user.map(User::from))
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> Result<Option<User>> {
        let user = Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    pub async fn get_by_ids(&self, ids: &[i32]) -> Result<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = Users::find()
            .filter(users::Column::Id.is_in(ids.iter().copied()))
            .all(&self.conn)
            .await
            .context("Failed to query users by ID")?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        Ok(self.get_by_username(username).await?.is_some())
    }

    /// True if another user (not `except_id`) already uses this email.
    pub async fn email_exists(&self, email: &str, except_id: Option<i32>) -> Result<bool> {
        let mut query = Users::find().filter(users::Column::Email.eq(email));
        if let Some(id) = except_id {
            query = query.filter(users::Column::Id.ne(id));
        }

        let user = query
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        Ok(user.is_some())
    }

    /// Verify password for a user, returning the user on success.
    /// Note: This uses `spawn_blocking` because Argon2 hashing is CPU-intensive
    /// and would block the async runtime if run directly.
    pub async fn verify_password(&self, username: &str, password: &str) -> Result<Option<User>> {
        let user = Users::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?;

        let Some(user) = user else {
            return Ok(None);
        };

        let password_hash = user.password_hash.clone();
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

            Ok::<bool, anyhow::Error>(
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")??;

        Ok(is_valid.then(|| User::from(user)))
    }

    /// Users whose username or full name contains `query`.
    pub async fn search(&self, query: &str, limit: u64) -> Result<Vec<User>> {
        let rows = Users::find()
            .filter(
                Condition::any()
                    .add(users::Column::Username.contains(query))
                    .add(users::Column::FullName.contains(query)),
            )
            .order_by_asc(users::Column::Username)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to search users")?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    /// First `limit` users that are neither `user_id` nor in `exclude`.
    pub async fn list_excluding(&self, user_id: i32, exclude: &[i32], limit: u64) -> Result<Vec<User>> {
        let rows = Users::find()
            .filter(users::Column::Id.ne(user_id))
            .filter(users::Column::Id.is_not_in(exclude.iter().copied()))
            .order_by_asc(users::Column::Id)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to list users")?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    pub async fn update_profile(&self, id: i32, update: ProfileUpdate) -> Result<Option<User>> {
        let Some(user) = Users::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = user.into();
        if let Some(full_name) = update.full_name {
            active.full_name = Set(full_name);
        }
        if let Some(bio) = update.bio {
            active.bio = Set(bio);
        }
        if let Some(email) = update.email {
            active.email = Set(email);
        }
        if let Some(profile_pic) = update.profile_pic {
            active.profile_pic = Set(profile_pic);
        }

        let model = active
            .update(&self.conn)
            .await
            .context("Failed to update profile")?;

        Ok(Some(User::from(model)))
    }

    /// Overwrite a user's reputation. Only the operator CLI calls this;
    /// comments go through the atomic decrement in the comment repository.
    pub async fn set_reputation_score(&self, username: &str, score: f64) -> Result<Option<User>> {
        let Some(user) = Users::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user for reputation update")?
        else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = user.into();
        active.reputation_score = Set(score.max(0.0));
        let model = active.update(&self.conn).await?;

        Ok(Some(User::from(model)))
    }
}

/// Hash a password using Argon2id with optional custom params.
/// If config is None, uses the crate's default params.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}
