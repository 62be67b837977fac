use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, sea_query::Expr,
};
use tracing::info;

use crate::entities::{posts, prelude::*};

pub use crate::entities::posts::Model as PostRow;

/// Repository for post operations
pub struct PostRepository {
    conn: DatabaseConnection,
}

impl PostRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, user_id: i32, image: &str, caption: &str) -> Result<PostRow> {
        let active = posts::ActiveModel {
            image: Set(image.to_string()),
            caption: Set(caption.to_string()),
            user_id: Set(user_id),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let post = active
            .insert(&self.conn)
            .await
            .context("Failed to insert post")?;

        info!(post_id = post.id, user_id, image, "Post created");
        Ok(post)
    }

    pub async fn get(&self, id: i32) -> Result<Option<PostRow>> {
        Posts::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query post")
    }

    pub async fn exists(&self, id: i32) -> Result<bool> {
        Ok(self.get(id).await?.is_some())
    }

    /// Posts by any of `user_ids`, newest first.
    pub async fn list_by_users(&self, user_ids: &[i32]) -> Result<Vec<PostRow>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        Posts::find()
            .filter(posts::Column::UserId.is_in(user_ids.iter().copied()))
            .order_by_desc(posts::Column::CreatedAt)
            .order_by_desc(posts::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list posts by users")
    }

    pub async fn list_by_user(&self, user_id: i32) -> Result<Vec<PostRow>> {
        self.list_by_users(&[user_id]).await
    }

    pub async fn count_by_user(&self, user_id: i32) -> Result<u64> {
        Posts::find()
            .filter(posts::Column::UserId.eq(user_id))
            .count(&self.conn)
            .await
            .context("Failed to count posts")
    }

    /// Up to `limit` posts in random order whose author is not in `exclude`.
    pub async fn random_excluding(&self, exclude: &[i32], limit: u64) -> Result<Vec<PostRow>> {
        Posts::find()
            .filter(posts::Column::UserId.is_not_in(exclude.iter().copied()))
            .order_by(Expr::cust("RANDOM()"), Order::Asc)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to sample posts")
    }

    pub async fn random(&self, limit: u64) -> Result<Vec<PostRow>> {
        self.random_excluding(&[], limit).await
    }
}
