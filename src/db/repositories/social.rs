use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QuerySelect, Set, TransactionTrait,
};
use std::collections::{HashMap, HashSet};

use crate::entities::{follows, likes, prelude::*};

/// Repository for likes and follows
pub struct SocialRepository {
    conn: DatabaseConnection,
}

impl SocialRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    // ========================================================================
    // Likes
    // ========================================================================

    /// Remove the like if present, otherwise add it. Returns the new state.
    /// Starts with the delete so the transaction holds the write lock from
    /// its first statement.
    pub async fn toggle_like(&self, user_id: i32, post_id: i32) -> Result<bool> {
        let txn = self.conn.begin().await?;

        let removed = Likes::delete_many()
            .filter(likes::Column::UserId.eq(user_id))
            .filter(likes::Column::PostId.eq(post_id))
            .exec(&txn)
            .await
            .context("Failed to delete like")?;

        let liked = if removed.rows_affected > 0 {
            false
        } else {
            likes::ActiveModel {
                user_id: Set(user_id),
                post_id: Set(post_id),
                created_at: Set(chrono::Utc::now().to_rfc3339()),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .context("Failed to insert like")?;
            true
        };

        txn.commit().await?;
        Ok(liked)
    }

    pub async fn like_counts(&self, post_ids: &[i32]) -> Result<HashMap<i32, i64>> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(i32, i64)> = Likes::find()
            .select_only()
            .column(likes::Column::PostId)
            .column_as(likes::Column::Id.count(), "count")
            .filter(likes::Column::PostId.is_in(post_ids.iter().copied()))
            .group_by(likes::Column::PostId)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to count likes")?;

        Ok(rows.into_iter().collect())
    }

    /// Subset of `post_ids` liked by `user_id`.
    pub async fn liked_posts(&self, user_id: i32, post_ids: &[i32]) -> Result<HashSet<i32>> {
        if post_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let rows: Vec<i32> = Likes::find()
            .select_only()
            .column(likes::Column::PostId)
            .filter(likes::Column::UserId.eq(user_id))
            .filter(likes::Column::PostId.is_in(post_ids.iter().copied()))
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to query liked posts")?;

        Ok(rows.into_iter().collect())
    }

    // ========================================================================
    // Follows
    // ========================================================================

    pub async fn is_following(&self, follower_id: i32, followed_id: i32) -> Result<bool> {
        let edge = Follows::find()
            .filter(follows::Column::FollowerId.eq(follower_id))
            .filter(follows::Column::FollowedId.eq(followed_id))
            .one(&self.conn)
            .await
            .context("Failed to query follow")?;

        Ok(edge.is_some())
    }

    pub async fn follow(&self, follower_id: i32, followed_id: i32) -> Result<()> {
        follows::ActiveModel {
            follower_id: Set(follower_id),
            followed_id: Set(followed_id),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert follow")?;

        Ok(())
    }

    /// Returns false if there was no edge to remove.
    pub async fn unfollow(&self, follower_id: i32, followed_id: i32) -> Result<bool> {
        let result = Follows::delete_many()
            .filter(follows::Column::FollowerId.eq(follower_id))
            .filter(follows::Column::FollowedId.eq(followed_id))
            .exec(&self.conn)
            .await
            .context("Failed to delete follow")?;

        Ok(result.rows_affected > 0)
    }

    /// IDs of users that `follower_id` follows.
    pub async fn followed_ids(&self, follower_id: i32) -> Result<Vec<i32>> {
        Follows::find()
            .select_only()
            .column(follows::Column::FollowedId)
            .filter(follows::Column::FollowerId.eq(follower_id))
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to list followed users")
    }

    pub async fn follower_count(&self, user_id: i32) -> Result<u64> {
        Follows::find()
            .filter(follows::Column::FollowedId.eq(user_id))
            .count(&self.conn)
            .await
            .context("Failed to count followers")
    }

    pub async fn following_count(&self, user_id: i32) -> Result<u64> {
        Follows::find()
            .filter(follows::Column::FollowerId.eq(user_id))
            .count(&self.conn)
            .await
            .context("Failed to count following")
    }
}
