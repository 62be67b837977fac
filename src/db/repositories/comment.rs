use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait, sea_query::Expr,
};
use std::collections::HashMap;

use crate::entities::{comments, prelude::*, users};

pub use crate::entities::comments::Model as CommentRow;

/// Comment to persist together with its author's reputation change.
#[derive(Debug, Clone)]
pub struct ScoredComment<'a> {
    pub user_id: i32,
    pub post_id: i32,
    pub text: &'a str,
    pub bullying_score: f64,
    /// Amount subtracted from the author's reputation, zero for clean comments.
    pub penalty: f64,
    /// Authors below this score are refused at write time.
    pub restriction_threshold: f64,
}

#[derive(Debug, Clone)]
pub enum InsertOutcome {
    Created {
        comment: CommentRow,
        old_score: f64,
        new_score: f64,
    },
    AuthorRestricted,
    AuthorMissing,
    PostMissing,
}

/// Repository for comment operations
pub struct CommentRepository {
    conn: DatabaseConnection,
}

impl CommentRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert a scored comment and decay its author's reputation in one
    /// transaction.
    ///
    /// The first statement is a conditional write on the author's row: it
    /// refuses restricted authors and takes the database write lock before
    /// anything is read. SQLite will not upgrade a read transaction that
    /// loses the race, so this must stay the first statement. The decrement
    /// is clamped at zero in SQL.
    pub async fn insert_scored(&self, scored: ScoredComment<'_>) -> Result<InsertOutcome> {
        let txn = self
            .conn
            .begin()
            .await
            .context("Failed to begin comment transaction")?;

        let claimed = Users::update_many()
            .col_expr(users::Column::ReputationScore, Expr::cust("reputation_score"))
            .filter(users::Column::Id.eq(scored.user_id))
            .filter(users::Column::ReputationScore.gte(scored.restriction_threshold))
            .exec(&txn)
            .await
            .context("Failed to lock comment author")?;

        if claimed.rows_affected == 0 {
            let exists = Users::find_by_id(scored.user_id).one(&txn).await?.is_some();
            return Ok(if exists {
                InsertOutcome::AuthorRestricted
            } else {
                InsertOutcome::AuthorMissing
            });
        }

        let old_score = Self::reputation_of(&txn, scored.user_id).await?;

        if Posts::find_by_id(scored.post_id).one(&txn).await?.is_none() {
            return Ok(InsertOutcome::PostMissing);
        }

        Users::update_many()
            .col_expr(
                users::Column::ReputationScore,
                Expr::cust_with_values("MAX(0.0, reputation_score - ?)", [scored.penalty]),
            )
            .filter(users::Column::Id.eq(scored.user_id))
            .exec(&txn)
            .await
            .context("Failed to decay reputation")?;

        let comment = comments::ActiveModel {
            text: Set(scored.text.to_string()),
            user_id: Set(scored.user_id),
            post_id: Set(scored.post_id),
            bullying_score: Set(scored.bullying_score),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .context("Failed to insert comment")?;

        let new_score = Self::reputation_of(&txn, scored.user_id).await?;

        txn.commit()
            .await
            .context("Failed to commit comment transaction")?;

        Ok(InsertOutcome::Created {
            comment,
            old_score,
            new_score,
        })
    }

    async fn reputation_of(txn: &DatabaseTransaction, user_id: i32) -> Result<f64> {
        Users::find_by_id(user_id)
            .select_only()
            .column(users::Column::ReputationScore)
            .into_tuple::<f64>()
            .one(txn)
            .await?
            .context("Comment author vanished mid-transaction")
    }

    /// Comments on a post with their authors, oldest first.
    pub async fn list_for_post(
        &self,
        post_id: i32,
    ) -> Result<Vec<(CommentRow, Option<users::Model>)>> {
        Comments::find()
            .filter(comments::Column::PostId.eq(post_id))
            .find_also_related(Users)
            .order_by_asc(comments::Column::CreatedAt)
            .order_by_asc(comments::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list comments")
    }

    pub async fn counts_for_posts(&self, post_ids: &[i32]) -> Result<HashMap<i32, i64>> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(i32, i64)> = Comments::find()
            .select_only()
            .column(comments::Column::PostId)
            .column_as(comments::Column::Id.count(), "count")
            .filter(comments::Column::PostId.is_in(post_ids.iter().copied()))
            .group_by(comments::Column::PostId)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to count comments")?;

        Ok(rows.into_iter().collect())
    }
}
