//! `SeaORM` implementation of the `CommentService` trait.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use crate::db::{InsertOutcome, ScoredComment, Store};
use crate::moderation::{BullyingClassifier, ReputationPolicy};
use crate::services::comment_service::{
    CommentError, CommentService, CommentSubmission, CommentView,
};

const DISPLAY_FORMAT: &str = "%b %d, %Y at %I:%M %p";

/// Formats a stored RFC 3339 timestamp like `Mar 04, 2026 at 09:15 PM`.
/// Unparseable values are returned unchanged.
#[must_use]
pub fn display_timestamp(stored: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(stored)
        .map_or_else(|_| stored.to_string(), |dt| dt.format(DISPLAY_FORMAT).to_string())
}

pub struct SeaOrmCommentService {
    store: Store,
    classifier: Arc<dyn BullyingClassifier>,
    policy: ReputationPolicy,
    max_length: usize,
}

impl SeaOrmCommentService {
    #[must_use]
    pub fn new(
        store: Store,
        classifier: Arc<dyn BullyingClassifier>,
        policy: ReputationPolicy,
        max_length: usize,
    ) -> Self {
        Self {
            store,
            classifier,
            policy,
            max_length,
        }
    }
}

#[async_trait]
impl CommentService for SeaOrmCommentService {
    async fn submit(
        &self,
        user_id: i32,
        post_id: i32,
        text: &str,
    ) -> Result<CommentSubmission, CommentError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(CommentError::Empty);
        }
        if text.chars().count() > self.max_length {
            return Err(CommentError::TooLong(self.max_length));
        }

        let author = self
            .store
            .get_user(user_id)
            .await?
            .ok_or(CommentError::UserNotFound)?;

        if self.policy.state(author.reputation_score).is_restricted() {
            metrics::counter!("gramguard_comments_rejected_total", "reason" => "restricted")
                .increment(1);
            return Err(CommentError::Restricted);
        }

        if self.store.get_post(post_id).await?.is_none() {
            return Err(CommentError::PostNotFound(post_id));
        }

        let bullying_score = self.classifier.score(text).await;
        let bullying_detected = self.policy.is_bullying(bullying_score);

        let outcome = self
            .store
            .insert_scored_comment(ScoredComment {
                user_id,
                post_id,
                text,
                bullying_score,
                penalty: self.policy.penalty(bullying_score),
                restriction_threshold: self.policy.restriction_threshold,
            })
            .await?;

        let (comment, old_score, new_score) = match outcome {
            InsertOutcome::Created {
                comment,
                old_score,
                new_score,
            } => (comment, old_score, new_score),
            InsertOutcome::AuthorRestricted => return Err(CommentError::Restricted),
            InsertOutcome::AuthorMissing => return Err(CommentError::UserNotFound),
            InsertOutcome::PostMissing => return Err(CommentError::PostNotFound(post_id)),
        };

        let reputation = self.policy.outcome(old_score, new_score, bullying_detected);

        metrics::counter!(
            "gramguard_comments_total",
            "bullying" => if bullying_detected { "true" } else { "false" }
        )
        .increment(1);
        metrics::histogram!("gramguard_bullying_score").record(bullying_score);

        if bullying_detected {
            info!(
                user_id,
                post_id,
                comment_id = comment.id,
                bullying_score,
                old_score,
                new_score,
                "Bullying detected, reputation decreased"
            );
        }
        if reputation.restricted {
            warn!(user_id, new_score, "User restricted after low reputation");
            metrics::counter!("gramguard_users_restricted_total").increment(1);
        }

        Ok(CommentSubmission {
            comment: CommentView {
                id: comment.id,
                text: comment.text,
                author: author.username,
                author_pic: author.profile_pic,
                created_at: display_timestamp(&comment.created_at),
                bullying_detected,
            },
            user_reputation: reputation.new_score,
            reputation_loss: reputation.loss,
            restricted: reputation.restricted,
        })
    }

    async fn list(&self, post_id: i32) -> Result<Vec<CommentView>, CommentError> {
        if self.store.get_post(post_id).await?.is_none() {
            return Err(CommentError::PostNotFound(post_id));
        }

        let rows = self.store.comment_repo().list_for_post(post_id).await?;

        Ok(rows
            .into_iter()
            .map(|(comment, author)| {
                let (author, author_pic) =
                    author.map_or_else(Default::default, |u| (u.username, u.profile_pic));
                CommentView {
                    id: comment.id,
                    bullying_detected: self.policy.is_bullying(comment.bullying_score),
                    text: comment.text,
                    author,
                    author_pic,
                    created_at: display_timestamp(&comment.created_at),
                }
            })
            .collect())
    }
}
