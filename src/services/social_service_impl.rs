//! `SeaORM` implementation of the `SocialService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::db::Store;
use crate::moderation::ReputationPolicy;
use crate::services::post_service_impl::hydrate_posts;
use crate::services::social_service::{ProfileView, SocialError, SocialService, UserSummary};

const SEARCH_LIMIT: u64 = 50;

pub struct SeaOrmSocialService {
    store: Store,
    policy: ReputationPolicy,
}

impl SeaOrmSocialService {
    #[must_use]
    pub const fn new(store: Store, policy: ReputationPolicy) -> Self {
        Self { store, policy }
    }
}

#[async_trait]
impl SocialService for SeaOrmSocialService {
    async fn toggle_follow(&self, user_id: i32, target_id: i32) -> Result<bool, SocialError> {
        if user_id == target_id {
            return Err(SocialError::SelfFollow);
        }

        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or_else(|| SocialError::UserNotFound(user_id.to_string()))?;

        if self.store.get_user(target_id).await?.is_none() {
            return Err(SocialError::UserNotFound(target_id.to_string()));
        }

        let social = self.store.social_repo();

        if social.unfollow(user_id, target_id).await? {
            info!(user_id, target_id, "Unfollowed");
            return Ok(false);
        }

        if self.policy.state(user.reputation_score).is_restricted() {
            metrics::counter!("gramguard_follows_rejected_total").increment(1);
            return Err(SocialError::Restricted);
        }

        social.follow(user_id, target_id).await?;
        info!(user_id, target_id, "Followed");
        Ok(true)
    }

    async fn toggle_like(&self, user_id: i32, post_id: i32) -> Result<bool, SocialError> {
        if self.store.get_post(post_id).await?.is_none() {
            return Err(SocialError::PostNotFound(post_id));
        }

        Ok(self.store.social_repo().toggle_like(user_id, post_id).await?)
    }

    async fn profile(&self, viewer_id: i32, username: &str) -> Result<ProfileView, SocialError> {
        let user = self
            .store
            .get_user_by_username(username)
            .await?
            .ok_or_else(|| SocialError::UserNotFound(username.to_string()))?;

        let social = self.store.social_repo();
        let is_following = viewer_id != user.id && social.is_following(viewer_id, user.id).await?;
        let follower_count = social.follower_count(user.id).await?;
        let following_count = social.following_count(user.id).await?;

        let posts = self.store.post_repo().list_by_user(user.id).await?;
        let posts = hydrate_posts(&self.store, viewer_id, posts).await?;

        Ok(ProfileView {
            id: user.id,
            username: user.username,
            full_name: user.full_name,
            bio: user.bio,
            profile_pic: user.profile_pic,
            reputation_score: user.reputation_score,
            post_count: posts.len(),
            follower_count,
            following_count,
            is_following,
            posts,
        })
    }

    async fn search(&self, query: &str) -> Result<Vec<UserSummary>, SocialError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let users = self.store.user_repo().search(query, SEARCH_LIMIT).await?;
        Ok(users.into_iter().map(UserSummary::from).collect())
    }
}
