//! `SeaORM` implementation of the `PostService` trait.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::db::{PostRow, Store};
use crate::services::image::{ImageService, ImageType};
use crate::services::post_service::{
    Feed, ImageUpload, PostAuthor, PostError, PostService, PostView,
};
use crate::services::social_service::UserSummary;

const SUGGESTION_LIMIT: u64 = 5;
const EXPLORE_LIMIT: u64 = 20;

/// Attaches authors, like and comment counts, and the viewer's like state.
pub async fn hydrate_posts(store: &Store, viewer_id: i32, posts: Vec<PostRow>) -> Result<Vec<PostView>> {
    let post_ids: Vec<i32> = posts.iter().map(|p| p.id).collect();
    let mut author_ids: Vec<i32> = posts.iter().map(|p| p.user_id).collect();
    author_ids.sort_unstable();
    author_ids.dedup();

    let authors: HashMap<i32, PostAuthor> = store
        .user_repo()
        .get_by_ids(&author_ids)
        .await?
        .into_iter()
        .map(|u| {
            (
                u.id,
                PostAuthor {
                    id: u.id,
                    username: u.username,
                    profile_pic: u.profile_pic,
                },
            )
        })
        .collect();

    let social = store.social_repo();
    let like_counts = social.like_counts(&post_ids).await?;
    let liked = social.liked_posts(viewer_id, &post_ids).await?;
    let comment_counts = store.comment_repo().counts_for_posts(&post_ids).await?;

    Ok(posts
        .into_iter()
        .map(|post| PostView {
            id: post.id,
            author: authors.get(&post.user_id).cloned(),
            like_count: like_counts.get(&post.id).copied().unwrap_or(0),
            comment_count: comment_counts.get(&post.id).copied().unwrap_or(0),
            liked: liked.contains(&post.id),
            image: post.image,
            caption: post.caption,
            created_at: post.created_at,
        })
        .collect())
}

pub struct SeaOrmPostService {
    store: Store,
    images: Arc<ImageService>,
}

impl SeaOrmPostService {
    #[must_use]
    pub const fn new(store: Store, images: Arc<ImageService>) -> Self {
        Self { store, images }
    }

    /// The viewer plus everyone they follow.
    async fn circle(&self, viewer_id: i32) -> Result<Vec<i32>> {
        let mut ids = self.store.social_repo().followed_ids(viewer_id).await?;
        ids.push(viewer_id);
        Ok(ids)
    }
}

#[async_trait]
impl PostService for SeaOrmPostService {
    async fn create(
        &self,
        user_id: i32,
        image: Option<ImageUpload>,
        caption: &str,
    ) -> Result<PostView, PostError> {
        let image = image
            .filter(|upload| !upload.filename.is_empty())
            .ok_or(PostError::NoFile)?;

        if self.store.get_user(user_id).await?.is_none() {
            return Err(PostError::UserNotFound);
        }

        let stored = self
            .images
            .save_upload(&image.filename, &image.bytes, ImageType::Post)
            .await?;

        let post = self
            .store
            .post_repo()
            .create(user_id, &stored, caption.trim())
            .await?;

        metrics::counter!("gramguard_posts_created_total").increment(1);

        let mut views = hydrate_posts(&self.store, user_id, vec![post]).await?;
        views.pop().ok_or_else(|| PostError::Internal("post vanished".to_string()))
    }

    async fn get(&self, viewer_id: i32, post_id: i32) -> Result<PostView, PostError> {
        let post = self
            .store
            .get_post(post_id)
            .await?
            .ok_or(PostError::NotFound(post_id))?;

        let mut views = hydrate_posts(&self.store, viewer_id, vec![post]).await?;
        views.pop().ok_or(PostError::NotFound(post_id))
    }

    async fn feed(&self, viewer_id: i32) -> Result<Feed, PostError> {
        let circle = self.circle(viewer_id).await?;

        let posts = self.store.post_repo().list_by_users(&circle).await?;
        let posts = hydrate_posts(&self.store, viewer_id, posts).await?;

        let suggestions = self
            .store
            .user_repo()
            .list_excluding(viewer_id, &circle, SUGGESTION_LIMIT)
            .await?
            .into_iter()
            .map(UserSummary::from)
            .collect();

        Ok(Feed { posts, suggestions })
    }

    async fn explore(&self, viewer_id: i32) -> Result<Vec<PostView>, PostError> {
        let circle = self.circle(viewer_id).await?;
        let repo = self.store.post_repo();

        let mut posts = repo.random_excluding(&circle, EXPLORE_LIMIT).await?;
        if posts.is_empty() {
            posts = repo.random(EXPLORE_LIMIT).await?;
        }

        Ok(hydrate_posts(&self.store, viewer_id, posts).await?)
    }
}
