use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::db::Store;
use crate::moderation::{BullyingClassifier, ModelClassifier, ReputationPolicy};
use crate::services::{
    AuthService, CommentService, ImageService, PostService, SeaOrmAuthService,
    SeaOrmCommentService, SeaOrmPostService, SeaOrmSocialService, SocialService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub classifier: Arc<dyn BullyingClassifier>,

    pub policy: ReputationPolicy,

    pub image_service: Arc<ImageService>,

    pub auth_service: Arc<dyn AuthService>,

    pub comment_service: Arc<dyn CommentService>,

    pub post_service: Arc<dyn PostService>,

    pub social_service: Arc<dyn SocialService>,
}

impl SharedState {
    /// Opens the database and loads the classifier artifacts named in the
    /// config. A missing model leaves the classifier degraded, not an error.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let classifier = Arc::new(ModelClassifier::load(&config.classifier));
        Self::with_classifier(config, classifier).await
    }

    pub async fn with_classifier(
        config: Config,
        classifier: Arc<dyn BullyingClassifier>,
    ) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let policy = ReputationPolicy::from_config(&config.moderation);
        let image_service = Arc::new(ImageService::new(&config.uploads));

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            image_service.clone(),
            policy,
            config.security.clone(),
            &config.uploads,
        )) as Arc<dyn AuthService + Send + Sync + 'static>;

        let comment_service = Arc::new(SeaOrmCommentService::new(
            store.clone(),
            classifier.clone(),
            policy,
            config.moderation.max_comment_length,
        )) as Arc<dyn CommentService + Send + Sync + 'static>;

        let post_service = Arc::new(SeaOrmPostService::new(
            store.clone(),
            image_service.clone(),
        )) as Arc<dyn PostService + Send + Sync + 'static>;

        let social_service = Arc::new(SeaOrmSocialService::new(store.clone(), policy))
            as Arc<dyn SocialService + Send + Sync + 'static>;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            classifier,
            policy,
            image_service,
            auth_service,
            comment_service,
            post_service,
            social_service,
        })
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}
