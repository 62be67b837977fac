use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{get, post, put},
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::Config;
use crate::moderation::BullyingClassifier;
use crate::services::{AuthService, CommentService, PostService, SocialService};
use crate::state::SharedState;

pub mod auth;
mod comments;
mod error;
pub mod observability;
mod posts;
mod social;
mod system;
mod types;
mod users;
mod validation;

pub use auth::CurrentUser;
pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn classifier(&self) -> &Arc<dyn BullyingClassifier> {
        &self.shared.classifier
    }

    #[must_use]
    pub fn auth_service(&self) -> &Arc<dyn AuthService> {
        &self.shared.auth_service
    }

    #[must_use]
    pub fn comment_service(&self) -> &Arc<dyn CommentService> {
        &self.shared.comment_service
    }

    #[must_use]
    pub fn post_service(&self) -> &Arc<dyn PostService> {
        &self.shared.post_service
    }

    #[must_use]
    pub fn social_service(&self) -> &Arc<dyn SocialService> {
        &self.shared.social_service
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

/// Same as [`create_app_state_from_config`] with a caller-supplied
/// classifier instead of the model named in the config.
pub async fn create_app_state_with_classifier(
    config: Config,
    classifier: Arc<dyn BullyingClassifier>,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::with_classifier(config, classifier).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub async fn router(state: Arc<AppState>) -> Router {
    let config = state.config().read().await.clone();

    let protected_routes = create_protected_router(state.clone());

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(config.server.secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            config.server.session_idle_minutes,
        )));

    let api_router = Router::new()
        .merge(protected_routes)
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/health/live", get(system::health_live))
        .route("/health/ready", get(system::health_ready))
        .route_layer(middleware::from_fn(observability::logging_middleware))
        .layer(session_layer)
        .with_state(state.clone());

    let cors_origins = &config.server.cors_allowed_origins;
    let cors_layer = if cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .nest_service(
            "/images",
            tower_http::services::ServeDir::new(&config.uploads.directory),
        )
        .layer(DefaultBodyLimit::max(config.server.max_body_bytes))
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::security_headers_middleware))
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/me", get(auth::get_current_user))
        .route("/feed", get(posts::get_feed))
        .route("/explore", get(posts::get_explore))
        .route("/posts", post(posts::create_post))
        .route("/posts/{id}", get(posts::get_post))
        .route("/posts/{id}/like", post(social::toggle_like))
        .route(
            "/posts/{id}/comments",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route("/users/search", get(users::search_users))
        .route("/users/{user}", get(users::get_profile))
        .route("/users/{user}/follow", post(social::toggle_follow))
        .route("/settings", put(users::update_settings))
        .route("/system/status", get(system::get_status))
        .route("/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
