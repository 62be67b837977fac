pub mod image;
pub use image::ImageService;

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, Registration, SettingsUpdate, UserInfo};
pub use auth_service_impl::SeaOrmAuthService;

pub mod comment_service;
pub mod comment_service_impl;
pub use comment_service::{CommentError, CommentService, CommentSubmission, CommentView};
pub use comment_service_impl::SeaOrmCommentService;

pub mod post_service;
pub mod post_service_impl;
pub use post_service::{Feed, ImageUpload, PostError, PostService, PostView};
pub use post_service_impl::SeaOrmPostService;

pub mod social_service;
pub mod social_service_impl;
pub use social_service::{ProfileView, SocialError, SocialService, UserSummary};
pub use social_service_impl::SeaOrmSocialService;
