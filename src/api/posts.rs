use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation::validate_id;
use super::{ApiError, ApiResponse, AppState};
use crate::services::{Feed, ImageUpload, PostError, PostView};

impl From<PostError> for ApiError {
    fn from(err: PostError) -> Self {
        match err {
            PostError::NoFile => Self::validation(err.to_string()),
            PostError::NotFound(_) => Self::NotFound(err.to_string()),
            PostError::UserNotFound => Self::unauthorized(err.to_string()),
            PostError::Database(msg) => Self::DatabaseError(msg),
            PostError::Internal(msg) => Self::internal(msg),
        }
    }
}

/// Form fields of a multipart body, files kept in memory.
#[derive(Default)]
pub(super) struct MultipartForm {
    pub fields: Vec<(String, String)>,
    pub files: Vec<(String, ImageUpload)>,
}

impl MultipartForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::validation(format!("Invalid multipart body: {e}")))?
        {
            let name = field.name().unwrap_or_default().to_string();

            if let Some(filename) = field.file_name().map(str::to_string) {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::validation(format!("Failed to read upload: {e}")))?;
                form.files.push((
                    name,
                    ImageUpload {
                        filename,
                        bytes: bytes.to_vec(),
                    },
                ));
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::validation(format!("Invalid form field: {e}")))?;
                form.fields.push((name, value));
            }
        }

        Ok(form)
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn take_file(&mut self, name: &str) -> Option<ImageUpload> {
        let idx = self.files.iter().position(|(n, _)| n == name)?;
        Some(self.files.swap_remove(idx).1)
    }
}

/// Uploads a new post.
///
/// # Endpoint
/// `POST /api/posts` (multipart: `image`, optional `caption`)
pub async fn create_post(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<PostView>>, ApiError> {
    let mut form = MultipartForm::read(multipart).await?;
    let caption = form.field("caption").unwrap_or_default().to_string();
    let image = form.take_file("image");

    let post = state.post_service().create(user.id, image, &caption).await?;

    Ok(Json(ApiResponse::success(post)))
}

/// `GET /api/posts/{id}`
pub async fn get_post(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(post_id): Path<i32>,
) -> Result<Json<ApiResponse<PostView>>, ApiError> {
    let post_id = validate_id("post", post_id)?;
    let post = state.post_service().get(user.id, post_id).await?;
    Ok(Json(ApiResponse::success(post)))
}

/// `GET /api/feed`
pub async fn get_feed(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Feed>>, ApiError> {
    let feed = state.post_service().feed(user.id).await?;
    Ok(Json(ApiResponse::success(feed)))
}

/// `GET /api/explore`
pub async fn get_explore(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<PostView>>>, ApiError> {
    let posts = state.post_service().explore(user.id).await?;
    Ok(Json(ApiResponse::success(posts)))
}
