use axum::{
    Extension, Json,
    extract::{Multipart, Path, Query, State},
};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::posts::MultipartForm;
use super::validation::validate_email;
use super::{ApiError, ApiResponse, AppState, SearchQuery};
use crate::services::{ProfileView, SettingsUpdate, UserInfo, UserSummary};

/// `GET /api/users/{username}`
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<ProfileView>>, ApiError> {
    let profile = state.social_service().profile(user.id, &username).await?;
    Ok(Json(ApiResponse::success(profile)))
}

/// `GET /api/users/search?q=`
pub async fn search_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<Vec<UserSummary>>>, ApiError> {
    let users = state.social_service().search(&query.q).await?;
    Ok(Json(ApiResponse::success(users)))
}

/// Updates profile settings.
///
/// # Endpoint
/// `PUT /api/settings` (multipart: `full_name`, `bio`, `email`, `profile_pic`)
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<UserInfo>>, ApiError> {
    let mut form = MultipartForm::read(multipart).await?;

    let email = form
        .field("email")
        .map(validate_email)
        .transpose()?
        .map(str::to_string);

    let update = SettingsUpdate {
        full_name: form.field("full_name").map(str::to_string),
        bio: form.field("bio").map(str::to_string),
        email,
        profile_pic: form
            .take_file("profile_pic")
            .map(|upload| (upload.filename, upload.bytes)),
    };

    let info = state.auth_service().update_settings(user.id, update).await?;
    Ok(Json(ApiResponse::success(info)))
}
