use super::{auth::UserResponse, now};
use crate::error::{AppError, AppResult};
use crate::handlers::post::PostResponse;
use crate::middleware::AuthUser;
use crate::models::ForumThreadModel;
use crate::response::ApiResponse;
use crate::services::user::{Profile, ProfileUpdate, UserService};
use axum::{response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub user: UserResponse,
    /// All of the user's posts, any status
    pub posts: Vec<PostResponse>,
    pub comment_count: u64,
    pub threads: Vec<ForumThreadModel>,
}

impl From<Profile> for ProfileResponse {
    fn from(profile: Profile) -> Self {
        Self {
            user: UserResponse::from(profile.user),
            posts: profile.posts.into_iter().map(PostResponse::from).collect(),
            comment_count: profile.comment_count,
            threads: profile.threads,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub full_name: Option<String>,
    /// Empty string clears the bio
    #[validate(length(max = 500))]
    pub bio: Option<String>,
    #[validate(length(max = 500))]
    pub avatar_url: Option<String>,
}

#[utoipa::path(
    get,
    path = "/profile",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "The caller's profile", body = ProfileResponse),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "profile"
)]
pub async fn get_profile(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let service = UserService::new(db);
    let profile = service.profile(auth_user.user_id).await?;
    Ok(ApiResponse::ok(ProfileResponse::from(profile)))
}

#[utoipa::path(
    put,
    path = "/profile",
    security(("jwt_token" = [])),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "profile"
)]
pub async fn update_profile(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = UserService::new(db);
    let user = service
        .update_profile(
            auth_user.user_id,
            ProfileUpdate {
                full_name: payload.full_name,
                bio: payload.bio,
                avatar_url: payload.avatar_url,
            },
            now(),
        )
        .await?;
    Ok(ApiResponse::with_message(
        UserResponse::from(user),
        "Profile updated",
    ))
}
