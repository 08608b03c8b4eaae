use super::now;
use crate::error::AppResult;
use crate::middleware::AuthUser;
use crate::response::ApiResponse;
use crate::services::like::{LikeService, LikeState};
use axum::{extract::Path, response::IntoResponse, Extension};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct LikeResponse {
    /// Whether the current user likes the post
    pub liked: bool,
    pub count: u64,
}

impl From<LikeState> for LikeResponse {
    fn from(state: LikeState) -> Self {
        Self {
            liked: state.liked,
            count: state.count,
        }
    }
}

#[utoipa::path(
    get,
    path = "/posts/{post}/likes",
    params(("post" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Like count and the caller's like", body = LikeResponse),
    ),
    tag = "likes"
)]
pub async fn like_status(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: Option<AuthUser>,
    Path(post_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = LikeService::new(db);
    let state = service
        .state(post_id, auth_user.map(|u| u.user_id))
        .await?;
    Ok(ApiResponse::ok(LikeResponse::from(state)))
}

#[utoipa::path(
    post,
    path = "/posts/{post}/like",
    security(("jwt_token" = [])),
    params(("post" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Like toggled", body = LikeResponse),
        (status = 401, description = "Unauthorized", body = crate::error::AppError),
        (status = 404, description = "Post not found", body = crate::error::AppError),
    ),
    tag = "likes"
)]
pub async fn toggle_like(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(post_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = LikeService::new(db);
    let state = service.toggle(auth_user.user_id, post_id, now()).await?;
    Ok(ApiResponse::ok(LikeResponse::from(state)))
}
