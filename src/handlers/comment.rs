use super::{auth::UserSummary, now};
use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::{CommentModel, UserModel};
use crate::response::ApiResponse;
use crate::services::comment::CommentService;
use axum::{extract::Path, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCommentRequest {
    /// Comment text (1-5000 characters)
    #[validate(length(min = 1, max = 5000))]
    pub content: String,
    /// Comment being answered
    pub parent_id: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CommentResponse {
    pub id: i32,
    pub post_id: i32,
    pub user_id: i32,
    pub parent_id: Option<i32>,
    pub content: String,
    pub author: Option<UserSummary>,
    pub created_at: String,
    pub updated_at: String,
}

impl CommentResponse {
    fn with_author(c: CommentModel, author: Option<UserModel>) -> Self {
        Self {
            id: c.id,
            post_id: c.post_id,
            user_id: c.user_id,
            parent_id: c.parent_id,
            content: c.content,
            author: author.map(UserSummary::from),
            created_at: c.created_at.to_string(),
            updated_at: c.updated_at.to_string(),
        }
    }
}

#[utoipa::path(
    get,
    path = "/posts/{post}/comments",
    params(("post" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Comments, oldest first", body = Vec<CommentResponse>),
    ),
    tag = "comments"
)]
pub async fn list_comments(
    Extension(db): Extension<DatabaseConnection>,
    Path(post_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = CommentService::new(db);
    let comments = service.list_by_post(post_id).await?;
    let items: Vec<CommentResponse> = comments
        .into_iter()
        .map(|(c, author)| CommentResponse::with_author(c, author))
        .collect();
    Ok(ApiResponse::ok(items))
}

#[utoipa::path(
    post,
    path = "/posts/{post}/comments",
    security(("jwt_token" = [])),
    params(("post" = i32, Path, description = "Post ID")),
    request_body = CreateCommentRequest,
    responses(
        (status = 200, description = "Comment created", body = CommentResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
        (status = 403, description = "Account suspended", body = AppError),
    ),
    tag = "comments"
)]
pub async fn create_comment(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(post_id): Path<i32>,
    Json(payload): Json<CreateCommentRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = CommentService::new(db);
    let comment = service
        .create(&auth_user, post_id, payload.parent_id, &payload.content, now())
        .await?;
    Ok(ApiResponse::ok(CommentResponse::with_author(comment, None)))
}

#[utoipa::path(
    delete,
    path = "/comments/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Comment deleted", body = String),
        (status = 403, description = "Not the author", body = AppError),
        (status = 404, description = "Comment not found", body = AppError),
    ),
    tag = "comments"
)]
pub async fn delete_comment(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = CommentService::new(db);
    service.delete_own(&auth_user, id).await?;
    Ok(ApiResponse::ok("Comment deleted"))
}

#[utoipa::path(
    delete,
    path = "/moderator/comments/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Comment hidden", body = String),
        (status = 403, description = "Forbidden", body = AppError),
        (status = 404, description = "Comment not found", body = AppError),
    ),
    tag = "moderation"
)]
pub async fn moderate_comment(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = CommentService::new(db);
    service.moderate_delete(&auth_user, id, now()).await?;
    Ok(ApiResponse::ok("Comment removed"))
}
