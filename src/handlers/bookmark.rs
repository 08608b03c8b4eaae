use super::now;
use crate::error::AppResult;
use crate::handlers::post::PostResponse;
use crate::middleware::AuthUser;
use crate::response::{ApiResponse, PaginatedResponse, PaginationQuery};
use crate::services::bookmark::BookmarkService;
use axum::{extract::Path, extract::Query, response::IntoResponse, Extension};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct BookmarkToggleResponse {
    /// Whether post is now bookmarked
    pub bookmarked: bool,
}

#[utoipa::path(
    get,
    path = "/posts/{post}/bookmark",
    security(("jwt_token" = [])),
    params(("post" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Bookmark state", body = BookmarkToggleResponse),
        (status = 401, description = "Unauthorized", body = crate::error::AppError),
    ),
    tag = "bookmarks"
)]
pub async fn bookmark_status(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(post_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = BookmarkService::new(db);
    let bookmarked = service.is_bookmarked(auth_user.user_id, post_id).await?;
    Ok(ApiResponse::ok(BookmarkToggleResponse { bookmarked }))
}

#[utoipa::path(
    post,
    path = "/posts/{post}/bookmark",
    security(("jwt_token" = [])),
    params(("post" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Bookmark toggled", body = BookmarkToggleResponse),
        (status = 401, description = "Unauthorized", body = crate::error::AppError),
        (status = 404, description = "Post not found", body = crate::error::AppError),
    ),
    tag = "bookmarks"
)]
pub async fn toggle_bookmark(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(post_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = BookmarkService::new(db);
    let bookmarked = service.toggle(auth_user.user_id, post_id, now()).await?;
    Ok(ApiResponse::ok(BookmarkToggleResponse { bookmarked }))
}

#[utoipa::path(
    get,
    path = "/profile/bookmarks",
    security(("jwt_token" = [])),
    params(
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Bookmarked posts", body = PaginatedResponse<PostResponse>),
        (status = 401, description = "Unauthorized", body = crate::error::AppError),
    ),
    tag = "bookmarks"
)]
pub async fn list_bookmarks(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Query(params): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    let (page, per_page) = params.resolve();

    let service = BookmarkService::new(db);
    let (posts, total) = service
        .list_user_bookmarks(auth_user.user_id, page, per_page)
        .await?;
    let items = posts.into_iter().map(PostResponse::from).collect();
    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, per_page,
    )))
}
