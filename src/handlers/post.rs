use super::{auth::UserSummary, now};
use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::{CategoryModel, PostModel, PostStatus, UserModel};
use crate::response::{page_params, ApiResponse, PaginatedResponse};
use crate::services::post::{AuthorStats, PostDraft, PostService};
use axum::{extract::Path, extract::Query, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PostRequest {
    /// Post title (1-200 characters)
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    /// Post body (HTML from the rich-text editor, sanitized on save)
    #[validate(length(min = 1))]
    pub content: String,
    /// Summary, generated from the body when omitted
    #[validate(length(max = 500))]
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub category_id: Option<i32>,
    /// `draft` or `pending`
    #[serde(default = "default_status")]
    pub status: PostStatus,
}

fn default_status() -> PostStatus {
    PostStatus::Draft
}

impl From<PostRequest> for PostDraft {
    fn from(req: PostRequest) -> Self {
        Self {
            title: req.title,
            content: req.content,
            excerpt: req.excerpt,
            featured_image: req.featured_image,
            category_id: req.category_id,
            status: req.status,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RejectRequest {
    /// Shown to the author
    #[validate(length(min = 1, max = 1000))]
    pub reason: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PostResponse {
    pub id: i32,
    pub title: String,
    pub slug: String,
    /// Sanitized HTML
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub author_id: i32,
    pub author: Option<UserSummary>,
    pub category_id: Option<i32>,
    pub status: PostStatus,
    pub view_count: i32,
    /// Minutes
    pub reading_time: i32,
    pub rejection_reason: Option<String>,
    pub approved_at: Option<String>,
    pub published_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl PostResponse {
    pub fn with_author(p: PostModel, author: Option<UserModel>) -> Self {
        Self {
            id: p.id,
            title: p.title,
            slug: p.slug,
            content: p.content,
            excerpt: p.excerpt,
            featured_image: p.featured_image,
            author_id: p.author_id,
            author: author.map(UserSummary::from),
            category_id: p.category_id,
            status: p.status,
            view_count: p.view_count,
            reading_time: p.reading_time,
            rejection_reason: p.rejection_reason,
            approved_at: p.approved_at.map(|t| t.to_string()),
            published_at: p.published_at.map(|t| t.to_string()),
            created_at: p.created_at.to_string(),
            updated_at: p.updated_at.to_string(),
        }
    }
}

impl From<PostModel> for PostResponse {
    fn from(p: PostModel) -> Self {
        Self::with_author(p, None)
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PostDetailResponse {
    #[serde(flatten)]
    pub post: PostResponse,
    pub category: Option<CategoryModel>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthorStatsResponse {
    pub total_posts: u64,
    pub approved_posts: u64,
    pub pending_posts: u64,
    pub draft_posts: u64,
    pub total_views: i64,
    pub total_likes: u64,
}

impl From<AuthorStats> for AuthorStatsResponse {
    fn from(s: AuthorStats) -> Self {
        Self {
            total_posts: s.total_posts,
            approved_posts: s.approved_posts,
            pending_posts: s.pending_posts,
            draft_posts: s.draft_posts,
            total_views: s.total_views,
            total_likes: s.total_likes,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PostListQuery {
    /// Page number
    pub page: Option<u64>,
    /// Items per page
    pub per_page: Option<u64>,
    /// Category slug
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SearchQuery {
    pub q: Option<String>,
}

fn with_authors(rows: Vec<(PostModel, Option<UserModel>)>) -> Vec<PostResponse> {
    rows.into_iter()
        .map(|(post, author)| PostResponse::with_author(post, author))
        .collect()
}

// ---- public ---------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/posts",
    params(
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
        ("category" = Option<String>, Query, description = "Category slug"),
    ),
    responses(
        (status = 200, description = "Published posts", body = PaginatedResponse<PostResponse>),
    ),
    tag = "posts"
)]
pub async fn list_posts(
    Extension(db): Extension<DatabaseConnection>,
    Query(params): Query<PostListQuery>,
) -> AppResult<impl IntoResponse> {
    let (page, per_page) = page_params(params.page, params.per_page);

    let service = PostService::new(db);
    let (posts, total) = service
        .list_published(params.category.as_deref(), page, per_page)
        .await?;

    Ok(ApiResponse::ok(PaginatedResponse::new(
        with_authors(posts),
        total,
        page,
        per_page,
    )))
}

#[utoipa::path(
    get,
    path = "/posts/search",
    params(("q" = Option<String>, Query, description = "Search text")),
    responses(
        (status = 200, description = "Matching published posts", body = Vec<PostResponse>),
    ),
    tag = "posts"
)]
pub async fn search_posts(
    Extension(db): Extension<DatabaseConnection>,
    Query(params): Query<SearchQuery>,
) -> AppResult<impl IntoResponse> {
    let service = PostService::new(db);
    let posts = service.search(params.q.as_deref().unwrap_or("")).await?;
    Ok(ApiResponse::ok(with_authors(posts)))
}

#[utoipa::path(
    get,
    path = "/posts/{post}",
    params(("post" = String, Path, description = "Post slug")),
    responses(
        (status = 200, description = "Post details", body = PostDetailResponse),
        (status = 404, description = "Post not found", body = AppError),
    ),
    tag = "posts"
)]
pub async fn get_post(
    Extension(db): Extension<DatabaseConnection>,
    Path(slug): Path<String>,
) -> AppResult<impl IntoResponse> {
    let service = PostService::new(db);
    let (post, author, category) = service.view_published(&slug).await?;
    Ok(ApiResponse::ok(PostDetailResponse {
        post: PostResponse::with_author(post, author),
        category,
    }))
}

#[utoipa::path(
    get,
    path = "/posts/{post}/related",
    params(("post" = String, Path, description = "Post slug")),
    responses(
        (status = 200, description = "Posts from the same category", body = Vec<PostResponse>),
        (status = 404, description = "Post not found", body = AppError),
    ),
    tag = "posts"
)]
pub async fn related_posts(
    Extension(db): Extension<DatabaseConnection>,
    Path(slug): Path<String>,
) -> AppResult<impl IntoResponse> {
    let service = PostService::new(db);
    Ok(ApiResponse::ok(with_authors(service.related(&slug).await?)))
}

// ---- author area ----------------------------------------------------------

#[utoipa::path(
    get,
    path = "/author/posts",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Own posts in every status", body = Vec<PostResponse>),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "author"
)]
pub async fn author_posts(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let service = PostService::new(db);
    let posts = service.author_posts(&auth_user).await?;
    Ok(ApiResponse::ok(
        posts.into_iter().map(PostResponse::from).collect::<Vec<_>>(),
    ))
}

#[utoipa::path(
    get,
    path = "/author/posts/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Own post", body = PostResponse),
        (status = 404, description = "Post not found", body = AppError),
    ),
    tag = "author"
)]
pub async fn author_post(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = PostService::new(db);
    let post = service.author_post(&auth_user, id).await?;
    Ok(ApiResponse::ok(PostResponse::from(post)))
}

#[utoipa::path(
    get,
    path = "/author/stats",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Author dashboard numbers", body = AuthorStatsResponse),
    ),
    tag = "author"
)]
pub async fn author_stats(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let service = PostService::new(db);
    let stats = service.author_stats(&auth_user).await?;
    Ok(ApiResponse::ok(AuthorStatsResponse::from(stats)))
}

#[utoipa::path(
    post,
    path = "/author/posts",
    security(("jwt_token" = [])),
    request_body = PostRequest,
    responses(
        (status = 200, description = "Post created", body = PostResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 403, description = "Not a writer or suspended", body = AppError),
    ),
    tag = "author"
)]
pub async fn create_post(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<PostRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = PostService::new(db);
    let post = service.create(&auth_user, payload.into(), now()).await?;
    Ok(ApiResponse::ok(PostResponse::from(post)))
}

#[utoipa::path(
    put,
    path = "/author/posts/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Post ID")),
    request_body = PostRequest,
    responses(
        (status = 200, description = "Post updated", body = PostResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 403, description = "Not the author", body = AppError),
        (status = 409, description = "Post is not editable in its current status", body = AppError),
    ),
    tag = "author"
)]
pub async fn update_post(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<PostRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = PostService::new(db);
    let post = service.edit(&auth_user, id, payload.into(), now()).await?;
    Ok(ApiResponse::ok(PostResponse::from(post)))
}

#[utoipa::path(
    post,
    path = "/author/posts/{id}/submit",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Submitted for review", body = PostResponse),
        (status = 409, description = "Only drafts can be submitted", body = AppError),
    ),
    tag = "author"
)]
pub async fn submit_post(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = PostService::new(db);
    let post = service.submit(&auth_user, id, now()).await?;
    Ok(ApiResponse::ok(PostResponse::from(post)))
}

#[utoipa::path(
    delete,
    path = "/author/posts/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post deleted", body = String),
        (status = 403, description = "Not the author", body = AppError),
        (status = 404, description = "Post not found", body = AppError),
    ),
    tag = "author"
)]
pub async fn delete_post(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = PostService::new(db);
    service.delete(&auth_user, id).await?;
    Ok(ApiResponse::ok("Post deleted"))
}

// ---- moderation -----------------------------------------------------------

#[utoipa::path(
    get,
    path = "/moderator/posts",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Posts awaiting review", body = Vec<PostResponse>),
        (status = 403, description = "Forbidden", body = AppError),
    ),
    tag = "moderation"
)]
pub async fn review_queue(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let service = PostService::new(db);
    Ok(ApiResponse::ok(with_authors(
        service.review_queue(&auth_user).await?,
    )))
}

#[utoipa::path(
    post,
    path = "/moderator/posts/{id}/approve",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post approved and published", body = PostResponse),
        (status = 403, description = "Forbidden", body = AppError),
        (status = 409, description = "Post is not pending", body = AppError),
    ),
    tag = "moderation"
)]
pub async fn approve_post(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = PostService::new(db);
    let post = service.approve(&auth_user, id, now()).await?;
    Ok(ApiResponse::ok(PostResponse::from(post)))
}

#[utoipa::path(
    post,
    path = "/moderator/posts/{id}/reject",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Post ID")),
    request_body = RejectRequest,
    responses(
        (status = 200, description = "Post rejected", body = PostResponse),
        (status = 400, description = "Missing reason", body = AppError),
        (status = 409, description = "Post is not pending", body = AppError),
    ),
    tag = "moderation"
)]
pub async fn reject_post(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<RejectRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = PostService::new(db);
    let post = service
        .reject(&auth_user, id, &payload.reason, now())
        .await?;
    Ok(ApiResponse::ok(PostResponse::from(post)))
}

#[utoipa::path(
    delete,
    path = "/moderator/posts/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post deleted", body = String),
        (status = 403, description = "Forbidden", body = AppError),
    ),
    tag = "moderation"
)]
pub async fn moderator_delete_post(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    auth_user.require_staff()?;
    let service = PostService::new(db);
    service.delete(&auth_user, id).await?;
    Ok(ApiResponse::ok("Post deleted"))
}
