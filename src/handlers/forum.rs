use super::{auth::UserSummary, now};
use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::{ForumCategoryModel, ForumReplyModel, ForumThreadModel, UserModel, VoteType};
use crate::response::ApiResponse;
use crate::services::forum::{ForumService, ThreadView, VoteOutcome};
use crate::utils::markdown::render_markdown;
use axum::{extract::Path, extract::Query, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateForumCategoryRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub name_bn: String,
    pub description: Option<String>,
    #[serde(default)]
    pub display_order: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateThreadRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    /// Markdown body
    #[validate(length(min = 1, max = 20000))]
    pub content: String,
    pub category_id: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateReplyRequest {
    /// Markdown body
    #[validate(length(min = 1, max = 10000))]
    pub content: String,
    pub parent_id: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VoteRequest {
    /// 1 for upvote, -1 for downvote
    #[schema(value_type = i16)]
    pub vote_type: VoteType,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ThreadListQuery {
    /// Forum category slug
    pub category: Option<String>,
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ThreadResponse {
    pub id: i32,
    pub title: String,
    pub slug: String,
    /// Raw Markdown
    pub content: String,
    pub category_id: i32,
    pub author: Option<UserSummary>,
    pub is_pinned: bool,
    pub is_locked: bool,
    pub has_accepted_answer: bool,
    pub view_count: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl ThreadResponse {
    fn with_author(t: ForumThreadModel, author: Option<UserModel>) -> Self {
        Self {
            id: t.id,
            title: t.title,
            slug: t.slug,
            content: t.content,
            category_id: t.category_id,
            author: author.map(UserSummary::from),
            is_pinned: t.is_pinned,
            is_locked: t.is_locked,
            has_accepted_answer: t.has_accepted_answer,
            view_count: t.view_count,
            created_at: t.created_at.to_string(),
            updated_at: t.updated_at.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReplyResponse {
    pub id: i32,
    pub thread_id: i32,
    pub parent_id: Option<i32>,
    pub content: String,
    /// Rendered and sanitized Markdown
    pub content_html: String,
    pub author: Option<UserSummary>,
    pub upvotes: i32,
    pub downvotes: i32,
    pub score: i32,
    pub is_accepted: bool,
    pub created_at: String,
}

impl ReplyResponse {
    fn with_author(r: ForumReplyModel, author: Option<UserModel>) -> Self {
        Self {
            id: r.id,
            thread_id: r.thread_id,
            parent_id: r.parent_id,
            content_html: render_markdown(&r.content),
            score: r.score(),
            content: r.content,
            author: author.map(UserSummary::from),
            upvotes: r.upvotes,
            downvotes: r.downvotes,
            is_accepted: r.is_accepted,
            created_at: r.created_at.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ThreadDetailResponse {
    #[serde(flatten)]
    pub thread: ThreadResponse,
    pub content_html: String,
    pub category: Option<ForumCategoryModel>,
    pub replies: Vec<ReplyResponse>,
}

impl From<ThreadView> for ThreadDetailResponse {
    fn from(view: ThreadView) -> Self {
        let content_html = render_markdown(&view.thread.content);
        Self {
            thread: ThreadResponse::with_author(view.thread, view.author),
            content_html,
            category: view.category,
            replies: view
                .replies
                .into_iter()
                .map(|(r, author)| ReplyResponse::with_author(r, author))
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VoteResponse {
    /// The caller's vote after the request, null when toggled off
    #[schema(value_type = Option<i16>)]
    pub vote: Option<VoteType>,
    pub upvotes: i32,
    pub downvotes: i32,
    pub score: i32,
}

impl From<VoteOutcome> for VoteResponse {
    fn from(outcome: VoteOutcome) -> Self {
        Self {
            vote: outcome.vote,
            upvotes: outcome.upvotes,
            downvotes: outcome.downvotes,
            score: outcome.upvotes - outcome.downvotes,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MyVoteResponse {
    #[schema(value_type = Option<i16>)]
    pub vote: Option<VoteType>,
}

#[utoipa::path(
    get,
    path = "/forum/categories",
    responses(
        (status = 200, description = "Forum categories in display order", body = Vec<ForumCategoryModel>),
    ),
    tag = "forum"
)]
pub async fn list_forum_categories(
    Extension(db): Extension<DatabaseConnection>,
) -> AppResult<impl IntoResponse> {
    let service = ForumService::new(db);
    Ok(ApiResponse::ok(service.list_categories().await?))
}

#[utoipa::path(
    post,
    path = "/admin/forum/categories",
    security(("jwt_token" = [])),
    request_body = CreateForumCategoryRequest,
    responses(
        (status = 200, description = "Forum category created", body = ForumCategoryModel),
        (status = 400, description = "Validation error or slug taken", body = AppError),
        (status = 403, description = "Forbidden", body = AppError),
    ),
    tag = "admin"
)]
pub async fn create_forum_category(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<CreateForumCategoryRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = ForumService::new(db);
    let category = service
        .create_category(
            &auth_user,
            &payload.name,
            &payload.name_bn,
            payload.description,
            payload.display_order,
            now(),
        )
        .await?;
    Ok(ApiResponse::ok(category))
}

#[utoipa::path(
    get,
    path = "/forum/threads",
    params(
        ("category" = Option<String>, Query, description = "Forum category slug"),
        ("limit" = Option<u64>, Query, description = "Maximum threads (default 50, max 100)"),
    ),
    responses(
        (status = 200, description = "Pinned first, then latest activity", body = Vec<ThreadResponse>),
    ),
    tag = "forum"
)]
pub async fn list_threads(
    Extension(db): Extension<DatabaseConnection>,
    Query(params): Query<ThreadListQuery>,
) -> AppResult<impl IntoResponse> {
    let service = ForumService::new(db);
    let threads = service
        .list_threads(params.category.as_deref(), params.limit)
        .await?;
    let items: Vec<ThreadResponse> = threads
        .into_iter()
        .map(|(t, author)| ThreadResponse::with_author(t, author))
        .collect();
    Ok(ApiResponse::ok(items))
}

#[utoipa::path(
    get,
    path = "/forum/threads/{thread}",
    params(("thread" = String, Path, description = "Thread slug")),
    responses(
        (status = 200, description = "Thread with its replies", body = ThreadDetailResponse),
        (status = 404, description = "Thread not found", body = AppError),
    ),
    tag = "forum"
)]
pub async fn get_thread(
    Extension(db): Extension<DatabaseConnection>,
    Path(slug): Path<String>,
) -> AppResult<impl IntoResponse> {
    let service = ForumService::new(db);
    let view = service.get_thread(&slug).await?;
    Ok(ApiResponse::ok(ThreadDetailResponse::from(view)))
}

#[utoipa::path(
    post,
    path = "/forum/threads",
    security(("jwt_token" = [])),
    request_body = CreateThreadRequest,
    responses(
        (status = 200, description = "Thread created", body = ThreadResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 403, description = "Account suspended", body = AppError),
    ),
    tag = "forum"
)]
pub async fn create_thread(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<CreateThreadRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = ForumService::new(db);
    let thread = service
        .create_thread(
            &auth_user,
            &payload.title,
            &payload.content,
            payload.category_id,
            now(),
        )
        .await?;
    Ok(ApiResponse::ok(ThreadResponse::with_author(thread, None)))
}

#[utoipa::path(
    post,
    path = "/forum/threads/{thread}/replies",
    security(("jwt_token" = [])),
    params(("thread" = i32, Path, description = "Thread ID")),
    request_body = CreateReplyRequest,
    responses(
        (status = 200, description = "Reply created", body = ReplyResponse),
        (status = 403, description = "Thread locked or account suspended", body = AppError),
        (status = 404, description = "Thread not found", body = AppError),
    ),
    tag = "forum"
)]
pub async fn create_reply(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(thread_id): Path<i32>,
    Json(payload): Json<CreateReplyRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = ForumService::new(db);
    let reply = service
        .create_reply(
            &auth_user,
            thread_id,
            &payload.content,
            payload.parent_id,
            now(),
        )
        .await?;
    Ok(ApiResponse::ok(ReplyResponse::with_author(reply, None)))
}

#[utoipa::path(
    post,
    path = "/forum/replies/{id}/vote",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Reply ID")),
    request_body = VoteRequest,
    responses(
        (status = 200, description = "Vote recorded, toggled off or changed", body = VoteResponse),
        (status = 404, description = "Reply not found", body = AppError),
    ),
    tag = "forum"
)]
pub async fn vote_reply(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(reply_id): Path<i32>,
    Json(payload): Json<VoteRequest>,
) -> AppResult<impl IntoResponse> {
    let service = ForumService::new(db);
    let outcome = service
        .vote(&auth_user, reply_id, payload.vote_type, now())
        .await?;
    Ok(ApiResponse::ok(VoteResponse::from(outcome)))
}

#[utoipa::path(
    get,
    path = "/forum/replies/{id}/vote",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Reply ID")),
    responses(
        (status = 200, description = "The caller's current vote", body = MyVoteResponse),
    ),
    tag = "forum"
)]
pub async fn my_vote(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(reply_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = ForumService::new(db);
    let vote = service.my_vote(&auth_user, reply_id).await?;
    Ok(ApiResponse::ok(MyVoteResponse { vote }))
}

#[utoipa::path(
    post,
    path = "/forum/replies/{id}/accept",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Reply ID")),
    responses(
        (status = 200, description = "Reply marked as the accepted answer", body = ReplyResponse),
        (status = 403, description = "Only the thread author can accept", body = AppError),
    ),
    tag = "forum"
)]
pub async fn accept_answer(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(reply_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = ForumService::new(db);
    let reply = service.accept_answer(&auth_user, reply_id, now()).await?;
    Ok(ApiResponse::ok(ReplyResponse::with_author(reply, None)))
}

#[utoipa::path(
    post,
    path = "/moderator/threads/{id}/lock",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Thread ID")),
    responses(
        (status = 200, description = "Thread locked", body = ThreadResponse),
        (status = 403, description = "Forbidden", body = AppError),
        (status = 404, description = "Thread not found", body = AppError),
    ),
    tag = "moderation"
)]
pub async fn lock_thread(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(thread_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = ForumService::new(db);
    let thread = service.set_locked(&auth_user, thread_id, true).await?;
    Ok(ApiResponse::ok(ThreadResponse::with_author(thread, None)))
}

#[utoipa::path(
    post,
    path = "/moderator/threads/{id}/unlock",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Thread ID")),
    responses(
        (status = 200, description = "Thread unlocked", body = ThreadResponse),
        (status = 403, description = "Forbidden", body = AppError),
        (status = 404, description = "Thread not found", body = AppError),
    ),
    tag = "moderation"
)]
pub async fn unlock_thread(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(thread_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = ForumService::new(db);
    let thread = service.set_locked(&auth_user, thread_id, false).await?;
    Ok(ApiResponse::ok(ThreadResponse::with_author(thread, None)))
}

#[utoipa::path(
    post,
    path = "/moderator/threads/{id}/pin",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Thread ID")),
    responses(
        (status = 200, description = "Thread pinned", body = ThreadResponse),
        (status = 403, description = "Forbidden", body = AppError),
        (status = 404, description = "Thread not found", body = AppError),
    ),
    tag = "moderation"
)]
pub async fn pin_thread(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(thread_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = ForumService::new(db);
    let thread = service.set_pinned(&auth_user, thread_id, true).await?;
    Ok(ApiResponse::ok(ThreadResponse::with_author(thread, None)))
}

#[utoipa::path(
    post,
    path = "/moderator/threads/{id}/unpin",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Thread ID")),
    responses(
        (status = 200, description = "Thread unpinned", body = ThreadResponse),
        (status = 403, description = "Forbidden", body = AppError),
        (status = 404, description = "Thread not found", body = AppError),
    ),
    tag = "moderation"
)]
pub async fn unpin_thread(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(thread_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = ForumService::new(db);
    let thread = service.set_pinned(&auth_user, thread_id, false).await?;
    Ok(ApiResponse::ok(ThreadResponse::with_author(thread, None)))
}

#[utoipa::path(
    delete,
    path = "/moderator/replies/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Reply ID")),
    responses(
        (status = 200, description = "Reply hidden", body = String),
        (status = 403, description = "Forbidden", body = AppError),
        (status = 404, description = "Reply not found", body = AppError),
    ),
    tag = "moderation"
)]
pub async fn delete_reply(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(reply_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = ForumService::new(db);
    service.delete_reply(&auth_user, reply_id, now()).await?;
    Ok(ApiResponse::ok("Reply removed"))
}
