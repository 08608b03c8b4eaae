use super::{auth::UserResponse, now};
use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::Role;
use crate::response::{ApiResponse, PaginatedResponse, PaginationQuery};
use crate::services::admin::{AdminService, AdminStats, ModeratorStats};
use axum::{extract::Path, extract::Query, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminStatsResponse {
    pub total_users: u64,
    pub approved_posts: u64,
    pub pending_posts: u64,
    pub total_threads: u64,
    pub total_comments: u64,
}

impl From<AdminStats> for AdminStatsResponse {
    fn from(s: AdminStats) -> Self {
        Self {
            total_users: s.total_users,
            approved_posts: s.approved_posts,
            pending_posts: s.pending_posts,
            total_threads: s.total_threads,
            total_comments: s.total_comments,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ModeratorStatsResponse {
    pub pending_posts: u64,
    pub pending_comment_reports: u64,
    pub pending_thread_reports: u64,
    pub pending_reports: u64,
}

impl From<ModeratorStats> for ModeratorStatsResponse {
    fn from(s: ModeratorStats) -> Self {
        Self {
            pending_posts: s.pending_posts,
            pending_comment_reports: s.pending_comment_reports,
            pending_thread_reports: s.pending_thread_reports,
            pending_reports: s.pending_reports,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRoleRequest {
    /// user, contributor, author, moderator or admin
    pub role: Role,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SuspendRequest {
    /// Length of the suspension in days
    #[validate(range(min = 1, max = 3650))]
    pub days: i64,
}

#[utoipa::path(
    get,
    path = "/admin/stats",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Site totals", body = AdminStatsResponse),
        (status = 403, description = "Forbidden", body = AppError),
    ),
    tag = "admin"
)]
pub async fn get_stats(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let service = AdminService::new(db);
    let stats = service.get_stats(&auth_user).await?;
    Ok(ApiResponse::ok(AdminStatsResponse::from(stats)))
}

#[utoipa::path(
    get,
    path = "/moderator/stats",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Moderation queue sizes", body = ModeratorStatsResponse),
        (status = 403, description = "Forbidden", body = AppError),
    ),
    tag = "moderation"
)]
pub async fn moderator_stats(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let service = AdminService::new(db);
    let stats = service.moderator_stats(&auth_user).await?;
    Ok(ApiResponse::ok(ModeratorStatsResponse::from(stats)))
}

#[utoipa::path(
    get,
    path = "/admin/users",
    security(("jwt_token" = [])),
    params(
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Users, newest first", body = PaginatedResponse<UserResponse>),
        (status = 403, description = "Forbidden", body = AppError),
    ),
    tag = "admin"
)]
pub async fn list_users(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Query(params): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    let (page, per_page) = params.resolve();

    let service = AdminService::new(db);
    let (users, total) = service.list_users(&auth_user, page, per_page).await?;
    let items = users.into_iter().map(UserResponse::from).collect();
    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, per_page,
    )))
}

#[utoipa::path(
    put,
    path = "/admin/users/{id}/role",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = UserResponse),
        (status = 400, description = "Admins cannot demote themselves", body = AppError),
        (status = 404, description = "User not found", body = AppError),
    ),
    tag = "admin"
)]
pub async fn update_user_role(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(user_id): Path<i32>,
    Json(payload): Json<UpdateRoleRequest>,
) -> AppResult<impl IntoResponse> {
    let service = AdminService::new(db);
    let user = service
        .update_user_role(&auth_user, user_id, payload.role, now())
        .await?;
    Ok(ApiResponse::ok(UserResponse::from(user)))
}

#[utoipa::path(
    post,
    path = "/admin/users/{id}/suspend",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "User ID")),
    request_body = SuspendRequest,
    responses(
        (status = 200, description = "User suspended", body = UserResponse),
        (status = 400, description = "Invalid duration or self-suspension", body = AppError),
        (status = 404, description = "User not found", body = AppError),
    ),
    tag = "admin"
)]
pub async fn suspend_user(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(user_id): Path<i32>,
    Json(payload): Json<SuspendRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = AdminService::new(db);
    let user = service
        .suspend_user(&auth_user, user_id, payload.days, now())
        .await?;
    Ok(ApiResponse::ok(UserResponse::from(user)))
}

#[utoipa::path(
    post,
    path = "/admin/users/{id}/unsuspend",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "Suspension lifted", body = UserResponse),
        (status = 404, description = "User not found", body = AppError),
    ),
    tag = "admin"
)]
pub async fn unsuspend_user(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(user_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = AdminService::new(db);
    let user = service.unsuspend_user(&auth_user, user_id, now()).await?;
    Ok(ApiResponse::ok(UserResponse::from(user)))
}
