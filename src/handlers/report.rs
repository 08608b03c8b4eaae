use super::now;
use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::{ContentType, ReportModel, ReportStatus};
use crate::response::{page_params, ApiResponse, PaginatedResponse};
use crate::services::report::ReportService;
use axum::{extract::Path, extract::Query, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateReportRequest {
    /// post, comment, thread or reply
    pub content_type: ContentType,
    pub content_id: i32,
    #[validate(length(min = 1, max = 100))]
    pub reason: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateReportRequest {
    /// reviewed or resolved
    pub status: ReportStatus,
    pub resolution_note: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResolveReportRequest {
    #[validate(length(min = 1, max = 2000))]
    pub resolution_note: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReportListQuery {
    pub status: Option<ReportStatus>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[utoipa::path(
    post,
    path = "/reports",
    security(("jwt_token" = [])),
    request_body = CreateReportRequest,
    responses(
        (status = 200, description = "Report filed", body = ReportModel),
        (status = 400, description = "Validation error or unknown content", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "reports"
)]
pub async fn create_report(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<CreateReportRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = ReportService::new(db);
    let report = service
        .create_report(
            &auth_user,
            payload.content_type,
            payload.content_id,
            &payload.reason,
            payload.description,
            now(),
        )
        .await?;
    Ok(ApiResponse::ok(report))
}

#[utoipa::path(
    get,
    path = "/moderator/reports",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Pending reports, oldest first", body = Vec<ReportModel>),
        (status = 403, description = "Forbidden", body = AppError),
    ),
    tag = "moderation"
)]
pub async fn pending_reports(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let service = ReportService::new(db);
    Ok(ApiResponse::ok(service.list_pending(&auth_user).await?))
}

#[utoipa::path(
    put,
    path = "/moderator/reports/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Report ID")),
    request_body = UpdateReportRequest,
    responses(
        (status = 200, description = "Report updated", body = ReportModel),
        (status = 400, description = "Status cannot go back to pending", body = AppError),
        (status = 404, description = "Report not found", body = AppError),
    ),
    tag = "moderation"
)]
pub async fn update_report(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateReportRequest>,
) -> AppResult<impl IntoResponse> {
    let service = ReportService::new(db);
    let report = service
        .update_status(
            &auth_user,
            id,
            payload.status,
            payload.resolution_note,
            now(),
        )
        .await?;
    Ok(ApiResponse::ok(report))
}

#[utoipa::path(
    post,
    path = "/moderator/reports/{id}/resolve",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Report ID")),
    request_body = ResolveReportRequest,
    responses(
        (status = 200, description = "Report resolved", body = ReportModel),
        (status = 400, description = "Resolution note missing", body = AppError),
        (status = 404, description = "Report not found", body = AppError),
    ),
    tag = "moderation"
)]
pub async fn resolve_report(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<ResolveReportRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = ReportService::new(db);
    let report = service
        .resolve(&auth_user, id, &payload.resolution_note, now())
        .await?;
    Ok(ApiResponse::ok(report))
}

#[utoipa::path(
    get,
    path = "/admin/reports",
    security(("jwt_token" = [])),
    params(
        ("status" = Option<ReportStatus>, Query, description = "Filter by status"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "All reports, newest first", body = PaginatedResponse<ReportModel>),
        (status = 403, description = "Forbidden", body = AppError),
    ),
    tag = "admin"
)]
pub async fn list_reports(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Query(params): Query<ReportListQuery>,
) -> AppResult<impl IntoResponse> {
    let (page, per_page) = page_params(params.page, params.per_page);

    let service = ReportService::new(db);
    let (reports, total) = service
        .list_reports(&auth_user, params.status, page, per_page)
        .await?;
    Ok(ApiResponse::ok(PaginatedResponse::new(
        reports, total, page, per_page,
    )))
}
