use super::now;
use crate::error::{AppError, AppResult};
use crate::handlers::post::PostResponse;
use crate::middleware::AuthUser;
use crate::models::{category_request::RequestStatus, CategoryModel, CategoryRequestModel};
use crate::response::ApiResponse;
use crate::services::category::{CategoryService, NewCategory};
use axum::{extract::Path, extract::Query, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryDetailResponse {
    pub category: CategoryModel,
    pub posts: Vec<PostResponse>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// Bengali display name
    #[validate(length(min = 1, max = 100))]
    pub name_bn: String,
    /// Derived from `name` when omitted
    pub slug: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub display_order: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CategoryRequestPayload {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub name_bn: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CategoryRequestQuery {
    pub status: Option<RequestStatus>,
}

#[utoipa::path(
    get,
    path = "/categories",
    responses(
        (status = 200, description = "Categories in display order", body = Vec<CategoryModel>),
    ),
    tag = "categories"
)]
pub async fn list_categories(
    Extension(db): Extension<DatabaseConnection>,
) -> AppResult<impl IntoResponse> {
    let service = CategoryService::new(db);
    Ok(ApiResponse::ok(service.list().await?))
}

#[utoipa::path(
    get,
    path = "/categories/{slug}",
    params(("slug" = String, Path, description = "Category slug")),
    responses(
        (status = 200, description = "Category with its published posts", body = CategoryDetailResponse),
        (status = 404, description = "Category not found", body = AppError),
    ),
    tag = "categories"
)]
pub async fn get_category(
    Extension(db): Extension<DatabaseConnection>,
    Path(slug): Path<String>,
) -> AppResult<impl IntoResponse> {
    let service = CategoryService::new(db);
    let (category, posts) = service.get_by_slug(&slug).await?;
    Ok(ApiResponse::ok(CategoryDetailResponse {
        category,
        posts: posts.into_iter().map(PostResponse::from).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/author/category-requests",
    security(("jwt_token" = [])),
    request_body = CategoryRequestPayload,
    responses(
        (status = 200, description = "Request submitted", body = CategoryRequestModel),
        (status = 400, description = "Validation error", body = AppError),
    ),
    tag = "categories"
)]
pub async fn request_category(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<CategoryRequestPayload>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = CategoryService::new(db);
    let request = service
        .submit_request(
            &auth_user,
            &payload.name,
            &payload.name_bn,
            payload.description,
            now(),
        )
        .await?;
    Ok(ApiResponse::ok(request))
}

#[utoipa::path(
    post,
    path = "/admin/categories",
    security(("jwt_token" = [])),
    request_body = CreateCategoryRequest,
    responses(
        (status = 200, description = "Category created", body = CategoryModel),
        (status = 400, description = "Validation error or slug taken", body = AppError),
        (status = 403, description = "Forbidden", body = AppError),
    ),
    tag = "admin"
)]
pub async fn create_category(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<CreateCategoryRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = CategoryService::new(db);
    let category = service
        .create(
            &auth_user,
            NewCategory {
                name: payload.name,
                name_bn: payload.name_bn,
                slug: payload.slug,
                description: payload.description,
                display_order: payload.display_order,
            },
            now(),
        )
        .await?;
    Ok(ApiResponse::ok(category))
}

#[utoipa::path(
    delete,
    path = "/admin/categories/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category deleted", body = String),
        (status = 404, description = "Category not found", body = AppError),
    ),
    tag = "admin"
)]
pub async fn delete_category(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = CategoryService::new(db);
    service.delete(&auth_user, id).await?;
    Ok(ApiResponse::ok("Category deleted"))
}

#[utoipa::path(
    get,
    path = "/admin/category-requests",
    security(("jwt_token" = [])),
    params(("status" = Option<RequestStatus>, Query, description = "pending, approved or rejected")),
    responses(
        (status = 200, description = "Category requests, newest first", body = Vec<CategoryRequestModel>),
        (status = 403, description = "Forbidden", body = AppError),
    ),
    tag = "admin"
)]
pub async fn list_category_requests(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Query(params): Query<CategoryRequestQuery>,
) -> AppResult<impl IntoResponse> {
    let service = CategoryService::new(db);
    Ok(ApiResponse::ok(
        service.list_requests(&auth_user, params.status).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/admin/category-requests/{id}/approve",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Category created from the request", body = CategoryModel),
        (status = 409, description = "Request already reviewed", body = AppError),
    ),
    tag = "admin"
)]
pub async fn approve_category_request(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = CategoryService::new(db);
    Ok(ApiResponse::ok(
        service.approve_request(&auth_user, id, now()).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/admin/category-requests/{id}/reject",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Request rejected", body = CategoryRequestModel),
        (status = 409, description = "Request already reviewed", body = AppError),
    ),
    tag = "admin"
)]
pub async fn reject_category_request(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = CategoryService::new(db);
    Ok(ApiResponse::ok(
        service.reject_request(&auth_user, id, now()).await?,
    ))
}
