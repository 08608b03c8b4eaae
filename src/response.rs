use axum::{response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_PER_PAGE: u64 = 20;
pub const MAX_PER_PAGE: u64 = 100;

/// Success envelope shared by every JSON endpoint. Errors use `AppError`.
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> axum::response::Response {
        Json(self).into_response()
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedResponse<T: Serialize> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
}

impl<T: Serialize> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: u64, page: u64, per_page: u64) -> Self {
        let total_pages = if per_page == 0 {
            0
        } else {
            total.div_ceil(per_page)
        };
        Self {
            items,
            total,
            page,
            per_page,
            total_pages,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PaginationQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

impl PaginationQuery {
    pub fn resolve(&self) -> (u64, u64) {
        page_params(self.page, self.per_page)
    }
}

/// 1-based page and a page size within `1..=MAX_PER_PAGE`.
pub fn page_params(page: Option<u64>, per_page: Option<u64>) -> (u64, u64) {
    (
        page.unwrap_or(1).max(1),
        per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(PaginatedResponse::<String>::new(vec![], 100, 1, 20).total_pages, 5);
        assert_eq!(PaginatedResponse::<String>::new(vec![], 101, 1, 20).total_pages, 6);
        assert_eq!(PaginatedResponse::<String>::new(vec![], 1, 1, 20).total_pages, 1);
    }

    #[test]
    fn total_pages_empty() {
        assert_eq!(PaginatedResponse::<String>::new(vec![], 0, 1, 20).total_pages, 0);
        assert_eq!(PaginatedResponse::<String>::new(vec![], 10, 1, 0).total_pages, 0);
    }

    #[test]
    fn page_params_clamped() {
        assert_eq!(page_params(None, None), (1, DEFAULT_PER_PAGE));
        assert_eq!(page_params(Some(0), Some(0)), (1, 1));
        assert_eq!(page_params(Some(3), Some(500)), (3, MAX_PER_PAGE));
    }

    #[test]
    fn message_envelope() {
        let body = serde_json::to_value(ApiResponse::with_message(1, "done")).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "done");
    }
}
