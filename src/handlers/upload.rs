use super::now;
use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::response::ApiResponse;
use crate::services::upload::{ObjectStore, UploadRequest, UploadService};
use axum::{extract::Multipart, response::IntoResponse, Extension};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    /// Public URL of the stored image
    pub url: String,
}

/// Upload an image.
/// Multipart fields: `file` (required), `bucket` (`post-images` or `avatars`), `folder`.
#[utoipa::path(
    post,
    path = "/api/upload",
    security(("jwt_token" = [])),
    request_body(content_type = "multipart/form-data", description = "file, bucket, folder"),
    responses(
        (status = 200, description = "Image stored", body = UploadResponse),
        (status = 400, description = "Missing file, not an image, too large or unknown bucket", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "uploads"
)]
pub async fn upload_image(
    Extension(store): Extension<Arc<dyn ObjectStore>>,
    auth_user: AuthUser,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut request = UploadRequest::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read upload: {}", e)))?
    {
        match field.name() {
            Some("file") => {
                request.file_name = field.file_name().map(str::to_string);
                request.content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read file data: {}", e)))?;
                request.bytes = Some(data.to_vec());
            }
            Some("bucket") => request.bucket = Some(text_field(field).await?),
            Some("folder") => request.folder = Some(text_field(field).await?),
            _ => {}
        }
    }

    let url = UploadService::store_image(store.as_ref(), auth_user.user_id, request, now()).await?;
    Ok(ApiResponse::ok(UploadResponse { url }))
}

async fn text_field(field: axum::extract::multipart::Field<'_>) -> AppResult<String> {
    field
        .text()
        .await
        .map(|t| t.trim().to_string())
        .map_err(|e| AppError::Validation(format!("Failed to read form field: {}", e)))
}
