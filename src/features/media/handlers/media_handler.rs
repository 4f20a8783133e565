use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::debug;
use validator::Validate;

use crate::core::error::AppError;
use crate::core::extractor::{AppJson, AppQuery};
use crate::features::auth::guards::{RequireAdmin, RequireEditor};
use crate::features::media::dtos::{
    DeleteMediaDto, DeleteMediaResponseDto, ListMediaQuery, MediaObjectDto, UploadMediaDto,
};
use crate::features::media::services::MediaService;
use crate::shared::types::{ApiResponse, Meta};

/// Upload a media file
///
/// Accepts multipart/form-data with:
/// - `file`: the file to upload (required)
/// - `folder`: target folder (optional, inferred from the file type)
#[utoipa::path(
    post,
    path = "/api/admin/media",
    tag = "media",
    request_body(
        content = UploadMediaDto,
        content_type = "multipart/form-data",
        description = "File upload form with an optional folder",
    ),
    responses(
        (status = 201, description = "File uploaded successfully", body = ApiResponse<MediaObjectDto>),
        (status = 400, description = "Invalid file or validation error"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Forbidden - Admin access required"),
        (status = 413, description = "File too large")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn upload_media(
    RequireAdmin(user): RequireAdmin,
    State(service): State<Arc<MediaService>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<MediaObjectDto>>), AppError> {
    let mut file: Option<(Vec<u8>, String, String)> = None;
    let mut folder: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let file_name = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "unnamed".to_string());

                let data = field.bytes().await.map_err(|e| {
                    debug!("Failed to read file bytes: {}", e);
                    AppError::BadRequest(format!("Failed to read file data: {}", e))
                })?;

                file = Some((data.to_vec(), file_name, content_type));
            }
            "folder" => {
                let text = field.text().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read folder field: {}", e))
                })?;
                folder = Some(text);
            }
            _ => {
                debug!("Ignoring unknown field: {}", field_name);
            }
        }
    }

    let (data, file_name, content_type) =
        file.ok_or_else(|| AppError::BadRequest("File is required".to_string()))?;

    debug!("Media upload by {}: {} ({})", user.sub, file_name, content_type);
    let media = service
        .upload(data, &file_name, &content_type, folder)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(media), None, None)),
    ))
}

/// List media objects, newest first
#[utoipa::path(
    get,
    path = "/api/admin/media",
    tag = "media",
    params(ListMediaQuery),
    responses(
        (status = 200, description = "Media objects", body = ApiResponse<Vec<MediaObjectDto>>),
        (status = 400, description = "Invalid folder"),
        (status = 401, description = "Authentication required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_media(
    RequireEditor(_user): RequireEditor,
    State(service): State<Arc<MediaService>>,
    AppQuery(query): AppQuery<ListMediaQuery>,
) -> Result<Json<ApiResponse<Vec<MediaObjectDto>>>, AppError> {
    let (items, total) = service
        .list(query.folder.as_deref(), &query.pagination())
        .await?;

    Ok(Json(ApiResponse::success(
        Some(items),
        None,
        Some(Meta { total }),
    )))
}

/// Delete a media object by its public URL
#[utoipa::path(
    delete,
    path = "/api/admin/media",
    tag = "media",
    request_body = DeleteMediaDto,
    responses(
        (status = 200, description = "File deleted successfully", body = ApiResponse<DeleteMediaResponseDto>),
        (status = 400, description = "Invalid URL"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Not a media library object")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_media(
    RequireAdmin(_user): RequireAdmin,
    State(service): State<Arc<MediaService>>,
    AppJson(dto): AppJson<DeleteMediaDto>,
) -> Result<Json<ApiResponse<DeleteMediaResponseDto>>, AppError> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    service.delete_by_url(&dto.url).await?;

    Ok(Json(ApiResponse::success(
        Some(DeleteMediaResponseDto { deleted: true }),
        Some("File deleted successfully".to_string()),
        None,
    )))
}
