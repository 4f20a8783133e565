use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::shared::types::PaginationQuery;
use crate::shared::validation::SLUG_REGEX;

/// Maximum upload size in bytes (10MB)
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Allowed MIME types for media uploads
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/svg+xml",
    "application/pdf",
    "video/mp4",
    "video/webm",
];

pub fn is_mime_type_allowed(content_type: &str) -> bool {
    ALLOWED_MIME_TYPES.contains(&content_type)
}

pub fn get_extension_from_content_type(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/svg+xml" => Some("svg"),
        "application/pdf" => Some("pdf"),
        "video/mp4" => Some("mp4"),
        "video/webm" => Some("webm"),
        _ => None,
    }
}

/// Default folder for a MIME type when the upload names none
pub fn infer_folder(content_type: &str) -> &'static str {
    if content_type.starts_with("image/") {
        "images"
    } else if content_type.starts_with("video/") {
        "videos"
    } else {
        "documents"
    }
}

/// Multipart upload form (Swagger UI documentation only; the handler reads
/// the multipart stream directly)
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadMediaDto {
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
    /// Target folder; inferred from the file type when omitted
    #[schema(example = "banners")]
    pub folder: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MediaObjectDto {
    /// Object key in the bucket
    pub key: String,
    pub folder: String,
    /// Public URL to embed in content
    pub url: String,
    /// Size in bytes
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListMediaQuery {
    /// Restrict the listing to one folder
    pub folder: Option<String>,
    #[serde(default = "default_page")]
    #[param(minimum = 1)]
    pub page: i64,
    #[serde(default = "default_page_size")]
    #[param(minimum = 1, maximum = 100)]
    pub page_size: i64,
}

fn default_page() -> i64 {
    PaginationQuery::default().page
}

fn default_page_size() -> i64 {
    PaginationQuery::default().page_size
}

impl ListMediaQuery {
    pub fn pagination(&self) -> PaginationQuery {
        PaginationQuery {
            page: self.page,
            page_size: self.page_size,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct DeleteMediaDto {
    /// Public URL of the object to delete
    #[validate(url(message = "Invalid URL format"))]
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteMediaResponseDto {
    pub deleted: bool,
}

/// Validate an explicit folder name: a slug, optionally nested with '/'
pub fn is_valid_folder(folder: &str) -> bool {
    !folder.is_empty() && folder.split('/').all(|segment| SLUG_REGEX.is_match(segment))
}
