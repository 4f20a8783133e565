//! Storage module for media files
//!
//! Provides the MinIO/S3-compatible client behind the `ObjectStore` seam used by
//! the media library.

mod minio_client;
mod sigv4;

use async_trait::async_trait;

use crate::core::error::AppError;

pub use minio_client::MinIOClient;

/// One object returned by a prefix listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub size: u64,
    /// RFC 3339 timestamp as reported by the store
    pub last_modified: String,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<(), AppError>;

    /// All objects whose key starts with `prefix`
    async fn list(&self, prefix: &str) -> Result<Vec<StoredObject>, AppError>;

    async fn delete(&self, key: &str) -> Result<(), AppError>;

    /// Prefix every media key lives under (without trailing slash)
    fn public_prefix(&self) -> &str;

    fn public_url(&self, key: &str) -> String;

    /// Inverse of `public_url`; `None` for URLs outside this bucket
    fn key_from_url(&self, url: &str) -> Option<String>;
}
