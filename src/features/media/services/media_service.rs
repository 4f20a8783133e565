use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::media::dtos::{
    get_extension_from_content_type, infer_folder, is_mime_type_allowed, is_valid_folder,
    MediaObjectDto, ALLOWED_MIME_TYPES, MAX_FILE_SIZE,
};
use crate::modules::revalidation::RevalidationProvider;
use crate::modules::storage::{ObjectStore, StoredObject};
use crate::shared::constants::TAG_MEDIA;
use crate::shared::types::PaginationQuery;

/// Media library on top of the object store; no database rows are kept
pub struct MediaService {
    store: Arc<dyn ObjectStore>,
    revalidator: Arc<dyn RevalidationProvider>,
}

impl MediaService {
    pub fn new(store: Arc<dyn ObjectStore>, revalidator: Arc<dyn RevalidationProvider>) -> Self {
        Self { store, revalidator }
    }

    /// Store an upload under `{public_prefix}/{folder}/{uuid}.{ext}`.
    ///
    /// `folder` falls back to one inferred from the content type.
    pub async fn upload(
        &self,
        data: Vec<u8>,
        original_filename: &str,
        content_type: &str,
        folder: Option<String>,
    ) -> Result<MediaObjectDto> {
        if data.is_empty() {
            return Err(AppError::BadRequest("File is empty".to_string()));
        }
        if data.len() > MAX_FILE_SIZE {
            return Err(AppError::BadRequest(format!(
                "File too large. Maximum size is {} bytes ({} MB)",
                MAX_FILE_SIZE,
                MAX_FILE_SIZE / 1024 / 1024
            )));
        }
        if !is_mime_type_allowed(content_type) {
            return Err(AppError::BadRequest(format!(
                "File type '{}' is not allowed. Allowed types: {}",
                content_type,
                ALLOWED_MIME_TYPES.join(", ")
            )));
        }

        let folder = match folder.map(|f| f.trim().trim_matches('/').to_string()) {
            Some(f) if !f.is_empty() => {
                if !is_valid_folder(&f) {
                    return Err(AppError::Validation(format!(
                        "Invalid folder '{}': use lowercase words separated by hyphens",
                        f
                    )));
                }
                f
            }
            _ => infer_folder(content_type).to_string(),
        };

        let extension = get_extension_from_content_type(content_type)
            .unwrap_or_else(|| original_filename.rsplit('.').next().unwrap_or("bin"));
        let key = format!(
            "{}/{}/{}.{}",
            self.store.public_prefix(),
            folder,
            Uuid::new_v4(),
            extension
        );
        let size = data.len() as u64;

        self.store.upload(&key, data, content_type).await?;
        info!(
            "Media uploaded: key={}, original_filename={}, size={}",
            key, original_filename, size
        );
        self.revalidate().await;

        Ok(MediaObjectDto {
            url: self.store.public_url(&key),
            key,
            folder,
            size,
            last_modified: Some(Utc::now()),
        })
    }

    /// Objects under a folder (or the whole library), newest first
    pub async fn list(
        &self,
        folder: Option<&str>,
        pagination: &PaginationQuery,
    ) -> Result<(Vec<MediaObjectDto>, i64)> {
        let prefix = match folder.map(|f| f.trim_matches('/')).filter(|f| !f.is_empty()) {
            Some(f) if is_valid_folder(f) => format!("{}/{}/", self.store.public_prefix(), f),
            Some(f) => return Err(AppError::Validation(format!("Invalid folder '{}'", f))),
            None => format!("{}/", self.store.public_prefix()),
        };

        let mut objects: Vec<MediaObjectDto> = self
            .store
            .list(&prefix)
            .await?
            .into_iter()
            .map(|object| self.to_dto(object))
            .collect();
        objects.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));

        let total = objects.len() as i64;
        Ok((pagination.paginate(objects), total))
    }

    pub async fn delete_by_url(&self, url: &str) -> Result<()> {
        let key = self
            .store
            .key_from_url(url)
            .ok_or_else(|| {
                AppError::BadRequest("URL does not belong to the media bucket".to_string())
            })?;

        if !key.starts_with(&format!("{}/", self.store.public_prefix())) || key.contains("..") {
            return Err(AppError::Forbidden(
                "Only media library objects can be deleted".to_string(),
            ));
        }

        self.store.delete(&key).await?;
        info!("Media deleted: key={}", key);
        self.revalidate().await;

        Ok(())
    }

    fn to_dto(&self, object: StoredObject) -> MediaObjectDto {
        let relative = object
            .key
            .strip_prefix(self.store.public_prefix())
            .unwrap_or(&object.key)
            .trim_start_matches('/');
        let folder = relative
            .rsplit_once('/')
            .map(|(folder, _)| folder.to_string())
            .unwrap_or_default();

        MediaObjectDto {
            url: self.store.public_url(&object.key),
            folder,
            size: object.size,
            last_modified: DateTime::parse_from_rfc3339(&object.last_modified)
                .ok()
                .map(|d| d.with_timezone(&Utc)),
            key: object.key,
        }
    }

    async fn revalidate(&self) {
        let tags = [TAG_MEDIA.to_string()];
        if let Err(e) = self.revalidator.purge_tags(&tags).await {
            warn!(
                "Failed to revalidate media via {}: {:#}",
                self.revalidator.name(),
                e
            );
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::modules::revalidation::NoopProvider;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use tokio_test::{assert_err, assert_ok};

    /// Object store kept in a map, with `http://cdn.test/media/` as public base
    #[derive(Default)]
    pub(crate) struct MemoryStore {
        objects: Mutex<BTreeMap<String, StoredObject>>,
    }

    impl MemoryStore {
        pub(crate) fn keys(&self) -> Vec<String> {
            self.objects.lock().unwrap().keys().cloned().collect()
        }

        pub(crate) fn insert(&self, key: &str, last_modified: &str) {
            self.objects.lock().unwrap().insert(
                key.to_string(),
                StoredObject {
                    key: key.to_string(),
                    size: 1,
                    last_modified: last_modified.to_string(),
                },
            );
        }
    }

    #[async_trait]
    impl ObjectStore for MemoryStore {
        async fn upload(
            &self,
            key: &str,
            data: Vec<u8>,
            _content_type: &str,
        ) -> std::result::Result<(), AppError> {
            self.objects.lock().unwrap().insert(
                key.to_string(),
                StoredObject {
                    key: key.to_string(),
                    size: data.len() as u64,
                    last_modified: Utc::now().to_rfc3339(),
                },
            );
            Ok(())
        }

        async fn list(&self, prefix: &str) -> std::result::Result<Vec<StoredObject>, AppError> {
            Ok(self
                .objects
                .lock()
                .unwrap()
                .values()
                .filter(|o| o.key.starts_with(prefix))
                .cloned()
                .collect())
        }

        async fn delete(&self, key: &str) -> std::result::Result<(), AppError> {
            self.objects.lock().unwrap().remove(key);
            Ok(())
        }

        fn public_prefix(&self) -> &str {
            "public"
        }

        fn public_url(&self, key: &str) -> String {
            format!("http://cdn.test/media/{}", key)
        }

        fn key_from_url(&self, url: &str) -> Option<String> {
            url.strip_prefix("http://cdn.test/media/").map(str::to_string)
        }
    }

    fn service() -> (MediaService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::default());
        (
            MediaService::new(store.clone(), Arc::new(NoopProvider)),
            store,
        )
    }

    #[tokio::test]
    async fn test_upload_infers_folder_from_type() {
        let (service, store) = service();

        let image = service
            .upload(vec![1, 2, 3], "banner.PNG", "image/png", None)
            .await
            .unwrap();
        assert_eq!(image.folder, "images");
        assert!(image.key.starts_with("public/images/"));
        assert!(image.key.ends_with(".png"));
        assert_eq!(image.url, format!("http://cdn.test/media/{}", image.key));
        assert_eq!(image.size, 3);

        let doc = service
            .upload(vec![1], "brochure.pdf", "application/pdf", Some("  ".to_string()))
            .await
            .unwrap();
        assert_eq!(doc.folder, "documents");

        let video = service
            .upload(vec![1], "intro.webm", "video/webm", Some("/campaigns/summer/".to_string()))
            .await
            .unwrap();
        assert_eq!(video.folder, "campaigns/summer");

        assert_eq!(store.keys().len(), 3);
    }

    #[tokio::test]
    async fn test_upload_rejections() {
        let (service, store) = service();

        let err = assert_err!(
            service
                .upload(vec![1], "run.exe", "application/x-msdownload", None)
                .await
        );
        assert!(matches!(err, AppError::BadRequest(_)));

        let err = assert_err!(
            service
                .upload(vec![0; MAX_FILE_SIZE + 1], "big.png", "image/png", None)
                .await
        );
        assert!(matches!(err, AppError::BadRequest(_)));

        let err = assert_err!(
            service
                .upload(vec![1], "a.png", "image/png", Some("../etc".to_string()))
                .await
        );
        assert!(matches!(err, AppError::Validation(_)));

        assert!(store.keys().is_empty());
    }

    #[tokio::test]
    async fn test_list_newest_first_with_folders() {
        let (service, store) = service();
        store.insert("public/images/a.png", "2025-01-01T00:00:00.000Z");
        store.insert("public/images/b.png", "2025-03-01T00:00:00.000Z");
        store.insert("public/documents/c.pdf", "2025-02-01T00:00:00.000Z");
        store.insert("private/secret.pdf", "2025-04-01T00:00:00.000Z");

        let (all, total) = service
            .list(None, &PaginationQuery::default())
            .await
            .unwrap();
        assert_eq!(total, 3);
        let keys: Vec<&str> = all.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "public/images/b.png",
                "public/documents/c.pdf",
                "public/images/a.png"
            ]
        );
        assert_eq!(all[1].folder, "documents");

        let (images, total) = service
            .list(Some("images"), &PaginationQuery { page: 2, page_size: 1 })
            .await
            .unwrap();
        assert_eq!(total, 2);
        assert_eq!(images[0].key, "public/images/a.png");

        assert_err!(service.list(Some("../private"), &PaginationQuery::default()).await);
    }

    #[tokio::test]
    async fn test_delete_by_url() {
        let (service, store) = service();
        store.insert("public/images/a.png", "2025-01-01T00:00:00Z");
        store.insert("private/secret.pdf", "2025-01-01T00:00:00Z");

        let err = assert_err!(service.delete_by_url("https://elsewhere.test/a.png").await);
        assert!(matches!(err, AppError::BadRequest(_)));

        let err = assert_err!(
            service
                .delete_by_url("http://cdn.test/media/private/secret.pdf")
                .await
        );
        assert!(matches!(err, AppError::Forbidden(_)));

        assert_ok!(
            service
                .delete_by_url("http://cdn.test/media/public/images/a.png")
                .await
        );
        assert_eq!(store.keys(), vec!["private/secret.pdf".to_string()]);
    }
}
