use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::features::media::dtos::MAX_FILE_SIZE;
use crate::features::media::handlers::{delete_media, list_media, upload_media};
use crate::features::media::services::MediaService;

/// Admin media routes, nested under `/api/admin` behind the auth middleware
pub fn routes(media_service: Arc<MediaService>) -> Router {
    Router::new()
        .route("/media", get(list_media).delete(delete_media))
        .route(
            "/media",
            // Allow body size up to MAX_FILE_SIZE + buffer for multipart overhead
            post(upload_media).layer(DefaultBodyLimit::max(MAX_FILE_SIZE + 1024 * 1024)),
        )
        .with_state(media_service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::media::services::MemoryStore;
    use crate::modules::revalidation::NoopProvider;
    use crate::shared::test_helpers::{with_admin_auth, with_editor_auth};
    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;
    use serde_json::{json, Value};

    fn server(store: Arc<MemoryStore>, admin: bool) -> TestServer {
        let service = Arc::new(MediaService::new(store, Arc::new(NoopProvider)));
        let admin_routes = if admin {
            with_admin_auth(routes(service))
        } else {
            with_editor_auth(routes(service))
        };
        TestServer::new(Router::new().nest("/api/admin", admin_routes)).unwrap()
    }

    #[tokio::test]
    async fn test_upload_list_delete() {
        let store = Arc::new(MemoryStore::default());
        let server = server(store.clone(), true);

        let form = MultipartForm::new()
            .add_text("folder", "banners")
            .add_part(
                "file",
                Part::bytes(vec![0x89, 0x50, 0x4e, 0x47])
                    .file_name("hero.png")
                    .mime_type("image/png"),
            );
        let response = server.post("/api/admin/media").multipart(form).await;
        response.assert_status(StatusCode::CREATED);
        let uploaded = response.json::<Value>()["data"].clone();
        assert_eq!(uploaded["folder"], "banners");
        assert_eq!(uploaded["size"], 4);

        let response = server
            .get("/api/admin/media")
            .add_query_param("folder", "banners")
            .await;
        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["meta"]["total"], 1);
        assert_eq!(body["data"][0]["url"], uploaded["url"]);

        server
            .delete("/api/admin/media")
            .json(&json!({ "url": uploaded["url"] }))
            .await
            .assert_status_ok();
        assert!(store.keys().is_empty());
    }

    #[tokio::test]
    async fn test_upload_requires_file_and_admin() {
        let store = Arc::new(MemoryStore::default());

        server(store.clone(), true)
            .post("/api/admin/media")
            .multipart(MultipartForm::new().add_text("folder", "banners"))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let editor = server(store, false);
        editor
            .get("/api/admin/media")
            .await
            .assert_status_ok();
        editor
            .post("/api/admin/media")
            .multipart(MultipartForm::new().add_part(
                "file",
                Part::bytes(vec![1]).file_name("a.pdf").mime_type("application/pdf"),
            ))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_list_with_huge_page_is_empty() {
        let store = Arc::new(MemoryStore::default());
        store.insert("public/images/a.png", "2025-01-01T00:00:00Z");

        let response = server(store, false)
            .get("/api/admin/media")
            .add_query_param("page", i64::MAX)
            .await;
        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["meta"]["total"], 1);
        assert_eq!(body["data"], json!([]));
    }
}
