use std::sync::Arc;

use axum::{
    routing::{get, put},
    Router,
};

use crate::features::categories::handlers;
use crate::features::categories::services::CategoryService;

/// Public category routes (no authentication required)
pub fn routes(service: Arc<CategoryService>) -> Router {
    Router::new()
        .route("/api/categories", get(handlers::list_categories))
        .route("/api/categories/{slug}", get(handlers::get_category))
        .with_state(service)
}

/// Admin category routes, nested under `/api/admin` behind the auth middleware
pub fn admin_routes(service: Arc<CategoryService>) -> Router {
    Router::new()
        .route(
            "/categories",
            get(handlers::admin_category_tree).post(handlers::create_category),
        )
        .route("/categories/options", get(handlers::category_options))
        .route(
            "/categories/{id}",
            get(handlers::get_category_by_id)
                .put(handlers::update_category)
                .delete(handlers::delete_category),
        )
        .route(
            "/categories/{id}/parent",
            put(handlers::reassign_category_parent),
        )
        .with_state(service)
}
