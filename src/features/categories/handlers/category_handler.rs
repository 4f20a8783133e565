use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::core::error::Result;
use crate::core::extractor::AppQuery;
use crate::features::categories::dtos::{
    CategoryListingDto, CategoryResponseDto, ListCategoriesQuery, ScopeQuery,
};
use crate::features::categories::services::CategoryService;
use crate::shared::types::ApiResponse;

/// List active categories
///
/// Returns categories as flat list or tree structure based on `tree` query param.
#[utoipa::path(
    get,
    path = "/api/categories",
    params(ListCategoriesQuery),
    responses(
        (status = 200, description = "List of categories", body = ApiResponse<CategoryListingDto>),
        (status = 400, description = "Invalid query parameters")
    ),
    tag = "categories"
)]
pub async fn list_categories(
    State(service): State<Arc<CategoryService>>,
    AppQuery(query): AppQuery<ListCategoriesQuery>,
) -> Result<Json<ApiResponse<CategoryListingDto>>> {
    let listing = if query.tree {
        CategoryListingDto::Tree(service.list_tree(query.scope).await?)
    } else {
        CategoryListingDto::Flat(service.list(query.scope).await?)
    };

    Ok(Json(ApiResponse::success(Some(listing), None, None)))
}

/// Get category by slug
#[utoipa::path(
    get,
    path = "/api/categories/{slug}",
    params(
        ("slug" = String, Path, description = "Category slug"),
        ScopeQuery
    ),
    responses(
        (status = 200, description = "Category found", body = ApiResponse<CategoryResponseDto>),
        (status = 404, description = "Category not found")
    ),
    tag = "categories"
)]
pub async fn get_category(
    State(service): State<Arc<CategoryService>>,
    Path(slug): Path<String>,
    AppQuery(query): AppQuery<ScopeQuery>,
) -> Result<Json<ApiResponse<CategoryResponseDto>>> {
    let category = service.get_by_slug(query.scope, &slug).await?;
    Ok(Json(ApiResponse::success(Some(category), None, None)))
}
