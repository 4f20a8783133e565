use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::{AppJson, AppQuery};
use crate::features::auth::guards::{RequireAdmin, RequireEditor};
use crate::features::categories::dtos::{
    AdminTreeQuery, CategoryOptionDto, CategoryResponseDto, CategoryTreeDto, CreateCategoryDto,
    DeleteCategoryQuery, DeleteCategoryResponseDto, ParentOptionsQuery, ReassignParentDto,
    UpdateCategoryDto,
};
use crate::features::categories::services::CategoryService;
use crate::shared::types::ApiResponse;

/// Category tree for the admin dashboard
#[utoipa::path(
    get,
    path = "/api/admin/categories",
    params(AdminTreeQuery),
    responses(
        (status = 200, description = "Category tree", body = ApiResponse<Vec<CategoryTreeDto>>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Editor access required")
    ),
    tag = "admin-categories",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn admin_category_tree(
    RequireEditor(_user): RequireEditor,
    State(service): State<Arc<CategoryService>>,
    AppQuery(query): AppQuery<AdminTreeQuery>,
) -> Result<Json<ApiResponse<Vec<CategoryTreeDto>>>> {
    let tree = service
        .admin_tree(query.scope, query.include_inactive)
        .await?;
    Ok(Json(ApiResponse::success(Some(tree), None, None)))
}

/// Flattened parent picker options
///
/// Pass `exclude` with the category being edited so it is never offered itself or
/// one of its descendants as a new parent.
#[utoipa::path(
    get,
    path = "/api/admin/categories/options",
    params(ParentOptionsQuery),
    responses(
        (status = 200, description = "Indented category options", body = ApiResponse<Vec<CategoryOptionDto>>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Editor access required")
    ),
    tag = "admin-categories",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn category_options(
    RequireEditor(_user): RequireEditor,
    State(service): State<Arc<CategoryService>>,
    AppQuery(query): AppQuery<ParentOptionsQuery>,
) -> Result<Json<ApiResponse<Vec<CategoryOptionDto>>>> {
    let options = service.parent_options(query.scope, query.exclude).await?;
    Ok(Json(ApiResponse::success(Some(options), None, None)))
}

#[utoipa::path(
    post,
    path = "/api/admin/categories",
    request_body = CreateCategoryDto,
    responses(
        (status = 201, description = "Category created", body = ApiResponse<CategoryResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin access required"),
        (status = 409, description = "Slug already used in this scope")
    ),
    tag = "admin-categories",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_category(
    RequireAdmin(user): RequireAdmin,
    State(service): State<Arc<CategoryService>>,
    AppJson(dto): AppJson<CreateCategoryDto>,
) -> Result<(StatusCode, Json<ApiResponse<CategoryResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    tracing::debug!("Creating category on behalf of {}", user.sub);
    let category = service.create(dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(category),
            Some("Category created successfully".to_string()),
            None,
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/api/admin/categories/{id}",
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Category found", body = ApiResponse<CategoryResponseDto>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Category not found")
    ),
    tag = "admin-categories",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_category_by_id(
    RequireEditor(_user): RequireEditor,
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<CategoryResponseDto>>> {
    let category = service.get(id).await?;
    Ok(Json(ApiResponse::success(Some(category), None, None)))
}

/// Update category fields (use the parent endpoint to move it)
#[utoipa::path(
    put,
    path = "/api/admin/categories/{id}",
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    request_body = UpdateCategoryDto,
    responses(
        (status = 200, description = "Category updated", body = ApiResponse<CategoryResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Category not found"),
        (status = 409, description = "Slug already used in this scope")
    ),
    tag = "admin-categories",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_category(
    RequireAdmin(_user): RequireAdmin,
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateCategoryDto>,
) -> Result<Json<ApiResponse<CategoryResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let category = service.update(id, dto).await?;
    Ok(Json(ApiResponse::success(
        Some(category),
        Some("Category updated successfully".to_string()),
        None,
    )))
}

/// Move a category under another parent, or to the top level with `parent_id: null`
#[utoipa::path(
    put,
    path = "/api/admin/categories/{id}/parent",
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    request_body = ReassignParentDto,
    responses(
        (status = 200, description = "Category moved", body = ApiResponse<CategoryResponseDto>),
        (status = 400, description = "Invalid parent or circular reference"),
        (status = 404, description = "Category not found")
    ),
    tag = "admin-categories",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn reassign_category_parent(
    RequireAdmin(_user): RequireAdmin,
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<ReassignParentDto>,
) -> Result<Json<ApiResponse<CategoryResponseDto>>> {
    let category = service.reassign_parent(id, dto.parent_id).await?;
    Ok(Json(ApiResponse::success(
        Some(category),
        Some("Category moved successfully".to_string()),
        None,
    )))
}

#[utoipa::path(
    delete,
    path = "/api/admin/categories/{id}",
    params(
        ("id" = Uuid, Path, description = "Category ID"),
        DeleteCategoryQuery
    ),
    responses(
        (status = 200, description = "Category deleted", body = ApiResponse<DeleteCategoryResponseDto>),
        (status = 404, description = "Category not found"),
        (status = 409, description = "Category still has children")
    ),
    tag = "admin-categories",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_category(
    RequireAdmin(_user): RequireAdmin,
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<Uuid>,
    AppQuery(query): AppQuery<DeleteCategoryQuery>,
) -> Result<Json<ApiResponse<DeleteCategoryResponseDto>>> {
    let result = service.delete(id, query.children).await?;
    Ok(Json(ApiResponse::success(
        Some(result),
        Some("Category deleted successfully".to_string()),
        None,
    )))
}
