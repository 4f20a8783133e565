use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::auth;
use crate::features::categories::{
    dtos as categories_dtos, handlers as categories_handlers, models as categories_models,
};
use crate::features::media::{dtos as media_dtos, handlers as media_handlers};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Categories (public)
        categories_handlers::list_categories,
        categories_handlers::get_category,
        // Categories (admin)
        categories_handlers::admin_category_tree,
        categories_handlers::category_options,
        categories_handlers::create_category,
        categories_handlers::get_category_by_id,
        categories_handlers::update_category,
        categories_handlers::reassign_category_parent,
        categories_handlers::delete_category,
        // Media (admin)
        media_handlers::upload_media,
        media_handlers::list_media,
        media_handlers::delete_media,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Auth
            auth::model::AuthenticatedUser,
            // Categories
            categories_models::CategoryScope,
            categories_dtos::CategoryResponseDto,
            categories_dtos::CategoryTreeDto,
            categories_dtos::CategoryOptionDto,
            categories_dtos::CategoryListingDto,
            categories_dtos::CreateCategoryDto,
            categories_dtos::UpdateCategoryDto,
            categories_dtos::ReassignParentDto,
            categories_dtos::ChildPolicy,
            categories_dtos::DeleteCategoryResponseDto,
            // Media
            media_dtos::UploadMediaDto,
            media_dtos::MediaObjectDto,
            media_dtos::DeleteMediaDto,
            media_dtos::DeleteMediaResponseDto,
            // Response wrappers
            ApiResponse<categories_dtos::CategoryListingDto>,
            ApiResponse<categories_dtos::CategoryResponseDto>,
            ApiResponse<Vec<categories_dtos::CategoryTreeDto>>,
            ApiResponse<Vec<categories_dtos::CategoryOptionDto>>,
            ApiResponse<categories_dtos::DeleteCategoryResponseDto>,
            ApiResponse<media_dtos::MediaObjectDto>,
            ApiResponse<Vec<media_dtos::MediaObjectDto>>,
            ApiResponse<media_dtos::DeleteMediaResponseDto>,
        )
    ),
    tags(
        (name = "categories", description = "Blog and product categories (public)"),
        (name = "admin-categories", description = "Category tree management"),
        (name = "media", description = "Media library uploads and management"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Storefront CMS API",
        version = "0.1.0",
        description = "Content management API for the storefront site and its admin dashboard",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
