use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::features::categories::models::{Category, CategoryChanges, CategoryScope};
use crate::shared::validation::SLUG_REGEX;

/// Response DTO for category
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponseDto {
    pub id: Uuid,
    pub scope: CategoryScope,
    pub parent_id: Option<Uuid>,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Category> for CategoryResponseDto {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            scope: c.scope,
            parent_id: c.parent_id,
            name: c.name,
            slug: c.slug,
            description: c.description,
            image: c.image,
            display_order: c.display_order,
            is_active: c.is_active,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

/// One node of a category tree.
///
/// `depth` is 0 for nodes directly under the build root and `path` is the
/// slash-joined slugs from that root down to this node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(no_recursion)]
pub struct CategoryTreeDto {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
    pub depth: usize,
    pub path: String,
    pub children: Vec<CategoryTreeDto>,
}

impl CategoryTreeDto {
    pub(crate) fn from_category(
        category: &Category,
        depth: usize,
        path: String,
        children: Vec<CategoryTreeDto>,
    ) -> Self {
        Self {
            id: category.id,
            parent_id: category.parent_id,
            name: category.name.clone(),
            slug: category.slug.clone(),
            description: category.description.clone(),
            image: category.image.clone(),
            display_order: category.display_order,
            is_active: category.is_active,
            depth,
            path,
            children,
        }
    }
}

/// Flattened, depth-annotated entry for `<select>` style pickers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CategoryOptionDto {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    pub name: String,
    pub slug: String,
    pub depth: usize,
    pub path: String,
    /// Name indented with one "— " per level
    #[schema(example = "— — Pumps")]
    pub label: String,
}

/// Public listing body: flat list or nested tree depending on `tree`
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(untagged)]
pub enum CategoryListingDto {
    Flat(Vec<CategoryResponseDto>),
    Tree(Vec<CategoryTreeDto>),
}

// =============================================================================
// QUERIES
// =============================================================================

/// Query params for listing categories
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListCategoriesQuery {
    /// Taxonomy to list (default: blog)
    #[serde(default)]
    pub scope: CategoryScope,
    /// If true, return tree structure. Default: false (flat list)
    #[serde(default)]
    pub tree: bool,
}

/// Query params selecting a scope
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ScopeQuery {
    #[serde(default)]
    pub scope: CategoryScope,
}

/// Query params for the admin tree
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AdminTreeQuery {
    #[serde(default)]
    pub scope: CategoryScope,
    /// Include inactive categories (default: true)
    #[serde(default = "default_true")]
    pub include_inactive: bool,
}

/// Query params for parent picker options
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ParentOptionsQuery {
    #[serde(default)]
    pub scope: CategoryScope,
    /// Category being edited; it and its descendants are left out
    pub exclude: Option<Uuid>,
}

/// What to do with the children of a deleted category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChildPolicy {
    /// Refuse to delete while children exist
    #[default]
    Restrict,
    /// Move children up to the deleted category's parent
    Promote,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DeleteCategoryQuery {
    #[serde(default)]
    pub children: ChildPolicy,
}

fn default_true() -> bool {
    true
}

// =============================================================================
// REQUESTS
// =============================================================================

fn validate_image_ref(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || value.starts_with('/') {
        return Ok(());
    }

    match reqwest::Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        _ => Err(ValidationError::new("image")
            .with_message("Image must be an http(s) URL or an absolute path".into())),
    }
}

/// Request DTO for creating a category
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCategoryDto {
    #[serde(default)]
    pub scope: CategoryScope,

    pub parent_id: Option<Uuid>,

    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    /// Derived from the name when omitted
    #[validate(
        length(max = 255, message = "Slug must not exceed 255 characters"),
        regex(path = *SLUG_REGEX, message = "Slug must be lowercase words separated by single hyphens")
    )]
    pub slug: Option<String>,

    #[validate(length(max = 5000, message = "Description must not exceed 5000 characters"))]
    pub description: Option<String>,

    #[validate(custom(function = "validate_image_ref"))]
    pub image: Option<String>,

    #[validate(range(min = 0, max = 100000, message = "Display order must be 0-100000"))]
    #[serde(default)]
    pub display_order: i32,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Request DTO for updating a category (hierarchy changes use the parent endpoint)
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateCategoryDto {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,

    #[validate(
        length(max = 255, message = "Slug must not exceed 255 characters"),
        regex(path = *SLUG_REGEX, message = "Slug must be lowercase words separated by single hyphens")
    )]
    pub slug: Option<String>,

    /// Empty string clears the description
    #[validate(length(max = 5000, message = "Description must not exceed 5000 characters"))]
    pub description: Option<String>,

    /// Empty string clears the image
    #[validate(custom(function = "validate_image_ref"))]
    pub image: Option<String>,

    #[validate(range(min = 0, max = 100000, message = "Display order must be 0-100000"))]
    pub display_order: Option<i32>,

    pub is_active: Option<bool>,
}

fn clearable(value: Option<String>) -> Option<Option<String>> {
    value.map(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

impl From<UpdateCategoryDto> for CategoryChanges {
    fn from(dto: UpdateCategoryDto) -> Self {
        Self {
            name: dto.name.map(|n| n.trim().to_string()),
            slug: dto.slug,
            description: clearable(dto.description),
            image: clearable(dto.image),
            display_order: dto.display_order,
            is_active: dto.is_active,
        }
    }
}

/// Request DTO for moving a category under a new parent (`null` = root)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReassignParentDto {
    pub parent_id: Option<Uuid>,
}

/// Response DTO for delete operations
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteCategoryResponseDto {
    pub deleted: bool,
    /// Number of children moved up when `children=promote`
    pub promoted_children: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_dto() -> CreateCategoryDto {
        CreateCategoryDto {
            scope: CategoryScope::Product,
            parent_id: None,
            name: "Pumps".to_string(),
            slug: Some("pumps".to_string()),
            description: None,
            image: Some("https://cdn.example.com/pumps.webp".to_string()),
            display_order: 1,
            is_active: true,
        }
    }

    #[test]
    fn test_create_dto_validation() {
        assert!(create_dto().validate().is_ok());

        let mut bad_slug = create_dto();
        bad_slug.slug = Some("Pumps & Valves".to_string());
        assert!(bad_slug.validate().is_err());

        let mut bad_image = create_dto();
        bad_image.image = Some("javascript:alert(1)".to_string());
        assert!(bad_image.validate().is_err());

        let mut relative_image = create_dto();
        relative_image.image = Some("/media/images/pumps.webp".to_string());
        assert!(relative_image.validate().is_ok());

        let mut empty_name = create_dto();
        empty_name.name = String::new();
        assert!(empty_name.validate().is_err());
    }

    #[test]
    fn test_update_dto_clears_optional_fields() {
        let dto = UpdateCategoryDto {
            description: Some("   ".to_string()),
            image: Some("/media/images/new.png".to_string()),
            ..Default::default()
        };
        let changes: CategoryChanges = dto.into();
        assert_eq!(changes.description, Some(None));
        assert_eq!(
            changes.image,
            Some(Some("/media/images/new.png".to_string()))
        );
        assert!(changes.name.is_none());
    }

    #[test]
    fn test_child_policy_deserializes_lowercase() {
        let query: DeleteCategoryQuery = serde_json::from_str(r#"{"children":"promote"}"#).unwrap();
        assert_eq!(query.children, ChildPolicy::Promote);

        let query: DeleteCategoryQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.children, ChildPolicy::Restrict);
    }
}
