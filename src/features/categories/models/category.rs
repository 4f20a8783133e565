use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

/// Which taxonomy a category belongs to; trees never mix scopes
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Type, ToSchema,
)]
#[sqlx(type_name = "category_scope", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CategoryScope {
    #[default]
    Blog,
    Product,
}

impl std::fmt::Display for CategoryScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CategoryScope::Blog => write!(f, "blog"),
            CategoryScope::Product => write!(f, "product"),
        }
    }
}

/// Database model for category
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Category {
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

/// Values for inserting a category
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub scope: CategoryScope,
    pub parent_id: Option<Uuid>,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
}

/// Partial update of the editable (non-hierarchy) fields.
///
/// `description` and `image` are doubly optional: `None` leaves the field alone,
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct CategoryChanges {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<Option<String>>,
    pub image: Option<Option<String>>,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
}

impl CategoryChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.slug.is_none()
            && self.description.is_none()
            && self.image.is_none()
            && self.display_order.is_none()
            && self.is_active.is_none()
    }

    pub fn apply(self, category: &mut Category) {
        if let Some(name) = self.name {
            category.name = name;
        }
        if let Some(slug) = self.slug {
            category.slug = slug;
        }
        if let Some(description) = self.description {
            category.description = description;
        }
        if let Some(image) = self.image {
            category.image = image;
        }
        if let Some(display_order) = self.display_order {
            category.display_order = display_order;
        }
        if let Some(is_active) = self.is_active {
            category.is_active = is_active;
        }
    }
}
