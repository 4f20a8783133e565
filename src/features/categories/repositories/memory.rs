use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::categories::models::{Category, CategoryScope, NewCategory};
use crate::features::categories::repositories::CategoryRepository;
use crate::features::categories::tree::CategoryLookup;

/// Mirrors the table constraints: unique (scope, slug) and restricted parent deletes
#[derive(Default)]
pub struct InMemoryCategoryRepository {
    rows: Mutex<HashMap<Uuid, Category>>,
}

impl InMemoryCategoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_categories(categories: Vec<Category>) -> Self {
        Self {
            rows: Mutex::new(categories.into_iter().map(|c| (c.id, c)).collect()),
        }
    }

    pub fn snapshot(&self) -> Vec<Category> {
        self.rows.lock().unwrap().values().cloned().collect()
    }

    fn slug_taken(
        rows: &HashMap<Uuid, Category>,
        scope: CategoryScope,
        slug: &str,
        except: Option<Uuid>,
    ) -> bool {
        rows.values()
            .any(|c| c.scope == scope && c.slug == slug && Some(c.id) != except)
    }
}

#[async_trait]
impl CategoryLookup for InMemoryCategoryRepository {
    async fn find_category(&self, id: Uuid) -> Result<Option<Category>> {
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }
}

#[async_trait]
impl CategoryRepository for InMemoryCategoryRepository {
    async fn list(&self, scope: CategoryScope, include_inactive: bool) -> Result<Vec<Category>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.scope == scope && (include_inactive || c.is_active))
            .cloned()
            .collect())
    }

    async fn find_by_slug(&self, scope: CategoryScope, slug: &str) -> Result<Option<Category>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|c| c.scope == scope && c.slug == slug)
            .cloned())
    }

    async fn insert(&self, category: NewCategory) -> Result<Category> {
        let mut rows = self.rows.lock().unwrap();
        if Self::slug_taken(&rows, category.scope, &category.slug, None) {
            return Err(AppError::Conflict(
                "A category with this slug already exists".to_string(),
            ));
        }

        let now = Utc::now();
        let created = Category {
            id: Uuid::new_v4(),
            scope: category.scope,
            parent_id: category.parent_id,
            name: category.name,
            slug: category.slug,
            description: category.description,
            image: category.image,
            display_order: category.display_order,
            is_active: category.is_active,
            created_at: now,
            updated_at: now,
        };
        rows.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(&self, category: &Category) -> Result<Category> {
        let mut rows = self.rows.lock().unwrap();
        if Self::slug_taken(&rows, category.scope, &category.slug, Some(category.id)) {
            return Err(AppError::Conflict(
                "A category with this slug already exists".to_string(),
            ));
        }

        let row = rows
            .get_mut(&category.id)
            .ok_or_else(|| AppError::NotFound(format!("Category {} not found", category.id)))?;
        row.name = category.name.clone();
        row.slug = category.slug.clone();
        row.description = category.description.clone();
        row.image = category.image.clone();
        row.display_order = category.display_order;
        row.is_active = category.is_active;
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn set_parent(&self, id: Uuid, parent_id: Option<Uuid>) -> Result<Category> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))?;
        row.parent_id = parent_id;
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn count_children(&self, id: Uuid) -> Result<i64> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.parent_id == Some(id))
            .count() as i64)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        if rows.values().any(|c| c.parent_id == Some(id)) {
            return Err(AppError::Conflict(
                "Category is still referenced by other categories".to_string(),
            ));
        }
        Ok(rows.remove(&id).is_some())
    }

    async fn delete_and_promote(&self, id: Uuid, new_parent: Option<Uuid>) -> Result<u64> {
        let mut rows = self.rows.lock().unwrap();
        if !rows.contains_key(&id) {
            return Err(AppError::NotFound(format!("Category {} not found", id)));
        }

        let mut promoted = 0;
        for row in rows.values_mut().filter(|c| c.parent_id == Some(id)) {
            row.parent_id = new_parent;
            promoted += 1;
        }
        rows.remove(&id);
        Ok(promoted)
    }
}
