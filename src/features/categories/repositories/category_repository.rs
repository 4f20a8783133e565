//! Category persistence.
//!
//! The trait keeps SQL out of the service so business rules can be tested against
//! the in-memory implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::error;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::categories::models::{Category, CategoryScope, NewCategory};
use crate::features::categories::tree::CategoryLookup;

const CATEGORY_COLUMNS: &str = "id, scope, parent_id, name, slug, description, image, \
     display_order, is_active, created_at, updated_at";

#[async_trait]
pub trait CategoryRepository: CategoryLookup {
    /// All categories of a scope, unordered (tree building sorts siblings)
    async fn list(&self, scope: CategoryScope, include_inactive: bool) -> Result<Vec<Category>>;

    async fn find_by_slug(&self, scope: CategoryScope, slug: &str) -> Result<Option<Category>>;

    /// Returns `Conflict` when the slug is already taken in the scope
    async fn insert(&self, category: NewCategory) -> Result<Category>;

    /// Persist the editable fields of an already-merged row
    async fn update(&self, category: &Category) -> Result<Category>;

    async fn set_parent(&self, id: Uuid, parent_id: Option<Uuid>) -> Result<Category>;

    async fn count_children(&self, id: Uuid) -> Result<i64>;

    /// Returns `false` if nothing was deleted
    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// Move the children of `id` under `new_parent`, then delete `id`.
    /// Returns the number of children moved.
    async fn delete_and_promote(&self, id: Uuid, new_parent: Option<Uuid>) -> Result<u64>;
}

/// Map write failures on the `categories` table to client-facing errors
fn map_write_error(e: sqlx::Error, action: &str) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return AppError::Conflict("A category with this slug already exists".to_string());
        }
        if db_err.is_foreign_key_violation() {
            return AppError::Conflict(
                "Category is still referenced by other categories".to_string(),
            );
        }
    }

    error!("Failed to {} category: {:?}", action, e);
    AppError::Database(e)
}

pub struct PgCategoryRepository {
    pool: PgPool,
}

impl PgCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryLookup for PgCategoryRepository {
    async fn find_category(&self, id: Uuid) -> Result<Option<Category>> {
        let sql = format!("SELECT {} FROM categories WHERE id = $1", CATEGORY_COLUMNS);
        sqlx::query_as::<_, Category>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to get category by id: {:?}", e);
                AppError::Database(e)
            })
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    async fn list(&self, scope: CategoryScope, include_inactive: bool) -> Result<Vec<Category>> {
        let sql = format!(
            "SELECT {} FROM categories WHERE scope = $1 AND (is_active OR $2)",
            CATEGORY_COLUMNS
        );
        sqlx::query_as::<_, Category>(&sql)
            .bind(scope)
            .bind(include_inactive)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to list categories: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn find_by_slug(&self, scope: CategoryScope, slug: &str) -> Result<Option<Category>> {
        let sql = format!(
            "SELECT {} FROM categories WHERE scope = $1 AND slug = $2",
            CATEGORY_COLUMNS
        );
        sqlx::query_as::<_, Category>(&sql)
            .bind(scope)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to get category by slug: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn insert(&self, category: NewCategory) -> Result<Category> {
        let sql = format!(
            r#"
            INSERT INTO categories (scope, parent_id, name, slug, description, image, display_order, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            CATEGORY_COLUMNS
        );
        sqlx::query_as::<_, Category>(&sql)
            .bind(category.scope)
            .bind(category.parent_id)
            .bind(&category.name)
            .bind(&category.slug)
            .bind(&category.description)
            .bind(&category.image)
            .bind(category.display_order)
            .bind(category.is_active)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_write_error(e, "create"))
    }

    async fn update(&self, category: &Category) -> Result<Category> {
        let sql = format!(
            r#"
            UPDATE categories
            SET name = $2, slug = $3, description = $4, image = $5,
                display_order = $6, is_active = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            CATEGORY_COLUMNS
        );
        sqlx::query_as::<_, Category>(&sql)
            .bind(category.id)
            .bind(&category.name)
            .bind(&category.slug)
            .bind(&category.description)
            .bind(&category.image)
            .bind(category.display_order)
            .bind(category.is_active)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_write_error(e, "update"))?
            .ok_or_else(|| AppError::NotFound(format!("Category {} not found", category.id)))
    }

    async fn set_parent(&self, id: Uuid, parent_id: Option<Uuid>) -> Result<Category> {
        let sql = format!(
            r#"
            UPDATE categories
            SET parent_id = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            CATEGORY_COLUMNS
        );
        sqlx::query_as::<_, Category>(&sql)
            .bind(id)
            .bind(parent_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_write_error(e, "reassign"))?
            .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))
    }

    async fn count_children(&self, id: Uuid) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM categories WHERE parent_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to count child categories: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_write_error(e, "delete"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_and_promote(&self, id: Uuid, new_parent: Option<Uuid>) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        let promoted = sqlx::query(
            "UPDATE categories SET parent_id = $2, updated_at = NOW() WHERE parent_id = $1",
        )
        .bind(id)
        .bind(new_parent)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "promote children of"))?
        .rows_affected();

        let deleted = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_write_error(e, "delete"))?
            .rows_affected();

        if deleted == 0 {
            tx.rollback().await?;
            return Err(AppError::NotFound(format!("Category {} not found", id)));
        }

        tx.commit().await?;
        Ok(promoted)
    }
}
