use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::categories::cache::CategoryTreeCache;
use crate::features::categories::dtos::{
    CategoryOptionDto, CategoryResponseDto, CategoryTreeDto, ChildPolicy, CreateCategoryDto,
    DeleteCategoryResponseDto, UpdateCategoryDto,
};
use crate::features::categories::models::{Category, CategoryChanges, CategoryScope, NewCategory};
use crate::features::categories::repositories::CategoryRepository;
use crate::features::categories::tree::{
    build_tree, ensure_parent_assignable, flatten_tree, without_subtree, CategoryLookup,
};
use crate::modules::revalidation::RevalidationProvider;
use crate::shared::constants::TAG_CATEGORIES;
use crate::shared::validation::slugify;

/// Service for category operations
pub struct CategoryService {
    repository: Arc<dyn CategoryRepository>,
    cache: Arc<CategoryTreeCache>,
    revalidator: Arc<dyn RevalidationProvider>,
}

impl CategoryService {
    pub fn new(
        repository: Arc<dyn CategoryRepository>,
        cache: Arc<CategoryTreeCache>,
        revalidator: Arc<dyn RevalidationProvider>,
    ) -> Self {
        Self {
            repository,
            cache,
            revalidator,
        }
    }

    // =========================================================================
    // PUBLIC
    // =========================================================================

    /// List active categories of a scope (flat, ordered by display order then name)
    pub async fn list(&self, scope: CategoryScope) -> Result<Vec<CategoryResponseDto>> {
        let mut categories = self.repository.list(scope, false).await?;
        categories.sort_by(|a, b| {
            a.display_order
                .cmp(&b.display_order)
                .then_with(|| a.name.cmp(&b.name))
        });

        Ok(categories.into_iter().map(Into::into).collect())
    }

    /// Active tree of a scope, served from the cache when warm
    pub async fn list_tree(&self, scope: CategoryScope) -> Result<Vec<CategoryTreeDto>> {
        if let Some(tree) = self.cache.get(scope).await {
            return Ok(tree.as_ref().clone());
        }

        let generation = self.cache.generation(scope).await;
        let categories = self.repository.list(scope, false).await?;
        let tree = self
            .cache
            .put(scope, generation, build_tree(&categories, None))
            .await;
        Ok(tree.as_ref().clone())
    }

    /// Get an active category by slug
    pub async fn get_by_slug(
        &self,
        scope: CategoryScope,
        slug: &str,
    ) -> Result<CategoryResponseDto> {
        self.repository
            .find_by_slug(scope, slug)
            .await?
            .filter(|c| c.is_active)
            .map(Into::into)
            .ok_or_else(|| AppError::NotFound(format!("Category '{}' not found", slug)))
    }

    // =========================================================================
    // ADMIN
    // =========================================================================

    pub async fn admin_tree(
        &self,
        scope: CategoryScope,
        include_inactive: bool,
    ) -> Result<Vec<CategoryTreeDto>> {
        let categories = self.repository.list(scope, include_inactive).await?;
        Ok(build_tree(&categories, None))
    }

    /// Flattened candidates for a parent picker.
    ///
    /// When `exclude` is set, that category and its descendants are not offered.
    pub async fn parent_options(
        &self,
        scope: CategoryScope,
        exclude: Option<Uuid>,
    ) -> Result<Vec<CategoryOptionDto>> {
        let categories = self.repository.list(scope, true).await?;
        let mut tree = build_tree(&categories, None);
        if let Some(excluded) = exclude {
            tree = without_subtree(tree, excluded);
        }
        Ok(flatten_tree(&tree))
    }

    pub async fn get(&self, id: Uuid) -> Result<CategoryResponseDto> {
        Ok(self.find_existing(id).await?.into())
    }

    pub async fn create(&self, dto: CreateCategoryDto) -> Result<CategoryResponseDto> {
        let name = dto.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::Validation("Name must not be blank".to_string()));
        }

        let slug = match dto.slug {
            Some(slug) => slug,
            None => slugify(&name),
        };
        if slug.is_empty() {
            return Err(AppError::Validation(
                "Could not derive a slug from the name, provide one explicitly".to_string(),
            ));
        }

        if let Some(parent_id) = dto.parent_id {
            self.ensure_parent_in_scope(parent_id, dto.scope).await?;
        }
        self.ensure_slug_available(dto.scope, &slug, None).await?;

        let category = self
            .repository
            .insert(NewCategory {
                scope: dto.scope,
                parent_id: dto.parent_id,
                name,
                slug,
                description: dto.description.filter(|d| !d.trim().is_empty()),
                image: dto.image.filter(|i| !i.is_empty()),
                display_order: dto.display_order,
                is_active: dto.is_active,
            })
            .await?;

        info!(
            "Category created: id={}, scope={}, slug={}",
            category.id, category.scope, category.slug
        );
        self.after_mutation(category.scope).await;

        Ok(category.into())
    }

    pub async fn update(&self, id: Uuid, dto: UpdateCategoryDto) -> Result<CategoryResponseDto> {
        let changes: CategoryChanges = dto.into();
        let mut category = self.find_existing(id).await?;

        if changes.is_empty() {
            return Ok(category.into());
        }
        if let Some(slug) = changes.slug.as_deref() {
            if slug != category.slug {
                self.ensure_slug_available(category.scope, slug, Some(id))
                    .await?;
            }
        }
        if matches!(changes.name.as_deref(), Some("")) {
            return Err(AppError::Validation("Name must not be blank".to_string()));
        }

        changes.apply(&mut category);
        let updated = self.repository.update(&category).await?;

        info!("Category updated: id={}, slug={}", updated.id, updated.slug);
        self.after_mutation(updated.scope).await;

        Ok(updated.into())
    }

    /// Move a category under a new parent (`None` = top level).
    ///
    /// The cycle check runs against the current data before anything is written.
    pub async fn reassign_parent(
        &self,
        id: Uuid,
        parent_id: Option<Uuid>,
    ) -> Result<CategoryResponseDto> {
        let category = self.find_existing(id).await?;

        if category.parent_id == parent_id {
            return Ok(category.into());
        }
        if let Some(parent_id) = parent_id {
            if parent_id != id {
                self.ensure_parent_in_scope(parent_id, category.scope)
                    .await?;
            }
        }
        ensure_parent_assignable(self.repository.as_ref(), id, parent_id).await?;

        let moved = self.repository.set_parent(id, parent_id).await?;

        info!(
            "Category reassigned: id={}, parent_id={:?}",
            moved.id, moved.parent_id
        );
        self.after_mutation(moved.scope).await;

        Ok(moved.into())
    }

    pub async fn delete(&self, id: Uuid, policy: ChildPolicy) -> Result<DeleteCategoryResponseDto> {
        let category = self.find_existing(id).await?;

        let promoted_children = match policy {
            ChildPolicy::Restrict => {
                let children = self.repository.count_children(id).await?;
                if children > 0 {
                    return Err(AppError::Conflict(format!(
                        "Category '{}' has {} child categories; move them first or delete with children=promote",
                        category.slug, children
                    )));
                }
                if !self.repository.delete(id).await? {
                    return Err(AppError::NotFound(format!("Category {} not found", id)));
                }
                0
            }
            ChildPolicy::Promote => {
                self.repository
                    .delete_and_promote(id, category.parent_id)
                    .await?
            }
        };

        info!(
            "Category deleted: id={}, slug={}, promoted_children={}",
            id, category.slug, promoted_children
        );
        self.after_mutation(category.scope).await;

        Ok(DeleteCategoryResponseDto {
            deleted: true,
            promoted_children,
        })
    }

    // =========================================================================
    // HELPERS
    // =========================================================================

    async fn find_existing(&self, id: Uuid) -> Result<Category> {
        self.repository
            .find_category(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))
    }

    async fn ensure_parent_in_scope(&self, parent_id: Uuid, scope: CategoryScope) -> Result<()> {
        let parent = self
            .repository
            .find_category(parent_id)
            .await?
            .ok_or_else(|| {
                AppError::Validation(format!("Parent category {} does not exist", parent_id))
            })?;

        if parent.scope != scope {
            return Err(AppError::Validation(format!(
                "Parent category {} belongs to scope '{}', expected '{}'",
                parent_id, parent.scope, scope
            )));
        }
        Ok(())
    }

    async fn ensure_slug_available(
        &self,
        scope: CategoryScope,
        slug: &str,
        except: Option<Uuid>,
    ) -> Result<()> {
        match self.repository.find_by_slug(scope, slug).await? {
            Some(existing) if Some(existing.id) != except => Err(AppError::Conflict(format!(
                "Slug '{}' is already used in scope '{}'",
                slug, scope
            ))),
            _ => Ok(()),
        }
    }

    /// Drop the cached tree, then tell the public site which pages went stale
    async fn after_mutation(&self, scope: CategoryScope) {
        self.cache.invalidate(scope).await;

        let tags = vec![
            TAG_CATEGORIES.to_string(),
            format!("{}:{}", TAG_CATEGORIES, scope),
        ];
        if let Err(e) = self.revalidator.purge_tags(&tags).await {
            warn!(
                "Failed to revalidate {:?} via {}: {:#}",
                tags,
                self.revalidator.name(),
                e
            );
        }
    }
}
