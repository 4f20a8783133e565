use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::features::categories::dtos::CategoryTreeDto;
use crate::features::categories::models::CategoryScope;

#[derive(Debug, Default)]
struct ScopeEntry {
    generation: u64,
    tree: Option<Arc<Vec<CategoryTreeDto>>>,
}

/// Per-scope cache of the public (active only) category tree.
///
/// Owned by the service and cleared by every category mutation made through it.
/// Each invalidation bumps the scope's generation; a tree built from a read that
/// started under an older generation is never stored.
#[derive(Debug, Default)]
pub struct CategoryTreeCache {
    scopes: RwLock<HashMap<CategoryScope, ScopeEntry>>,
}

impl CategoryTreeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, scope: CategoryScope) -> Option<Arc<Vec<CategoryTreeDto>>> {
        self.scopes
            .read()
            .await
            .get(&scope)
            .and_then(|entry| entry.tree.clone())
    }

    /// Generation to capture before reading the rows a tree is built from
    pub async fn generation(&self, scope: CategoryScope) -> u64 {
        self.scopes
            .read()
            .await
            .get(&scope)
            .map_or(0, |entry| entry.generation)
    }

    /// Store `tree` unless the scope was invalidated after `generation` was taken.
    ///
    /// The tree is returned either way so the caller can still serve it.
    pub async fn put(
        &self,
        scope: CategoryScope,
        generation: u64,
        tree: Vec<CategoryTreeDto>,
    ) -> Arc<Vec<CategoryTreeDto>> {
        let tree = Arc::new(tree);
        let mut scopes = self.scopes.write().await;
        let entry = scopes.entry(scope).or_default();
        if entry.generation == generation {
            entry.tree = Some(tree.clone());
        } else {
            debug!(%scope, "Discarding category tree built before an invalidation");
        }
        tree
    }

    pub async fn invalidate(&self, scope: CategoryScope) {
        let mut scopes = self.scopes.write().await;
        let entry = scopes.entry(scope).or_default();
        entry.generation += 1;
        if entry.tree.take().is_some() {
            debug!(%scope, "Category tree cache invalidated");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scopes_are_cached_independently() {
        let cache = CategoryTreeCache::new();
        assert!(cache.get(CategoryScope::Blog).await.is_none());

        cache.put(CategoryScope::Blog, 0, Vec::new()).await;
        cache.put(CategoryScope::Product, 0, Vec::new()).await;
        assert!(cache.get(CategoryScope::Blog).await.is_some());

        cache.invalidate(CategoryScope::Blog).await;
        assert!(cache.get(CategoryScope::Blog).await.is_none());
        assert!(cache.get(CategoryScope::Product).await.is_some());
    }

    #[tokio::test]
    async fn test_put_after_invalidation_is_discarded() {
        let cache = CategoryTreeCache::new();
        let before = cache.generation(CategoryScope::Blog).await;

        cache.invalidate(CategoryScope::Blog).await;
        let served = cache.put(CategoryScope::Blog, before, Vec::new()).await;
        assert!(served.is_empty());
        assert!(cache.get(CategoryScope::Blog).await.is_none());

        let current = cache.generation(CategoryScope::Blog).await;
        assert_eq!(current, before + 1);
        cache.put(CategoryScope::Blog, current, Vec::new()).await;
        assert!(cache.get(CategoryScope::Blog).await.is_some());
    }
}
