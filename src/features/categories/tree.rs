//! Category tree utilities.
//!
//! Categories are stored flat with a `parent_id` back-reference. This module turns
//! such a list into an ordered forest, flattens a forest back into indented picker
//! options, and guards parent reassignments against cycles.
//!
//! Siblings are ordered by `(display_order, name, id)`. Categories whose parent is
//! missing from the input are left out of the forest, and cyclic data never causes
//! unbounded recursion or an endless ancestor walk.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::categories::dtos::{CategoryOptionDto, CategoryTreeDto};
use crate::features::categories::models::Category;

/// Accessor used by the ancestor walk; errors are passed through untouched
#[async_trait]
pub trait CategoryLookup: Send + Sync {
    async fn find_category(&self, id: Uuid) -> Result<Option<Category>>;
}

fn sibling_order(a: &Category, b: &Category) -> Ordering {
    a.display_order
        .cmp(&b.display_order)
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.id.cmp(&b.id))
}

/// Build an ordered forest from a flat list.
///
/// `root = None` builds from the top level; `Some(id)` builds the subtree below
/// `id` (the node itself is not included).
pub fn build_tree(categories: &[Category], root: Option<Uuid>) -> Vec<CategoryTreeDto> {
    let mut children_of: HashMap<Option<Uuid>, Vec<&Category>> =
        HashMap::with_capacity(categories.len());
    for category in categories {
        children_of
            .entry(category.parent_id)
            .or_default()
            .push(category);
    }
    for siblings in children_of.values_mut() {
        siblings.sort_by(|a, b| sibling_order(a, b));
    }

    let mut visited = HashSet::with_capacity(categories.len());
    if let Some(root_id) = root {
        visited.insert(root_id);
    }

    let tree = build_level(&children_of, root, 0, "", &mut visited);

    if root.is_none() && visited.len() < categories.len() {
        debug!(
            excluded = categories.len() - visited.len(),
            "Categories left out of tree (missing parent or cyclic ancestry)"
        );
    }

    tree
}

fn build_level(
    children_of: &HashMap<Option<Uuid>, Vec<&Category>>,
    parent: Option<Uuid>,
    depth: usize,
    parent_path: &str,
    visited: &mut HashSet<Uuid>,
) -> Vec<CategoryTreeDto> {
    let Some(siblings) = children_of.get(&parent) else {
        return Vec::new();
    };

    let mut nodes = Vec::with_capacity(siblings.len());
    for category in siblings {
        if !visited.insert(category.id) {
            warn!(category_id = %category.id, "Category reached twice while building tree, skipping");
            continue;
        }

        let path = if parent_path.is_empty() {
            category.slug.clone()
        } else {
            format!("{}/{}", parent_path, category.slug)
        };
        let children = build_level(children_of, Some(category.id), depth + 1, &path, visited);

        nodes.push(CategoryTreeDto::from_category(category, depth, path, children));
    }
    nodes
}

/// Pre-order flattening: every node is immediately followed by its subtree
pub fn flatten_tree(nodes: &[CategoryTreeDto]) -> Vec<CategoryOptionDto> {
    let mut options = Vec::new();
    flatten_into(nodes, &mut options);
    options
}

fn flatten_into(nodes: &[CategoryTreeDto], options: &mut Vec<CategoryOptionDto>) {
    for node in nodes {
        options.push(CategoryOptionDto {
            id: node.id,
            parent_id: node.parent_id,
            name: node.name.clone(),
            slug: node.slug.clone(),
            depth: node.depth,
            path: node.path.clone(),
            label: format!("{}{}", "— ".repeat(node.depth), node.name),
        });
        flatten_into(&node.children, options);
    }
}

/// Drop `excluded` and everything below it
pub fn without_subtree(nodes: Vec<CategoryTreeDto>, excluded: Uuid) -> Vec<CategoryTreeDto> {
    nodes
        .into_iter()
        .filter(|node| node.id != excluded)
        .map(|mut node| {
            node.children = without_subtree(std::mem::take(&mut node.children), excluded);
            node
        })
        .collect()
}

/// Result of walking `parent_id` links upward
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AncestorChain {
    /// The starting id followed by each ancestor, nearest first
    pub ids: Vec<Uuid>,
    /// The walk met an id twice, i.e. the stored data already has a cycle
    pub cycle_detected: bool,
}

impl AncestorChain {
    pub fn contains(&self, id: Uuid) -> bool {
        self.ids.contains(&id)
    }
}

/// Follow parent links from `start` until the root, a missing category, or a
/// repeated id.
pub async fn ancestor_chain<L>(lookup: &L, start: Uuid) -> Result<AncestorChain>
where
    L: CategoryLookup + ?Sized,
{
    let mut ids = Vec::new();
    let mut visited = HashSet::new();
    let mut cycle_detected = false;
    let mut current = Some(start);

    while let Some(id) = current {
        if !visited.insert(id) {
            cycle_detected = true;
            warn!(
                category_id = %id,
                start = %start,
                "Existing category ancestry is cyclic, stopping walk"
            );
            break;
        }
        ids.push(id);
        current = lookup
            .find_category(id)
            .await?
            .and_then(|category| category.parent_id);
    }

    Ok(AncestorChain {
        ids,
        cycle_detected,
    })
}

/// Reject a parent assignment that would make `category_id` its own ancestor.
///
/// Must run before the new parent is written.
pub async fn ensure_parent_assignable<L>(
    lookup: &L,
    category_id: Uuid,
    new_parent_id: Option<Uuid>,
) -> Result<()>
where
    L: CategoryLookup + ?Sized,
{
    let Some(parent_id) = new_parent_id else {
        return Ok(());
    };

    if parent_id == category_id {
        return Err(AppError::Validation(format!(
            "Category {} cannot be its own parent",
            category_id
        )));
    }

    let chain = ancestor_chain(lookup, parent_id).await?;
    if chain.contains(category_id) {
        return Err(AppError::Validation(format!(
            "Moving category {} under {} would create a circular reference",
            category_id, parent_id
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::categories::models::CategoryScope;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
    use tokio_test::{assert_err, assert_ok};

    fn category(name: &str, order: i32, parent: Option<Uuid>) -> Category {
        Category {
            id: Uuid::new_v4(),
            scope: CategoryScope::Blog,
            parent_id: parent,
            name: name.to_string(),
            slug: name.to_lowercase().replace(' ', "-"),
            description: None,
            image: None,
            display_order: order,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    struct MapLookup {
        categories: HashMap<Uuid, Category>,
        calls: AtomicUsize,
    }

    impl MapLookup {
        fn new(categories: &[Category]) -> Self {
            Self {
                categories: categories.iter().map(|c| (c.id, c.clone())).collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl CategoryLookup for MapLookup {
        async fn find_category(&self, id: Uuid) -> Result<Option<Category>> {
            self.calls.fetch_add(1, AtomicOrdering::SeqCst);
            Ok(self.categories.get(&id).cloned())
        }
    }

    struct FailingLookup;

    #[async_trait]
    impl CategoryLookup for FailingLookup {
        async fn find_category(&self, _id: Uuid) -> Result<Option<Category>> {
            Err(AppError::Database(sqlx::Error::PoolTimedOut))
        }
    }

    fn names(nodes: &[CategoryTreeDto]) -> Vec<&str> {
        nodes.iter().map(|n| n.name.as_str()).collect()
    }

    /// "name(child,child)" rendering used to compare tree shapes
    fn shape(nodes: &[CategoryTreeDto]) -> String {
        nodes
            .iter()
            .map(|n| {
                if n.children.is_empty() {
                    n.name.clone()
                } else {
                    format!("{}({})", n.name, shape(&n.children))
                }
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Blog
    /// ├── News
    /// │   ├── Company
    /// │   └── Industry
    /// │       └── Pumps
    /// └── Guides
    fn sample() -> Vec<Category> {
        let blog = category("Blog", 0, None);
        let news = category("News", 0, Some(blog.id));
        let guides = category("Guides", 1, Some(blog.id));
        let company = category("Company", 0, Some(news.id));
        let industry = category("Industry", 0, Some(news.id));
        let pumps = category("Pumps", 0, Some(industry.id));
        vec![pumps, guides, company, blog, industry, news]
    }

    #[test]
    fn test_empty_input_builds_empty_tree() {
        assert!(build_tree(&[], None).is_empty());
        assert!(flatten_tree(&[]).is_empty());
    }

    #[test]
    fn test_sibling_order_by_display_order_then_name() {
        let a = category("A", 2, None);
        let b = category("B", 1, None);
        let c = category("C", 1, None);
        let tree = build_tree(&[a, c, b], None);
        assert_eq!(names(&tree), vec!["B", "C", "A"]);
    }

    #[test]
    fn test_depth_and_path_follow_ancestry() {
        let categories = sample();
        let tree = build_tree(&categories, None);

        assert_eq!(shape(&tree), "Blog(News(Company,Industry(Pumps)),Guides)");

        let options = flatten_tree(&tree);
        let by_id: HashMap<Uuid, &Category> = categories.iter().map(|c| (c.id, c)).collect();

        for option in &options {
            let mut ancestors = Vec::new();
            let mut current = by_id[&option.id].parent_id;
            while let Some(id) = current {
                ancestors.push(by_id[&id].slug.clone());
                current = by_id[&id].parent_id;
            }
            assert_eq!(option.depth, ancestors.len());

            ancestors.reverse();
            ancestors.push(option.slug.clone());
            assert_eq!(option.path, ancestors.join("/"));
        }

        let pumps = options.iter().find(|o| o.name == "Pumps").unwrap();
        assert_eq!(pumps.path, "blog/news/industry/pumps");
        assert_eq!(pumps.label, "— — — Pumps");
    }

    #[test]
    fn test_build_is_independent_of_input_order() {
        let categories = sample();
        let mut reversed = categories.clone();
        reversed.reverse();
        let mut rotated = categories.clone();
        rotated.rotate_left(2);

        let expected = build_tree(&categories, None);
        assert_eq!(build_tree(&reversed, None), expected);
        assert_eq!(build_tree(&rotated, None), expected);
    }

    #[test]
    fn test_orphans_are_excluded() {
        let mut categories = sample();
        let orphan = category("Orphan", 0, Some(Uuid::new_v4()));
        let orphan_child = category("Orphan Child", 0, Some(orphan.id));
        categories.push(orphan);
        categories.push(orphan_child);

        let options = flatten_tree(&build_tree(&categories, None));
        assert_eq!(options.len(), 6);
        assert!(options.iter().all(|o| !o.name.starts_with("Orphan")));
    }

    #[test]
    fn test_build_rooted_at_subtree() {
        let categories = sample();
        let news = categories.iter().find(|c| c.name == "News").unwrap();

        let subtree = build_tree(&categories, Some(news.id));
        assert_eq!(shape(&subtree), "Company,Industry(Pumps)");
        assert_eq!(subtree[0].depth, 0);
        assert_eq!(subtree[1].children[0].path, "industry/pumps");
    }

    #[test]
    fn test_build_terminates_on_cyclic_data() {
        let mut a = category("A", 0, None);
        let mut b = category("B", 0, None);
        a.parent_id = Some(b.id);
        b.parent_id = Some(a.id);
        let categories = vec![a.clone(), b];

        // Neither is reachable from the top level
        assert!(build_tree(&categories, None).is_empty());

        // Rooting inside the cycle visits each node once
        let subtree = build_tree(&categories, Some(a.id));
        assert_eq!(shape(&subtree), "B");
    }

    #[test]
    fn test_flatten_round_trip() {
        let categories = sample();
        let tree = build_tree(&categories, None);
        let options = flatten_tree(&tree);

        // Re-derive parents from depth alone using a stack of open ancestors
        let mut stack: Vec<Uuid> = Vec::new();
        let mut rebuilt = Vec::new();
        for option in &options {
            stack.truncate(option.depth);
            let derived_parent = stack.last().copied();
            assert_eq!(derived_parent, option.parent_id);

            let original = categories.iter().find(|c| c.id == option.id).unwrap();
            let mut copy = original.clone();
            copy.parent_id = derived_parent;
            rebuilt.push(copy);

            stack.push(option.id);
        }

        assert_eq!(build_tree(&rebuilt, None), tree);
    }

    #[test]
    fn test_without_subtree_removes_descendants() {
        let categories = sample();
        let news = categories.iter().find(|c| c.name == "News").unwrap();

        let pruned = without_subtree(build_tree(&categories, None), news.id);
        assert_eq!(shape(&pruned), "Blog(Guides)");
    }

    #[tokio::test]
    async fn test_move_to_root_is_always_allowed() {
        let lookup = FailingLookup;
        assert_ok!(ensure_parent_assignable(&lookup, Uuid::new_v4(), None).await);
    }

    #[tokio::test]
    async fn test_self_parent_rejected_without_lookups() {
        let lookup = MapLookup::new(&[]);
        let id = Uuid::new_v4();

        let err = ensure_parent_assignable(&lookup, id, Some(id))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(lookup.calls.load(AtomicOrdering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_transitive_cycle_rejected() {
        let a = category("A", 0, None);
        let b = category("B", 0, Some(a.id));
        let c = category("C", 0, Some(b.id));
        let lookup = MapLookup::new(&[a.clone(), b.clone(), c.clone()]);

        let err = ensure_parent_assignable(&lookup, a.id, Some(c.id))
            .await
            .unwrap_err();
        match err {
            AppError::Validation(msg) => {
                assert!(msg.contains("circular reference"));
                assert!(msg.contains(&a.id.to_string()));
                assert!(msg.contains(&c.id.to_string()));
            }
            other => panic!("expected validation error, got {:?}", other),
        }

        // Moving within unrelated branches stays legal
        let d = category("D", 0, None);
        let lookup = MapLookup::new(&[a.clone(), b, c.clone(), d.clone()]);
        assert_ok!(ensure_parent_assignable(&lookup, d.id, Some(c.id)).await);
        assert_ok!(ensure_parent_assignable(&lookup, c.id, Some(d.id)).await);
    }

    #[tokio::test]
    async fn test_ancestor_walk_stops_on_existing_cycle() {
        let mut a = category("A", 0, None);
        let mut b = category("B", 0, None);
        let mut c = category("C", 0, None);
        a.parent_id = Some(c.id);
        b.parent_id = Some(a.id);
        c.parent_id = Some(b.id);
        let lookup = MapLookup::new(&[a.clone(), b.clone(), c.clone()]);

        let chain = ancestor_chain(&lookup, a.id).await.unwrap();
        assert!(chain.cycle_detected);
        assert_eq!(chain.ids, vec![a.id, c.id, b.id]);

        // An unrelated category can still be checked against the broken branch
        let outsider = category("Outsider", 0, None);
        let lookup = MapLookup::new(&[a.clone(), b, c, outsider.clone()]);
        assert_ok!(ensure_parent_assignable(&lookup, outsider.id, Some(a.id)).await);
    }

    #[tokio::test]
    async fn test_missing_parent_ends_walk() {
        let ghost_parent = Uuid::new_v4();
        let child = category("Child", 0, Some(ghost_parent));
        let lookup = MapLookup::new(&[child.clone()]);

        let chain = ancestor_chain(&lookup, child.id).await.unwrap();
        assert_eq!(chain.ids, vec![child.id, ghost_parent]);
        assert!(!chain.cycle_detected);
    }

    #[tokio::test]
    async fn test_lookup_errors_propagate() {
        let result =
            ensure_parent_assignable(&FailingLookup, Uuid::new_v4(), Some(Uuid::new_v4())).await;
        let err = assert_err!(result);
        assert!(matches!(err, AppError::Database(sqlx::Error::PoolTimedOut)));
    }
}
