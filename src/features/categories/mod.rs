//! Categories feature
//!
//! Hierarchical taxonomies (`blog` and `product` scopes) stored as a flat
//! parent-pointer list and served as ordered trees.
//!
//! | Method | Path | Access |
//! |--------|------|--------|
//! | GET | `/api/categories?scope=&tree=` | public |
//! | GET | `/api/categories/{slug}?scope=` | public |
//! | GET | `/api/admin/categories?scope=&include_inactive=` | editor |
//! | GET | `/api/admin/categories/options?scope=&exclude=` | editor |
//! | POST | `/api/admin/categories` | admin |
//! | GET | `/api/admin/categories/{id}` | editor |
//! | PUT | `/api/admin/categories/{id}` | admin |
//! | PUT | `/api/admin/categories/{id}/parent` | admin |
//! | DELETE | `/api/admin/categories/{id}?children=restrict\|promote` | admin |

pub mod cache;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod tree;

pub use cache::CategoryTreeCache;
pub use repositories::PgCategoryRepository;
pub use routes::{admin_routes, routes};
pub use services::CategoryService;
