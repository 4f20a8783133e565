mod category_repository;
#[cfg(test)]
mod memory;

pub use category_repository::{CategoryRepository, PgCategoryRepository};
#[cfg(test)]
pub use memory::InMemoryCategoryRepository;
