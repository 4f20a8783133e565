mod category;

pub use category::{Category, CategoryChanges, CategoryScope, NewCategory};
