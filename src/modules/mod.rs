//! Modules layer - Infrastructure components for external integrations
//!
//! Clients and adapters for object storage and downstream cache revalidation.

pub mod revalidation;
pub mod storage;
