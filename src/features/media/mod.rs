//! Media library
//!
//! Admin uploads for images, documents and videos referenced from CMS content.
//! Objects live in the storage bucket under the public prefix; folders are key
//! segments, not database rows.

pub mod dtos;
pub mod handlers;
pub mod routes;
pub mod services;

pub use routes::routes;
pub use services::MediaService;
