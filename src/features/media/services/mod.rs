mod media_service;

pub use media_service::MediaService;
#[cfg(test)]
pub(crate) use media_service::tests::MemoryStore;
