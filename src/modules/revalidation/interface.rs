use anyhow::Result;

/// Tells downstream caches (the public site's ISR layer) which content tags are stale
#[async_trait::async_trait]
pub trait RevalidationProvider: Send + Sync {
    async fn purge_tags(&self, tags: &[String]) -> Result<()>;

    fn name(&self) -> &'static str;
}
