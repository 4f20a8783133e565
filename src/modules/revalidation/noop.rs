use anyhow::Result;

use crate::modules::revalidation::interface::RevalidationProvider;

pub struct NoopProvider;

#[async_trait::async_trait]
impl RevalidationProvider for NoopProvider {
    async fn purge_tags(&self, tags: &[String]) -> Result<()> {
        tracing::trace!(?tags, "Revalidation disabled, ignoring purge");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}
