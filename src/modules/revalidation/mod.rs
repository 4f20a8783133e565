//! Cache-tag revalidation for the public site.
//!
//! Content mutations call `purge_tags` so statically generated pages that depend on
//! the changed content are rebuilt on the next request.

mod interface;
mod noop;
mod webhook;

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::core::config::{RevalidationConfig, RevalidationKind};

pub use interface::RevalidationProvider;
pub use noop::NoopProvider;

pub fn make_provider(config: &RevalidationConfig) -> Result<Arc<dyn RevalidationProvider>> {
    let provider: Arc<dyn RevalidationProvider> = match config.kind {
        RevalidationKind::Noop => Arc::new(NoopProvider),
        RevalidationKind::Webhook => {
            let url = config
                .webhook_url
                .clone()
                .ok_or_else(|| anyhow::anyhow!("Missing revalidation webhook URL"))?;
            Arc::new(webhook::WebhookProvider::new(
                url,
                config.secret.clone(),
                config.timeout,
            )?)
        }
    };

    info!("Revalidation provider: {}", provider.name());
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_make_provider_selects_kind() {
        let mut config = RevalidationConfig {
            kind: RevalidationKind::Noop,
            webhook_url: None,
            secret: None,
            timeout: Duration::from_secs(1),
        };
        assert_eq!(make_provider(&config).unwrap().name(), "noop");

        config.kind = RevalidationKind::Webhook;
        assert!(make_provider(&config).is_err());

        config.webhook_url = Some("http://localhost:3000/api/revalidate".to_string());
        assert_eq!(make_provider(&config).unwrap().name(), "webhook");
    }
}
