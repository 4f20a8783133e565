use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::json;
use tracing::debug;

use crate::modules::revalidation::interface::RevalidationProvider;

pub const SECRET_HEADER: &str = "x-revalidate-secret";

/// Posts `{"tags": [...]}` to the public site's revalidation endpoint
pub struct WebhookProvider {
    client: Client,
    url: String,
    secret: Option<String>,
}

impl WebhookProvider {
    pub fn new(url: String, secret: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build revalidation HTTP client")?;

        Ok(Self {
            client,
            url,
            secret,
        })
    }
}

#[async_trait::async_trait]
impl RevalidationProvider for WebhookProvider {
    async fn purge_tags(&self, tags: &[String]) -> Result<()> {
        if tags.is_empty() {
            return Ok(());
        }

        let mut request = self.client.post(&self.url).json(&json!({ "tags": tags }));
        if let Some(secret) = &self.secret {
            request = request.header(SECRET_HEADER, secret);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Revalidation request to {} failed", self.url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Revalidation webhook returned {}: {}", status, body);
        }

        debug!(?tags, "Revalidated tags");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "webhook"
    }
}
