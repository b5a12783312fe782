use crate::adapters::html::visible_text;
use crate::domain::ports::PageRenderer;
use crate::utils::error::{Result, VerifyError};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Renders server-side verification pages with a plain HTTP GET.
pub struct HttpPageRenderer {
    client: Client,
    user_agent: String,
}

impl HttpPageRenderer {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            user_agent: user_agent.into(),
        }
    }
}

#[async_trait]
impl PageRenderer for HttpPageRenderer {
    async fn render(&self, url: &Url, timeout: Duration) -> Result<String> {
        tracing::debug!("Making verification request to: {}", url);

        let unreachable = |reason: String| VerifyError::VerificationPageUnreachable {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url.clone())
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| unreachable(e.to_string()))?;

        tracing::debug!("Verification page status: {}", response.status());

        if !response.status().is_success() {
            return Err(unreachable(format!("HTTP {}", response.status())));
        }

        let html = response.text().await?;
        Ok(visible_text(&html))
    }
}
