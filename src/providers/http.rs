use super::tables::ensure_not_html;
use super::util::with_retry;
use crate::core::source::{Table, TableSource};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use tracing::{debug, instrument};

const RETRIES: usize = 2;
const RETRY_DELAY_MS: u64 = 300;

/// Fetches `<base_url>/<table>.csv` over HTTP, e.g. from a published spreadsheet export.
pub struct HttpSource {
    base_url: String,
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("cfo-copilot/0.1")
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn get(&self, url: &str, table: Table) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for {} table URL: {}", e, table, url))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for {} table",
                response.status(),
                table
            ));
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl TableSource for HttpSource {
    #[instrument(name = "TableFetch", skip(self), fields(table = %table))]
    async fn fetch_table(&self, table: Table) -> Result<String> {
        let url = format!("{}/{}", self.base_url, table.file_name());
        debug!("Requesting {} from {}", table, url);

        let body = with_retry(|| self.get(&url, table), RETRIES, RETRY_DELAY_MS).await?;
        ensure_not_html(table, &body)?;
        Ok(body)
    }

    fn location(&self) -> String {
        self.base_url.clone()
    }
}
