use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ApiConfig;

/// How much of an undecodable body is echoed to the log
const BODY_PREVIEW_CHARS: usize = 500;

/// Anything that can hand the poller one page of raw API output.
#[async_trait]
pub trait MessageSource: Send + Sync {
    async fn fetch(&self) -> Result<Value>;
}

#[derive(Debug, Serialize)]
struct PageQuery<'a> {
    page: u32,
    limit: u32,
    group_id: &'a str,
}

/// Client for the group chat endpoint
pub struct ChatApiClient {
    client: reqwest::Client,
    config: ApiConfig,
}

impl ChatApiClient {
    pub fn new(config: ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, config })
    }

    /// Fetch one page of group messages as untyped JSON
    pub async fn fetch_group_messages(&self) -> Result<Value> {
        let query = PageQuery {
            page: self.config.page,
            limit: self.config.limit,
            group_id: &self.config.group_id,
        };

        debug!(
            "Fetching {} (page={}, limit={}, group_id={})",
            self.config.url, query.page, query.limit, query.group_id
        );

        let response = self
            .client
            .get(&self.config.url)
            .header("Authorization", format!("Bearer {}", self.config.token))
            .header("Accept", "application/json")
            .query(&query)
            .send()
            .await
            .context("Failed to send request to chat API")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("Chat API error ({}): {}", status, error_body);
        }

        let body = response
            .text()
            .await
            .context("Failed to read chat API response body")?;

        decode_body(&body)
    }
}

#[async_trait]
impl MessageSource for ChatApiClient {
    async fn fetch(&self) -> Result<Value> {
        self.fetch_group_messages().await
    }
}

/// Decode a response body, logging a preview when it is not JSON
pub fn decode_body(body: &str) -> Result<Value> {
    match serde_json::from_str(body) {
        Ok(value) => Ok(value),
        Err(e) => {
            let preview: String = body.chars().take(BODY_PREVIEW_CHARS).collect();
            warn!("Response is not valid JSON: {}", preview);
            Err(e).context("Failed to parse chat API response")
        }
    }
}
