//! Source adapters.
//!
//! An adapter turns a [`SourceConfig`] into a token-shaped JSON payload.
//! Every failure, whether network, HTTP status or parse, comes back as
//! [`DsyncError::Fetch`] so the orchestrator can treat them uniformly.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::figma::extract_tokens;
use super::github::decode_contents;
use super::model::SourceConfig;
use crate::error::{DsyncError, DsyncResult};

const FIGMA_API_URL: &str = "https://api.figma.com/v1";
const GITHUB_API_URL: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("dsync/", env!("CARGO_PKG_VERSION"));

/// Whole-request deadline for every fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches a raw token payload for a source.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    async fn fetch(&self, config: &SourceConfig) -> DsyncResult<Value>;
}

/// Adapter backed by the Figma REST API, the GitHub contents API and plain
/// HTTP GETs.
pub struct HttpSourceAdapter {
    client: reqwest::Client,
    figma_api_url: String,
    github_api_url: String,
}

impl HttpSourceAdapter {
    pub fn new() -> DsyncResult<Self> {
        Self::with_timeout(DEFAULT_FETCH_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> DsyncResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DsyncError::fetch("http", format!("cannot build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            figma_api_url: FIGMA_API_URL.to_string(),
            github_api_url: GITHUB_API_URL.to_string(),
        })
    }

    /// Point the adapter at different API hosts (self-hosted GitHub, proxies).
    pub fn with_api_urls(mut self, figma: impl Into<String>, github: impl Into<String>) -> Self {
        self.figma_api_url = figma.into().trim_end_matches('/').to_string();
        self.github_api_url = github.into().trim_end_matches('/').to_string();
        self
    }

    async fn get_json(&self, source_type: &str, request: reqwest::RequestBuilder) -> DsyncResult<Value> {
        let response = request
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .map_err(|e| DsyncError::fetch(source_type, format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DsyncError::fetch(source_type, format!("HTTP {}: {}", status, body.trim())));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| DsyncError::fetch(source_type, format!("invalid JSON response: {}", e)))
    }
}

#[async_trait]
impl SourceAdapter for HttpSourceAdapter {
    async fn fetch(&self, config: &SourceConfig) -> DsyncResult<Value> {
        debug!(source = %config.summary(), "Fetching tokens");
        match config {
            SourceConfig::Figma {
                file_key,
                access_token,
                node_ids,
            } => {
                let request = if node_ids.is_empty() {
                    self.client.get(format!("{}/files/{}", self.figma_api_url, file_key))
                } else {
                    self.client
                        .get(format!("{}/files/{}/nodes", self.figma_api_url, file_key))
                        .query(&[("ids", node_ids.join(","))])
                };
                let response = self
                    .get_json("figma", request.header("X-Figma-Token", access_token))
                    .await?;
                let tokens = extract_tokens(&response)?;
                Ok(serde_json::to_value(tokens)?)
            }
            SourceConfig::Github {
                owner,
                repo,
                branch,
                path,
                token,
            } => {
                let url = format!(
                    "{}/repos/{}/{}/contents/{}",
                    self.github_api_url,
                    owner,
                    repo,
                    path.trim_start_matches('/')
                );
                let mut request = self
                    .client
                    .get(url)
                    .query(&[("ref", branch.as_str())])
                    .header("Accept", "application/vnd.github+json");
                if let Some(token) = token {
                    request = request.bearer_auth(token);
                }
                let response = self.get_json("github", request).await?;
                decode_contents(&response)
            }
            SourceConfig::Url { url, headers } => {
                let mut request = self.client.get(url);
                for (name, value) in headers {
                    request = request.header(name.as_str(), value.as_str());
                }
                self.get_json("url", request).await
            }
        }
    }
}
