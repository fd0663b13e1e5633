//! Wikipedia summary enricher for the analysis stage.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Url;
use serde::Deserialize;
use tracing::debug;

use crate::error::{ClientError, Result};
use crate::oracle::Enricher;

const SERVICE: &str = "wikipedia";
const DEFAULT_BASE_URL: &str = "https://en.wikipedia.org/api/rest_v1/page/summary";
const AGENT: &str = "ExchangeAdvisor/1.0 (university exchange recommendations)";

/// Summaries longer than this many characters are cut and marked with `...`.
pub const SUMMARY_LIMIT: usize = 400;

#[derive(Deserialize)]
struct SummaryResponse {
    extract: Option<String>,
}

/// Looks up page summaries through the public REST API (no key required).
#[derive(Debug, Clone)]
pub struct WikipediaEnricher {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl WikipediaEnricher {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, Duration::from_secs(5))
    }

    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(AGENT));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| {
                ClientError::config(format!("Failed to create HTTP client: {}", e.without_url()))
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn summary_url(&self, title: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ClientError::config(format!("Invalid base URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::config("Base URL cannot take path segments"))?
            .push(&title.replace(' ', "_"));
        Ok(url)
    }

    /// Summary for one article title, truncated to `SUMMARY_LIMIT`.
    pub async fn summary(&self, title: &str) -> Result<Option<String>> {
        let url = self.summary_url(title)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ClientError::http(SERVICE, e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                service: SERVICE,
                status: status.as_u16(),
            });
        }

        let body: SummaryResponse = response
            .json()
            .await
            .map_err(|e| ClientError::malformed(SERVICE, e.without_url().to_string()))?;

        Ok(body
            .extract
            .filter(|text| !text.trim().is_empty())
            .map(|text| truncate_summary(&text)))
    }
}

#[async_trait]
impl Enricher for WikipediaEnricher {
    /// Try the bare name, then `"name (country)"`.
    async fn fetch_summary(&self, name: &str, country: &str) -> Option<String> {
        let mut titles = vec![name.to_string()];
        if !country.trim().is_empty() {
            titles.push(format!("{name} ({country})"));
        }

        for title in titles {
            match self.summary(&title).await {
                Ok(Some(summary)) => return Some(summary),
                Ok(None) => debug!("No summary text for {}", title),
                Err(err) => debug!("Wikipedia lookup failed for {}: {}", title, err),
            }
        }
        None
    }
}

pub fn truncate_summary(text: &str) -> String {
    if text.chars().count() <= SUMMARY_LIMIT {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(SUMMARY_LIMIT).collect();
    cut.push_str("...");
    cut
}
