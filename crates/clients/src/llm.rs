//! Chat-completions client for the language-model gateway.
//!
//! One request shape is needed (system prompt + user prompt, optionally in
//! JSON mode), so the client is small: a configured `reqwest::Client`, a
//! per-request timeout, and bounded retries on transient failures.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ClientError, Result};
use crate::retry::{with_retries, RetryPolicy};

const SERVICE: &str = "llm";

// =============================================================================
// TRAIT
// =============================================================================

/// One chat turn sent to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
    /// Ask the gateway for a JSON object response.
    pub json_mode: bool,
}

impl ChatRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            json_mode: false,
        }
    }

    pub fn json(mut self) -> Self {
        self.json_mode = true;
        self
    }
}

/// Anything that can answer a chat request with the assistant's text.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn chat(&self, request: &ChatRequest) -> Result<String>;
}

// =============================================================================
// CONFIG
// =============================================================================

#[derive(Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
    /// Applied to transient failures only.
    pub retry: RetryPolicy,
}

impl LlmConfig {
    pub const DEFAULT_MODEL: &'static str = "o3-mini";
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
    pub const DEFAULT_MAX_RETRIES: u32 = 2;

    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: Self::DEFAULT_MODEL.to_string(),
            timeout: Self::DEFAULT_TIMEOUT,
            retry: RetryPolicy::new(Self::DEFAULT_MAX_RETRIES, Duration::from_millis(500)),
        }
    }

    /// Read `LLMOD_BASE_URL`, `LLMOD_API_KEY`, `LLMOD_CHAT_MODEL`,
    /// `LLMOD_TIMEOUT_SECONDS` and `LLMOD_MAX_RETRIES`.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("LLMOD_BASE_URL")
            .map_err(|_| ClientError::config("LLMOD_BASE_URL not set"))?;
        let api_key = std::env::var("LLMOD_API_KEY")
            .map_err(|_| ClientError::config("LLMOD_API_KEY not set"))?;

        let mut config = Self::new(base_url, api_key);
        if let Ok(model) = std::env::var("LLMOD_CHAT_MODEL") {
            config.model = model;
        }
        if let Some(secs) = env_parse::<u64>("LLMOD_TIMEOUT_SECONDS") {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = env_parse::<u32>("LLMOD_MAX_RETRIES") {
            config.retry.max_retries = retries;
        }
        Ok(config)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

// =============================================================================
// API TYPES
// =============================================================================

#[derive(Serialize)]
struct ChatApiRequest<'a> {
    model: &'a str,
    messages: [ApiMessage<'a>; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Deserialize)]
struct ChatApiResponse {
    choices: Option<Vec<Choice>>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

// =============================================================================
// CLIENT
// =============================================================================

#[derive(Debug, Clone)]
pub struct LlmClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|_| ClientError::config("Invalid API key format"))?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ClientError::config(format!("Failed to create HTTP client: {}", e.without_url())))?;

        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(LlmConfig::from_env()?)
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    async fn send_once(&self, request: &ChatRequest) -> Result<String> {
        let body = ChatApiRequest {
            model: &self.config.model,
            messages: [
                ApiMessage {
                    role: "system",
                    content: &request.system,
                },
                ApiMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            response_format: request.json_mode.then_some(ResponseFormat {
                format_type: "json_object",
            }),
        };

        let response = self
            .client
            .post(self.chat_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| ClientError::http(SERVICE, e, self.config.timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                service: SERVICE,
                status: status.as_u16(),
            });
        }

        let parsed: ChatApiResponse = response
            .json()
            .await
            .map_err(|e| ClientError::malformed(SERVICE, format!("Invalid JSON: {}", e.without_url())))?;

        parsed
            .choices
            .and_then(|choices| choices.into_iter().next())
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .ok_or_else(|| ClientError::malformed(SERVICE, "No message content in response"))
    }
}

#[async_trait]
impl ChatBackend for LlmClient {
    /// Send the request, retrying transient failures with exponential backoff.
    async fn chat(&self, request: &ChatRequest) -> Result<String> {
        let content = with_retries(SERVICE, self.config.retry, || self.send_once(request)).await?;
        debug!("Chat completion returned {} chars", content.len());
        Ok(content)
    }
}
