/// Chat-completions HTTP client implementation.
///
/// This module provides `LlmClient` for making synchronous requests to an
/// OpenAI-compatible `/chat/completions` endpoint, along with error types and
/// the builder used to configure it. Requests are never retried.
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

/// Default API base URL when neither the builder nor `LLM_BASE_URL` set one.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model when neither the builder nor `LLM_MODEL` set one.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const SYSTEM_PROMPT: &str =
    "You write video tags for football highlight uploads. Reply with a single comma-separated list of tags and nothing else.";

/// Upstream error bodies longer than this are cut before being reported.
const MAX_DETAIL_CHARS: usize = 500;

/// Errors that can occur when calling the text-generation API.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Network-related errors (connection failures, DNS resolution, etc.)
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The request did not complete within the configured timeout
    #[error("Request timed out")]
    Timeout(#[source] reqwest::Error),

    /// Non-success HTTP status, with whatever detail the upstream returned
    #[error("HTTP error: status {status}: {detail}")]
    Http { status: u16, detail: String },

    /// Response body was not the expected JSON
    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    /// Well-formed response without usable content
    #[error("LLM API error: {message}")]
    Api { message: String },

    /// Invalid URL configuration error
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// No API key was configured
    #[error("Missing API key (set LLM_API_KEY)")]
    MissingApiKey,
}

impl LlmError {
    fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err)
        } else {
            Self::Network(err)
        }
    }

    /// Whether the upstream answered at all (as opposed to a transport failure).
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Trait for text generation.
///
/// This trait enables mocking in unit tests and keeps the tag pipeline
/// independent of the HTTP client.
pub trait TextGenerator: Send + Sync {
    /// Sends `prompt` and returns the raw generated text.
    fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Builder for constructing `LlmClient` instances.
///
/// # Examples
///
/// ```
/// use matchtags::llm::LlmClientBuilder;
///
/// let client = LlmClientBuilder::new()
///     .base_url("http://localhost:8080/v1")
///     .api_key("test-key")
///     .model("local-model")
///     .build()
///     .expect("Failed to create client");
/// assert_eq!(client.model(), "local-model");
/// ```
#[derive(Debug, Default)]
pub struct LlmClientBuilder {
    base_url: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    timeout: Option<Duration>,
}

impl LlmClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API base URL, e.g. `https://api.openai.com/v1`.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the whole-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the `LlmClient` with the configured settings.
    ///
    /// # Environment Variables
    ///
    /// Each setting not given to the builder falls back to an environment
    /// variable and then to a default:
    ///
    /// - `LLM_BASE_URL`, default `https://api.openai.com/v1`
    /// - `LLM_API_KEY`, required
    /// - `LLM_MODEL`, default `gpt-4o-mini`
    /// - `LLM_TIMEOUT_SECS`, default 30
    pub fn build(self) -> Result<LlmClient, LlmError> {
        let base_url = self
            .base_url
            .or_else(|| env_non_empty("LLM_BASE_URL"))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = base_url.trim_end_matches('/').to_string();

        let api_key = self
            .api_key
            .or_else(|| env_non_empty("LLM_API_KEY"))
            .ok_or(LlmError::MissingApiKey)?;

        let model = self
            .model
            .or_else(|| env_non_empty("LLM_MODEL"))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let timeout = self.timeout.unwrap_or_else(|| {
            let secs = env_non_empty("LLM_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS);
            Duration::from_secs(secs)
        });

        reqwest::Url::parse(&base_url)
            .map_err(|e| LlmError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(LlmError::Network)?;

        Ok(LlmClient {
            client,
            base_url,
            api_key,
            model,
        })
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Synchronous client for an OpenAI-compatible chat completions API.
///
/// Construct it with [`LlmClientBuilder`].
pub struct LlmClient {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl LlmClient {
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request_body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": prompt }
            ],
            "temperature": 0.4
        });

        debug!(model = %self.model, url = %url, "Calling text generator");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .map_err(LlmError::from_transport)?;

        let status = response.status();
        let body = response.text().map_err(LlmError::from_transport)?;

        if !status.is_success() {
            return Err(LlmError::Http {
                status: status.as_u16(),
                detail: error_detail(&body),
            });
        }

        parse_chat_completion(&body)
    }
}

impl TextGenerator for LlmClient {
    fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        self.complete(prompt)
    }
}

/// Extracts `choices[0].message.content` from a chat completion body.
pub fn parse_chat_completion(body: &str) -> Result<String, LlmError> {
    let json: serde_json::Value = serde_json::from_str(body).map_err(LlmError::Serialization)?;

    json.pointer("/choices/0/message/content")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| LlmError::Api {
            message: "Missing 'choices[0].message.content' in API response".to_string(),
        })
}

/// Prefers the API's `error.message`, falling back to the raw body.
fn error_detail(body: &str) -> String {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| {
            json.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        });
    let detail = from_json.unwrap_or_else(|| body.trim().to_string());
    detail.chars().take(MAX_DETAIL_CHARS).collect()
}
