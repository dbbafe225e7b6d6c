//! Generation capability trait and backend adapters.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;
use tracing::debug;

use crate::error::{Error, Result};

use super::types::{Backend, GenerationRequest};

/// Anything that can turn a premise context into a draft conclusion.
///
/// Implementations may be slow, network-bound and non-deterministic.
/// Failures are returned as [`Error::Generation`] and are never retried here.
#[async_trait]
pub trait GenerationCapability: Send + Sync {
    /// Generate a response for the request's context.
    async fn generate(&self, request: GenerationRequest) -> Result<String>;

    /// Backend this capability talks to.
    fn backend(&self) -> Backend;
}

/// Configuration for backend adapters.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API key
    pub api_key: String,
    /// Base URL override
    pub base_url: Option<String>,
    /// Default model
    pub default_model: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// System prompt sent ahead of the premise context
    pub system_prompt: Option<String>,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
            default_model: None,
            timeout_secs: 120,
            system_prompt: None,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }
}

fn build_http_client(timeout_secs: u64) -> Result<Client> {
    let timeout = Duration::from_secs(timeout_secs);

    // Proxy auto-detection can panic in some sandboxed environments.
    // Fall back to no-proxy in that case.
    match catch_unwind(AssertUnwindSafe(|| {
        Client::builder().timeout(timeout).build()
    })) {
        Ok(Ok(client)) => Ok(client),
        Ok(Err(_)) | Err(_) => Client::builder()
            .no_proxy()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e))),
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

impl ChatMessage {
    fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

/// OpenAI-compatible chat completions client (OpenAI, Groq).
pub struct ChatCompletionsClient {
    backend: Backend,
    config: ClientConfig,
    http: Client,
}

impl ChatCompletionsClient {
    pub fn new(backend: Backend, config: ClientConfig) -> Result<Self> {
        let http = build_http_client(config.timeout_secs)?;
        Ok(Self {
            backend,
            config,
            http,
        })
    }

    pub fn openai(config: ClientConfig) -> Result<Self> {
        Self::new(Backend::OpenAI, config)
    }

    pub fn groq(config: ClientConfig) -> Result<Self> {
        Self::new(Backend::Groq, config)
    }

    fn base_url(&self) -> &str {
        self.config
            .base_url
            .as_deref()
            .or(self.backend.default_base_url())
            .unwrap_or_default()
    }

    fn model(&self) -> String {
        self.config
            .default_model
            .clone()
            .unwrap_or_else(|| self.backend.default_model().to_string())
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::generation(self.backend.to_string(), message)
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionsRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionsResponse {
    choices: Vec<ChatCompletionsChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionsChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionsError {
    error: ChatCompletionsErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionsErrorDetail {
    message: String,
}

#[async_trait]
impl GenerationCapability for ChatCompletionsClient {
    async fn generate(&self, request: GenerationRequest) -> Result<String> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &self.config.system_prompt {
            messages.push(ChatMessage::new("system", system.clone()));
        }
        messages.push(ChatMessage::new("user", request.context));

        let api_request = ChatCompletionsRequest {
            model: self.model(),
            messages,
            max_tokens: request.max_tokens,
        };

        let url = format!("{}/chat/completions", self.base_url());
        debug!(backend = %self.backend, url = %url, "sending generation request");

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("content-type", "application/json")
            .json(&api_request)
            .send()
            .await
            .map_err(|e| self.error(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.error(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            if let Ok(error) = serde_json::from_str::<ChatCompletionsError>(&body) {
                return Err(self.error(format!("API error ({}): {}", status, error.error.message)));
            }
            return Err(self.error(format!("API error ({}): {}", status, body)));
        }

        let api_response: ChatCompletionsResponse = serde_json::from_str(&body)
            .map_err(|e| self.error(format!("Failed to parse response: {}", e)))?;

        api_response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| self.error("No choices in response"))
    }

    fn backend(&self) -> Backend {
        self.backend
    }
}

/// Anthropic messages client.
pub struct AnthropicClient {
    config: ClientConfig,
    http: Client,
}

impl AnthropicClient {
    const API_VERSION: &'static str = "2023-06-01";

    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = build_http_client(config.timeout_secs)?;
        Ok(Self { config, http })
    }

    fn base_url(&self) -> &str {
        self.config
            .base_url
            .as_deref()
            .or(Backend::Anthropic.default_base_url())
            .unwrap_or_default()
    }

    fn error(message: impl Into<String>) -> Error {
        Error::generation(Backend::Anthropic.to_string(), message)
    }
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorDetail,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorDetail {
    message: String,
    #[serde(rename = "type")]
    error_type: String,
}

#[async_trait]
impl GenerationCapability for AnthropicClient {
    async fn generate(&self, request: GenerationRequest) -> Result<String> {
        let api_request = AnthropicRequest {
            model: self
                .config
                .default_model
                .clone()
                .unwrap_or_else(|| Backend::Anthropic.default_model().to_string()),
            messages: vec![ChatMessage::new("user", request.context)],
            max_tokens: request.max_tokens,
            system: self.config.system_prompt.clone(),
        };

        let url = format!("{}/v1/messages", self.base_url());
        debug!(backend = %Backend::Anthropic, url = %url, "sending generation request");

        let response = self
            .http
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", Self::API_VERSION)
            .header("content-type", "application/json")
            .json(&api_request)
            .send()
            .await
            .map_err(|e| Self::error(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Self::error(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            if let Ok(error) = serde_json::from_str::<AnthropicError>(&body) {
                return Err(Self::error(format!(
                    "API error ({}): {}",
                    error.error.error_type, error.error.message
                )));
            }
            return Err(Self::error(format!("API error ({}): {}", status, body)));
        }

        let api_response: AnthropicResponse = serde_json::from_str(&body)
            .map_err(|e| Self::error(format!("Failed to parse response: {}", e)))?;

        Ok(api_response
            .content
            .into_iter()
            .filter_map(|c| c.text)
            .collect::<Vec<_>>()
            .join(""))
    }

    fn backend(&self) -> Backend {
        Backend::Anthropic
    }
}

/// Scripted generator for tests.
///
/// Replays `responses` in order, repeating the last one once exhausted.
/// Every call is counted, including failing ones.
#[cfg(test)]
pub struct MockGenerator {
    responses: Vec<String>,
    fail_with: Option<String>,
    calls: std::sync::atomic::AtomicUsize,
    requests: std::sync::Mutex<Vec<GenerationRequest>>,
}

#[cfg(test)]
impl MockGenerator {
    pub fn new() -> Self {
        Self {
            responses: vec!["Q".to_string()],
            fail_with: None,
            calls: std::sync::atomic::AtomicUsize::new(0),
            requests: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn with_responses<S: Into<String>>(
        mut self,
        responses: impl IntoIterator<Item = S>,
    ) -> Self {
        self.responses = responses.into_iter().map(Into::into).collect();
        self
    }

    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.fail_with = Some(message.into());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl GenerationCapability for MockGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<String> {
        let call = self
            .calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);

        if let Some(message) = &self.fail_with {
            return Err(Error::generation(Backend::Local.to_string(), message.clone()));
        }
        Ok(self
            .responses
            .get(call)
            .or(self.responses.last())
            .cloned()
            .unwrap_or_default())
    }

    fn backend(&self) -> Backend {
        Backend::Local
    }
}
