use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::app_config::{TranslationCommonConfig, TranslationConfig};
use crate::errors::ProviderError;
use crate::language_utils;
use crate::providers::{Provider, TranslationRequest};

/// Client for OpenAI-compatible chat-completions APIs
///
/// Works against OpenRouter, OpenAI and LM Studio. Each call is a single
/// attempt bounded by the client timeout.
pub struct OpenAI {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication, may be empty for local servers
    api_key: String,
    /// Base URL, e.g. `https://openrouter.ai/api/v1`
    endpoint: String,
    /// Model identifier
    model: String,
    /// Prompt template, default temperature and attribution headers
    common: TranslationCommonConfig,
}

impl std::fmt::Debug for OpenAI {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAI")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

/// Chat completion request
#[derive(Debug, Serialize, Default)]
pub struct OpenAIRequest {
    /// The model to use
    model: String,

    /// The messages for the conversation
    messages: Vec<OpenAIMessage>,

    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,

    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,

    /// Content of the message
    pub content: String,
}

/// Message inside a response choice; content can be null on some routers
#[derive(Debug, Deserialize)]
pub struct OpenAIResponseMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// One completion choice
#[derive(Debug, Deserialize)]
pub struct OpenAIChoice {
    pub message: OpenAIResponseMessage,
}

/// Token usage information
#[derive(Debug, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Chat completion response
#[derive(Debug, Deserialize)]
pub struct OpenAIResponse {
    pub choices: Vec<OpenAIChoice>,
    #[serde(default)]
    pub usage: Option<TokenUsage>,
}

impl OpenAIRequest {
    /// Create a new request for a model
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    /// Add a message to the request
    pub fn add_message(mut self, role: impl Into<String>, content: impl Into<String>) -> Self {
        self.messages.push(OpenAIMessage {
            role: role.into(),
            content: content.into(),
        });
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum number of generated tokens
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn messages(&self) -> &[OpenAIMessage] {
        &self.messages
    }
}

/// Map a transport failure to a provider error
fn classify_send_error(error: reqwest::Error) -> ProviderError {
    if error.is_builder() {
        ProviderError::RequestFailed(error.to_string())
    } else {
        ProviderError::ConnectionError(error.to_string())
    }
}

/// Keep log lines and error messages short
fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        format!("{}...", text.chars().take(max_chars).collect::<String>())
    } else {
        text.to_string()
    }
}

impl OpenAI {
    /// Create a new client
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Self::build_client(Duration::from_secs(60)),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            model: model.into(),
            common: TranslationCommonConfig::default(),
        }
    }

    /// Create a client for the active provider of a translation config
    pub fn from_config(config: &TranslationConfig) -> Result<Self> {
        let endpoint = config.get_endpoint();
        Url::parse(&endpoint).map_err(|e| anyhow!("Invalid endpoint '{}': {}", endpoint, e))?;

        Ok(Self {
            client: Self::build_client(config.get_timeout()),
            api_key: config.get_api_key(),
            endpoint,
            model: config.get_model(),
            common: config.common.clone(),
        })
    }

    fn build_client(timeout: Duration) -> Client {
        Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .unwrap_or_default()
    }

    /// Replace the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = Self::build_client(timeout);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Build the chat request for a translation
    pub fn build_request(&self, request: &TranslationRequest) -> OpenAIRequest {
        let system = self.common.render_system_prompt(
            &language_utils::display_name(&request.source_language),
            &language_utils::display_name(&request.target_language),
        );

        OpenAIRequest::new(&self.model)
            .add_message("system", system)
            .add_message("user", &request.text)
            .temperature(request.temperature.unwrap_or(self.common.temperature))
    }

    /// Send one chat completion request
    pub async fn complete(&self, request: &OpenAIRequest) -> Result<OpenAIResponse, ProviderError> {
        let api_url = format!("{}/chat/completions", self.endpoint.trim_end_matches('/'));

        let mut builder = self
            .client
            .post(&api_url)
            .header("Content-Type", "application/json")
            .header("HTTP-Referer", &self.common.referer)
            .header("X-Title", &self.common.app_title)
            .json(request);
        if !self.api_key.is_empty() {
            builder = builder.bearer_auth(&self.api_key);
        }

        let response = builder.send().await.map_err(classify_send_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            let error_text = truncate_text(&error_text, 300);
            debug!("Chat completion API error ({}): {}", status, error_text);
            return Err(ProviderError::from_status(status.as_u16(), error_text));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to read response body: {}", e)))?;

        serde_json::from_str::<OpenAIResponse>(&body).map_err(|e| {
            ProviderError::ParseError(format!("{} (body: {})", e, truncate_text(&body, 200)))
        })
    }

    /// Extract the translated content at `choices[0].message.content`
    pub fn extract_text(response: &OpenAIResponse) -> Result<String, ProviderError> {
        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| ProviderError::ParseError("Response has no choices[0].message.content".to_string()))
    }
}

#[async_trait]
impl Provider for OpenAI {
    async fn translate(&self, request: &TranslationRequest) -> Result<String, ProviderError> {
        let chat_request = self.build_request(request);
        let response = self.complete(&chat_request).await?;

        if let Some(usage) = &response.usage {
            debug!(
                "Chat completion used {} prompt + {} completion tokens",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        Self::extract_text(&response)
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let request = OpenAIRequest::new(&self.model)
            .add_message("system", "You are a helpful assistant.")
            .add_message("user", "Reply with the single word: pong")
            .max_tokens(10);

        let response = self.complete(&request).await?;
        let reply = Self::extract_text(&response)?;
        if reply.to_lowercase().contains("pong") {
            Ok(())
        } else {
            Err(ProviderError::ParseError(format!(
                "Unexpected connection test reply: {}",
                truncate_text(&reply, 50)
            )))
        }
    }

    fn name(&self) -> &str {
        "chat-completions"
    }
}
