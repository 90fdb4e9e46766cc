//! Generative Service Providers
//!
//! OpenAI-compatible chat-completions transport used by the gateway. OpenAI, Ollama and custom
//! local servers all speak the same request format; they differ only in endpoint and
//! authentication.

use crate::error::{ConfigError, TransportError};
use crate::gateway::{GenerativeTransport, PromptSpec, RawArtifact};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

/// Provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderType {
    #[default]
    #[serde(rename = "openai")]
    OpenAI,
    Ollama,
    LocalCustom,
}

impl ProviderType {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderType::OpenAI => "openai",
            ProviderType::Ollama => "ollama",
            ProviderType::LocalCustom => "local_custom",
        }
    }

    fn default_base_url(self) -> Option<&'static str> {
        match self {
            ProviderType::OpenAI => Some("https://api.openai.com/v1"),
            ProviderType::Ollama => Some("http://localhost:11434/v1"),
            ProviderType::LocalCustom => None,
        }
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub provider_type: ProviderType,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Base URL ending before `/chat/completions`. Required for `local_custom`.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub default_options: CompletionOptions,
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_type: ProviderType::OpenAI,
            model: default_model(),
            api_key: None,
            base_url: None,
            default_options: CompletionOptions::default(),
        }
    }
}

impl ProviderConfig {
    /// API key from config, falling back to `OPENAI_API_KEY` for the hosted provider.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.is_empty())
            .or_else(|| match self.provider_type {
                ProviderType::OpenAI => std::env::var("OPENAI_API_KEY").ok(),
                _ => None,
            })
    }

    pub fn resolve_base_url(&self) -> Result<String, ConfigError> {
        self.base_url
            .clone()
            .or_else(|| self.provider_type.default_base_url().map(str::to_string))
            .map(|url| url.trim_end_matches('/').to_string())
            .ok_or_else(|| {
                ConfigError::ProviderNotConfigured(format!(
                    "provider '{}' requires base_url",
                    self.provider_type
                ))
            })
    }
}

/// Completion options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionOptions {
    pub temperature: Option<f32>, // 0.0-2.0
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
    /// Ask the service for a JSON object reply where supported.
    #[serde(default)]
    pub json_mode: bool,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: Some(0.7),
            max_tokens: Some(4000),
            top_p: None,
            json_mode: false,
        }
    }
}

impl CompletionOptions {
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

// OpenAI-compatible API request/response structures
#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    model: Option<String>,
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

fn map_http_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout
    } else if let Some(status) = error.status() {
        TransportError::Status {
            status: status.as_u16(),
            body: error.to_string(),
        }
    } else if error.is_connect() {
        TransportError::Connection(error.to_string())
    } else {
        TransportError::Protocol(error.to_string())
    }
}

const PROVIDER_HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const PROVIDER_HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

fn build_provider_http_client() -> Result<Client, ConfigError> {
    Client::builder()
        .no_proxy()
        .connect_timeout(PROVIDER_HTTP_CONNECT_TIMEOUT)
        .timeout(PROVIDER_HTTP_REQUEST_TIMEOUT)
        .build()
        .map_err(|e| ConfigError::Invalid(format!("Failed to create HTTP client: {}", e)))
}

/// Chat-completions client shared by every provider type.
pub struct ChatCompletionsClient {
    client: Client,
    provider_type: ProviderType,
    model: String,
    api_key: Option<String>,
    endpoint: String,
    defaults: CompletionOptions,
}

impl ChatCompletionsClient {
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ConfigError> {
        let api_key = config.resolve_api_key();
        if config.provider_type == ProviderType::OpenAI && api_key.is_none() {
            return Err(ConfigError::ProviderNotConfigured(
                "openai provider requires api_key (or OPENAI_API_KEY)".to_string(),
            ));
        }
        let endpoint = format!("{}/chat/completions", config.resolve_base_url()?);

        Ok(Self {
            client: build_provider_http_client()?,
            provider_type: config.provider_type,
            model: config.model.clone(),
            api_key,
            endpoint,
            defaults: config.default_options.clone(),
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }

    fn build_request<'a>(&'a self, prompt: &'a PromptSpec) -> ChatCompletionRequest<'a> {
        let options = prompt.options.as_ref().unwrap_or(&self.defaults);
        // Only the hosted API is known to honour response_format.
        let response_format = (options.json_mode && self.provider_type == ProviderType::OpenAI)
            .then_some(ResponseFormat {
                kind: "json_object",
            });
        ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            top_p: options.top_p,
            response_format,
            stream: false,
        }
    }
}

#[async_trait]
impl GenerativeTransport for ChatCompletionsClient {
    async fn call(
        &self,
        prompt: &PromptSpec,
        deadline: Instant,
    ) -> Result<RawArtifact, TransportError> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(TransportError::Timeout);
        }

        let mut request = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .timeout(remaining)
            .json(&self.build_request(prompt));
        if let Some(api_key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = request.send().await.map_err(map_http_error)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(TransportError::Status { status, body });
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            TransportError::Protocol(format!("Failed to parse response: {}", e))
        })?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| TransportError::Protocol("No choices in response".to_string()))?;

        Ok(RawArtifact {
            content,
            model: completion.model,
        })
    }

    fn name(&self) -> &str {
        self.provider_type.as_str()
    }
}
