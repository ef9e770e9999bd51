//! Completion backend client.
//!
//! The backend receives one system and one user message and answers with a
//! single text blob. [`ChatCompletionClient`] speaks the OpenAI-compatible
//! `/chat/completions` format, which most hosted and self-hosted model
//! servers accept.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::CompletionSettings;
use crate::error::CompletionError;
use crate::prompt::Prompt;

/// Default output budget per diagnosis
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 700;

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// A text-generation backend.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// Send the prompt and return the raw response text. No retries.
    async fn complete(
        &self,
        prompt: &Prompt,
        model: &str,
        max_output_tokens: u32,
    ) -> Result<String, CompletionError>;
}

/// Backend used when completion is switched off. Every call fails with
/// [`CompletionError::Disabled`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledBackend;

#[async_trait]
impl CompletionBackend for DisabledBackend {
    fn name(&self) -> &'static str {
        "disabled"
    }

    async fn complete(
        &self,
        _prompt: &Prompt,
        _model: &str,
        _max_output_tokens: u32,
    ) -> Result<String, CompletionError> {
        Err(CompletionError::Disabled)
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

/// OpenAI-compatible chat completions client.
#[derive(Debug, Clone)]
pub struct ChatCompletionClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    api_key_env: String,
}

impl ChatCompletionClient {
    /// Create a client for `base_url` (for example `https://api.openai.com/v1`).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, CompletionError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            api_key_env: String::new(),
        })
    }

    /// Build a client from settings, reading the API key from the configured
    /// environment variable. A missing key is only reported when a request is made.
    pub fn from_settings(settings: &CompletionSettings) -> Result<Self, CompletionError> {
        let mut client = Self::new(
            settings.base_url.clone(),
            Duration::from_secs(settings.timeout_secs),
        )?;
        client.api_key_env.clone_from(&settings.api_key_env);
        client.api_key = std::env::var(&settings.api_key_env)
            .ok()
            .filter(|key| !key.is_empty());
        Ok(client)
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl CompletionBackend for ChatCompletionClient {
    fn name(&self) -> &'static str {
        "chat-completions"
    }

    async fn complete(
        &self,
        prompt: &Prompt,
        model: &str,
        max_output_tokens: u32,
    ) -> Result<String, CompletionError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| CompletionError::MissingApiKey(self.api_key_env.clone()))?;

        let request = ChatRequest {
            model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            max_tokens: max_output_tokens,
            temperature: prompt.temperature,
        };

        debug!(
            endpoint = %self.endpoint(),
            model,
            max_output_tokens,
            "Sending completion request"
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let body = serde_json::from_str::<ApiErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| CompletionError::Malformed(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(CompletionError::EmptyResponse)
    }
}
