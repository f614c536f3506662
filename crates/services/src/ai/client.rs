use std::env;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors emitted by the text generation client.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GeneratorError {
    #[error("text generation is not configured")]
    Disabled,
    #[error("generator returned an empty response")]
    EmptyResponse,
    #[error("generation request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Connection settings for an OpenAI-compatible chat-completions endpoint.
///
/// The concrete model behind the endpoint is configuration, not code.
#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl GeneratorConfig {
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("STUDYPATH_AI_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let base_url = env::var("STUDYPATH_AI_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".into());
        let model =
            env::var("STUDYPATH_AI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
        Some(Self {
            base_url,
            api_key,
            model,
        })
    }
}

/// Produces raw text from a prompt.
///
/// Implemented by [`ChatClient`] for production and by scripted mocks in
/// tests; the generation service only ever sees this trait.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text from a prompt.
    ///
    /// # Errors
    ///
    /// Returns `GeneratorError` when the generator is disabled, the request
    /// fails, or the response is empty.
    async fn generate(
        &self,
        prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, GeneratorError>;
}

/// Chat-completions client over HTTP.
#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    config: Option<GeneratorConfig>,
}

impl ChatClient {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(GeneratorConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<GeneratorConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }
}

#[async_trait]
impl TextGenerator for ChatClient {
    async fn generate(
        &self,
        prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, GeneratorError> {
        let config = self.config.as_ref().ok_or(GeneratorError::Disabled)?;

        let url = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));
        let payload = ChatRequest {
            model: config.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content: prompt.to_string(),
            }],
            temperature,
            max_tokens,
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&config.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GeneratorError::HttpStatus(response.status()));
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(GeneratorError::EmptyResponse)?;

        Ok(content.trim().to_string())
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_client_is_disabled() {
        let client = ChatClient::new(None);
        assert!(!client.enabled());

        let err = client.generate("prompt", 0.3, 100).await.unwrap_err();
        assert!(matches!(err, GeneratorError::Disabled));
    }
}
