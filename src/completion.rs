//! Completion Service: one prompt in, one text reply out.
//!
//! The production client speaks the OpenAI-compatible chat-completions envelope used by
//! Groq, OpenRouter and friends. It is built from an explicit [`CompletionConfig`]; nothing
//! here reads global state except the API key fallback variable named in that config.

use crate::config::CompletionConfig;
use crate::error::ServiceError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Anything that can turn a prompt into a reply.
pub trait CompletionService {
    fn complete(&self, prompt: &str, temperature: f32, max_tokens: u32) -> Result<String, ServiceError>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    #[serde(default)]
    content: Option<String>,
}

/// Blocking chat-completions client.
pub struct ChatCompletionClient {
    api_url: String,
    api_key: String,
    model: String,
    top_p: Option<f32>,
    client: reqwest::blocking::Client,
}

impl ChatCompletionClient {
    /// Build a client. The key comes from `config.api_key`, else from the environment
    /// variable named by `config.api_key_env`.
    pub fn new(config: &CompletionConfig) -> Result<Self, ServiceError> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var(&config.api_key_env).ok())
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ServiceError::MissingApiKey {
                env: config.api_key_env.clone(),
            })?;

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            api_url: config.api_url.clone(),
            api_key,
            model: config.model.clone(),
            top_p: config.top_p,
            client,
        })
    }
}

impl CompletionService for ChatCompletionClient {
    fn complete(&self, prompt: &str, temperature: f32, max_tokens: u32) -> Result<String, ServiceError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature,
            top_p: self.top_p,
            max_tokens,
        };

        tracing::debug!(model = %self.model, temperature, max_tokens, "calling completion API");
        let res = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().unwrap_or_default();
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = res
            .json()
            .map_err(|e| ServiceError::Malformed(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ServiceError::Malformed("no choices in completion response".to_string()))
    }
}
