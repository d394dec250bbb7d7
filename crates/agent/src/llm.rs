use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use tiendy_core::config::LlmConfig;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("llm transport failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("llm api error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("llm response could not be decoded: {0}")]
    Decode(String),
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

/// OpenAI-compatible chat-completions client.
pub struct HttpLlmClient {
    client: Client,
    base_url: String,
    api_key: Option<SecretString>,
    model: String,
}

impl HttpLlmClient {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

#[derive(serde::Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(serde::Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(serde::Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(serde::Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(serde::Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage { role: "user", content: prompt }],
            temperature: 0.0,
        };

        let mut builder = self.client.post(&url).json(&request);
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key.expose_secret());
        }

        let response = builder.send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::Api { status, message });
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| LlmError::Decode("completion had no choices".to_string()))
    }
}
