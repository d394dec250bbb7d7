use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use tiendy_core::config::WhatsappConfig;
use tiendy_core::UserId;

#[derive(Debug, Error)]
pub enum SendError {
    #[error("message transport failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("message api error {status}: {detail}")]
    Api { status: u16, detail: String },
}

/// Best-effort text delivery. Callers log failures; a failed send never
/// aborts the state transition that produced it.
#[async_trait]
pub trait OutboundMessenger: Send + Sync {
    async fn send_text(&self, user: &UserId, text: &str) -> Result<(), SendError>;
}

#[derive(Default)]
pub struct NoopMessenger;

#[async_trait]
impl OutboundMessenger for NoopMessenger {
    async fn send_text(&self, _user: &UserId, _text: &str) -> Result<(), SendError> {
        Ok(())
    }
}

/// Messenger that records every send; test double shared by the bot and
/// server crates.
#[derive(Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<(UserId, String)>>,
}

#[async_trait]
impl OutboundMessenger for RecordingMessenger {
    async fn send_text(&self, user: &UserId, text: &str) -> Result<(), SendError> {
        self.sent.lock().expect("recorder mutex poisoned").push((user.clone(), text.to_string()));
        Ok(())
    }
}

impl RecordingMessenger {
    pub fn sent(&self) -> Vec<(UserId, String)> {
        self.sent.lock().expect("recorder mutex poisoned").clone()
    }

    pub fn texts_for(&self, user: &UserId) -> Vec<String> {
        self.sent
            .lock()
            .expect("recorder mutex poisoned")
            .iter()
            .filter(|(recipient, _)| recipient == user)
            .map(|(_, text)| text.clone())
            .collect()
    }
}

/// WhatsApp Cloud API sender.
pub struct CloudApiMessenger {
    client: Client,
    api_base_url: String,
    phone_number_id: String,
    token: SecretString,
}

impl CloudApiMessenger {
    pub fn new(config: &WhatsappConfig) -> Result<Self, SendError> {
        let client = Client::builder().timeout(std::time::Duration::from_secs(10)).build()?;
        Ok(Self {
            client,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            phone_number_id: config.phone_number_id.clone(),
            token: config.token.clone(),
        })
    }
}

#[async_trait]
impl OutboundMessenger for CloudApiMessenger {
    async fn send_text(&self, user: &UserId, text: &str) -> Result<(), SendError> {
        let url = format!("{}/{}/messages", self.api_base_url, self.phone_number_id);
        let body = serde_json::json!({
            "messaging_product": "whatsapp",
            "to": user.0,
            "type": "text",
            "text": { "body": text },
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.token.expose_secret())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let detail = response.text().await.unwrap_or_default();
            return Err(SendError::Api { status, detail });
        }

        Ok(())
    }
}
