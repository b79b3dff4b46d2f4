use std::time::Duration;

use anyhow::{Error, Result};
use async_trait::async_trait;

use super::core::{ChatSession, generate_content, reply_text};
use crate::core::AppConfig;

/// Anything that can answer the next user message of a chat session.
///
/// The relay only ever talks to the model through this trait so a
/// stub can stand in for the real API.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn send_message(&self, session: &ChatSession, text: &str) -> Result<String, Error>;
}

pub type BoxedChatProvider = Box<dyn ChatProvider + 'static>;

/// Chat provider backed by the Gemini `generateContent` API.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_hostname: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl GeminiProvider {
    pub fn new(api_hostname: &str, api_key: &str, model: &str, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_hostname: api_hostname.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            timeout,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            &config.gemini_api_hostname,
            &config.gemini_api_key,
            &config.gemini_model,
            Duration::from_secs(config.gemini_timeout_secs),
        )
    }
}

#[async_trait]
impl ChatProvider for GeminiProvider {
    async fn send_message(&self, session: &ChatSession, text: &str) -> Result<String, Error> {
        let payload = session.payload(text);

        tracing::debug!(
            model = %self.model,
            history_len = session.history.len(),
            "Sending message to Gemini"
        );

        let resp = generate_content(
            &self.client,
            &payload,
            &self.api_hostname,
            &self.api_key,
            &self.model,
            self.timeout,
        )
        .await?;

        reply_text(&resp)
    }
}
