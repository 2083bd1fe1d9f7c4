//! Telegram notification channel
//!
//! Sends each notification as a plain-text message through the Bot API
//! `sendMessage` method.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{Channel, ChannelError, ChannelResult, DeliveryStatus};
use crate::notifications::Notification;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Telegram channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token issued by BotFather
    pub token: String,
    /// Chat receiving the messages
    pub chat_id: String,
    /// Bot API base URL, overridable for testing with mock servers
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_api_base() -> String {
    TELEGRAM_API_BASE.to_string()
}

fn default_timeout() -> u64 {
    10
}

impl TelegramConfig {
    /// Create a new Telegram configuration
    pub fn new(token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            chat_id: chat_id.into(),
            api_base: default_api_base(),
            timeout_secs: default_timeout(),
        }
    }

    /// Override the Bot API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.token.trim().is_empty() {
            return Err("Telegram token cannot be empty".to_string());
        }

        if self.chat_id.trim().is_empty() {
            return Err("Telegram chat id cannot be empty".to_string());
        }

        if self.timeout_secs == 0 {
            return Err("Timeout must be greater than 0".to_string());
        }

        Ok(())
    }

    fn send_message_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_base.trim_end_matches('/'),
            self.token
        )
    }
}

#[derive(Debug, Deserialize)]
struct BotApiResponse {
    ok: bool,
    description: Option<String>,
}

/// Telegram notification channel
pub struct TelegramChannel {
    config: TelegramConfig,
    client: Client,
}

impl TelegramChannel {
    /// Create a new Telegram channel
    pub fn new(config: TelegramConfig) -> ChannelResult<Self> {
        config.validate().map_err(ChannelError::InvalidConfig)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ChannelError::Other(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// Chat receiving the messages
    pub fn chat_id(&self) -> &str {
        &self.config.chat_id
    }
}

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send(&self, notification: &Notification) -> ChannelResult<DeliveryStatus> {
        let payload = serde_json::json!({
            "chat_id": self.config.chat_id,
            "text": notification.message,
        });

        let response = self
            .client
            .post(self.config.send_message_url())
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body: BotApiResponse = response
            .json()
            .await
            .map_err(|e| ChannelError::Rejected(format!("HTTP {status}: unreadable reply: {e}")))?;

        if body.ok {
            tracing::info!(chat_id = %self.config.chat_id, "Telegram message sent");
            Ok(DeliveryStatus::success(self.name()))
        } else {
            Err(ChannelError::Rejected(
                body.description
                    .unwrap_or_else(|| format!("HTTP {status}")),
            ))
        }
    }
}
