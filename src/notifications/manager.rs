//! Notification manager fanning messages out to every registered channel

use async_trait::async_trait;

use super::channels::telegram::{TelegramChannel, TelegramConfig};
use super::channels::webhook::{WebhookChannel, WebhookConfig};
use super::channels::{Channel, ChannelError, ChannelResult};
use super::{Notification, Notifier};
use crate::config::NotificationConfig;

/// Notification manager that routes messages to channels
///
/// Delivery succeeds when at least one channel accepts the message. With no
/// channel registered, messages are only logged.
#[derive(Default)]
pub struct NotificationManager {
    /// Registered notification channels
    channels: Vec<Box<dyn Channel + Send + Sync>>,
}

impl NotificationManager {
    /// Create a new notification manager
    pub fn new() -> Self {
        Self {
            channels: Vec::new(),
        }
    }

    /// Build a manager with every channel present in the configuration
    pub fn from_config(config: &NotificationConfig) -> ChannelResult<Self> {
        let mut manager = Self::new();

        if let (Some(token), Some(chat_id)) = (&config.telegram_token, &config.telegram_chat_id) {
            let channel = TelegramChannel::new(TelegramConfig::new(token, chat_id))?;
            manager.add_channel(Box::new(channel));
        }

        if let Some(url) = &config.webhook_url {
            let mut webhook = WebhookConfig::new(url);
            if let Some(token) = &config.webhook_token {
                webhook = webhook.with_auth_token(token);
            }
            manager.add_channel(Box::new(WebhookChannel::new(webhook)?));
        }

        Ok(manager)
    }

    /// Add a notification channel
    pub fn add_channel(&mut self, channel: Box<dyn Channel + Send + Sync>) {
        self.channels.push(channel);
    }

    /// Add a webhook channel with URL
    pub fn add_webhook_channel(&mut self, url: &str) -> ChannelResult<()> {
        let channel = WebhookChannel::from_url(url)?;
        self.add_channel(Box::new(channel));
        Ok(())
    }

    /// Number of registered channels
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Names of registered channels
    pub fn channel_names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.name()).collect()
    }
}

#[async_trait]
impl Notifier for NotificationManager {
    async fn notify(&self, message: &str) -> ChannelResult<()> {
        if self.channels.is_empty() {
            tracing::info!(message = %message, "Notification (no channel configured)");
            return Ok(());
        }

        let notification = Notification::new(message);
        let mut errors = Vec::new();

        for channel in &self.channels {
            match channel.send(&notification).await {
                Ok(status) if status.success => {}
                Ok(status) => {
                    tracing::error!(channel = channel.name(), status = %status, "Notification not delivered");
                    errors.push(status.to_string());
                }
                Err(e) => {
                    tracing::error!(channel = channel.name(), error = %e, "Failed to send notification");
                    errors.push(format!("{}: {e}", channel.name()));
                }
            }
        }

        if errors.len() == self.channels.len() {
            return Err(ChannelError::Other(errors.join("; ")));
        }

        tracing::info!(message = %message, "Notification sent");
        Ok(())
    }
}
