//! Webhook notification channel
//!
//! This module provides a webhook channel for sending messages via HTTP POST requests.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{Channel, ChannelError, ChannelResult, DeliveryStatus};
use crate::notifications::Notification;

/// Webhook channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Webhook URL endpoint
    pub url: String,
    /// Optional authentication token (sent as Bearer token)
    pub auth_token: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    10
}

impl WebhookConfig {
    /// Create a new webhook configuration
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            auth_token: None,
            timeout_secs: default_timeout(),
        }
    }

    /// Set authentication token
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.url.is_empty() {
            return Err("Webhook URL cannot be empty".to_string());
        }

        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err("Webhook URL must start with http:// or https://".to_string());
        }

        if self.timeout_secs == 0 {
            return Err("Timeout must be greater than 0".to_string());
        }

        Ok(())
    }
}

/// Webhook notification channel
///
/// Posts every notification as a JSON object:
///
/// ```json
/// {
///   "id": "notification-uuid",
///   "source": "darkwatch",
///   "message": "Found 2 matches for 'breach'",
///   "created_at": "2024-01-01T12:00:00Z"
/// }
/// ```
///
/// Webhooks go out directly, not through the scanning proxy.
pub struct WebhookChannel {
    config: WebhookConfig,
    client: Client,
}

impl WebhookChannel {
    /// Create a new webhook channel
    pub fn new(config: WebhookConfig) -> ChannelResult<Self> {
        config.validate().map_err(ChannelError::InvalidConfig)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ChannelError::Other(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// Create a simple webhook channel with just a URL
    pub fn from_url(url: impl Into<String>) -> ChannelResult<Self> {
        Self::new(WebhookConfig::new(url))
    }

    /// Get the webhook URL
    pub fn url(&self) -> &str {
        &self.config.url
    }

    fn build_payload(&self, notification: &Notification) -> serde_json::Value {
        serde_json::json!({
            "id": notification.id,
            "source": "darkwatch",
            "message": notification.message,
            "created_at": notification.created_at.to_rfc3339(),
        })
    }
}

#[async_trait]
impl Channel for WebhookChannel {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn send(&self, notification: &Notification) -> ChannelResult<DeliveryStatus> {
        let payload = self.build_payload(notification);

        let mut request = self.client.post(&self.config.url);
        if let Some(token) = &self.config.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.json(&payload).send().await?;
        let status = response.status();

        if status.is_success() {
            tracing::info!(url = %self.config.url, status = %status, "Webhook delivered");
            Ok(DeliveryStatus::success(self.name()))
        } else {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            Err(ChannelError::Rejected(format!("HTTP {status}: {body}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_config_validation() {
        assert!(WebhookConfig::new("https://example.com/webhook").validate().is_ok());
        assert!(WebhookConfig::new("").validate().is_err());
        assert!(WebhookConfig::new("example.com/webhook").validate().is_err());
        assert!(WebhookConfig::new("https://example.com")
            .with_timeout(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_webhook_from_url() {
        let channel = WebhookChannel::from_url("https://example.com/alerts").unwrap();
        assert_eq!(channel.name(), "webhook");
        assert_eq!(channel.url(), "https://example.com/alerts");

        assert!(WebhookChannel::from_url("not-a-url").is_err());
    }

    #[test]
    fn test_webhook_payload_building() {
        let channel = WebhookChannel::from_url("https://example.com/webhook").unwrap();
        let notification = Notification::new("Found 1 matches for 'breach'");

        let payload = channel.build_payload(&notification);

        assert_eq!(payload["source"], "darkwatch");
        assert_eq!(payload["message"], "Found 1 matches for 'breach'");
        assert_eq!(payload["id"], notification.id.as_str());
        assert!(payload["created_at"].is_string());
    }

    #[test]
    fn test_webhook_config_serialization() {
        let config = WebhookConfig::new("https://example.com/webhook")
            .with_auth_token("token")
            .with_timeout(20);

        let json = serde_json::to_string(&config).unwrap();
        let deserialized: WebhookConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(config.url, deserialized.url);
        assert_eq!(config.auth_token, deserialized.auth_token);
        assert_eq!(config.timeout_secs, deserialized.timeout_secs);
    }
}
