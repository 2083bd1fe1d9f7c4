//! Outbound notifications
//!
//! The scanner reports two kinds of events as plain-text messages: an endpoint
//! that stayed unreachable after every retry, and the match summary of a cycle.
//! Delivery is best-effort. Callers log a failed [`Notifier::notify`] and move on.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────┐
//! │      NotificationManager (Notifier)        │
//! │  - Message stamping                        │
//! │  - Channel fan-out                         │
//! │  - Per-channel failure logging             │
//! └────────────────────────────────────────────┘
//!                     │
//!             ┌───────┴───────┐
//!             ▼               ▼
//!       ┌──────────┐    ┌─────────┐
//!       │ Telegram │    │ Webhook │
//!       │ Channel  │    │ Channel │
//!       └──────────┘    └─────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use darkwatch::notifications::{NotificationManager, Notifier};
//!
//! let mut manager = NotificationManager::new();
//! manager.add_webhook_channel("https://hooks.example.com/darkwatch")?;
//! manager.notify("Found 2 matches for 'breach'").await?;
//! ```

pub mod channels;
mod manager;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Re-exports
pub use channels::telegram::{TelegramChannel, TelegramConfig};
pub use channels::webhook::{WebhookChannel, WebhookConfig};
pub use channels::{Channel, ChannelError, ChannelResult, DeliveryStatus};
pub use manager::NotificationManager;

/// Sink for operator-facing messages
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `message`
    ///
    /// Errors are reported to the caller, which is expected to log and discard them.
    async fn notify(&self, message: &str) -> ChannelResult<()>;
}

/// A message stamped for delivery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Unique notification identifier
    pub id: String,
    /// Message text
    pub message: String,
    /// When the notification was created
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Create a new notification
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            message: message.into(),
            created_at: Utc::now(),
        }
    }
}

/// Message sent when an endpoint stays unreachable after every attempt
pub fn unreachable_message(url: &str, attempts: u32) -> String {
    format!("Failed to access {url} after {attempts} attempts")
}

/// Message sent after a cycle that produced matches
pub fn match_summary_message(count: usize, query: &str) -> String {
    format!("Found {count} matches for '{query}'")
}
