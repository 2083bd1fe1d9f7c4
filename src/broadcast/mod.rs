//! Live broadcasting of cycle outcomes
//!
//! Dashboards and other in-process consumers subscribe to new matches as they
//! are found. Broadcasting never blocks the scheduler and never fails it: with
//! no subscriber the outcome is simply dropped.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::models::ScanOutcome;

/// Consumer of fresh outcomes
#[async_trait]
pub trait LiveBroadcaster: Send + Sync {
    /// Publish a non-empty outcome
    async fn broadcast(&self, outcome: &ScanOutcome);
}

/// Broadcaster backed by a tokio broadcast channel
pub struct ChannelBroadcaster {
    sender: broadcast::Sender<ScanOutcome>,
}

impl ChannelBroadcaster {
    /// Create a broadcaster retaining up to `capacity` undelivered outcomes per subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to outcomes published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<ScanOutcome> {
        self.sender.subscribe()
    }

    /// Number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ChannelBroadcaster {
    fn default() -> Self {
        Self::new(16)
    }
}

#[async_trait]
impl LiveBroadcaster for ChannelBroadcaster {
    async fn broadcast(&self, outcome: &ScanOutcome) {
        if outcome.is_empty() {
            return;
        }

        match self.sender.send(outcome.clone()) {
            Ok(receivers) => {
                tracing::info!(count = outcome.len(), receivers, "Broadcast new results");
            }
            Err(_) => {
                tracing::debug!(count = outcome.len(), "No live subscribers, broadcast dropped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScrapeResult;

    fn outcome(n: usize) -> ScanOutcome {
        (0..n)
            .map(|i| ScrapeResult::new(format!("http://{i}.onion"), "x"))
            .collect()
    }

    #[tokio::test]
    async fn test_subscriber_receives_outcome() {
        let broadcaster = ChannelBroadcaster::default();
        let mut rx = broadcaster.subscribe();
        assert_eq!(broadcaster.subscriber_count(), 1);

        broadcaster.broadcast(&outcome(2)).await;

        let received = rx.recv().await.unwrap();
        assert_eq!(received.len(), 2);
    }

    #[tokio::test]
    async fn test_no_subscribers_is_silent() {
        let broadcaster = ChannelBroadcaster::new(4);
        broadcaster.broadcast(&outcome(1)).await;
        assert_eq!(broadcaster.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_outcome_not_sent() {
        let broadcaster = ChannelBroadcaster::default();
        let mut rx = broadcaster.subscribe();

        broadcaster.broadcast(&ScanOutcome::new()).await;

        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }
}
