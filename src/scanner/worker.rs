//! Fetch one endpoint with retries and match the keyword

use std::sync::Arc;
use std::time::Duration;

use super::FailureTracker;
use crate::config::Config;
use crate::metrics;
use crate::models::{ScanQuery, ScrapeResult};
use crate::notifications::{unreachable_message, Notifier};
use crate::parser::extract_text;
use crate::proxy::PageSource;
use crate::utils::retry::RetryConfig;
use crate::utils::truncate_chars;

/// Fetches a single endpoint, retrying failed attempts with exponential backoff
pub struct FetchWorker {
    source: Arc<dyn PageSource>,
    tracker: Arc<FailureTracker>,
    notifier: Arc<dyn Notifier>,
    retry: RetryConfig,
    timeout: Duration,
    excerpt_max_chars: usize,
}

impl FetchWorker {
    pub fn new(
        source: Arc<dyn PageSource>,
        tracker: Arc<FailureTracker>,
        notifier: Arc<dyn Notifier>,
        retry: RetryConfig,
        timeout: Duration,
        excerpt_max_chars: usize,
    ) -> Self {
        Self {
            source,
            tracker,
            notifier,
            retry,
            timeout,
            excerpt_max_chars,
        }
    }

    /// Build a worker with the scanner settings of `config`
    pub fn from_config(
        source: Arc<dyn PageSource>,
        tracker: Arc<FailureTracker>,
        notifier: Arc<dyn Notifier>,
        config: &Config,
    ) -> Self {
        Self::new(
            source,
            tracker,
            notifier,
            config.retry(),
            config.fetch_timeout(),
            config.scanner.excerpt_max_chars,
        )
    }

    /// Failure counters shared with this worker
    pub fn tracker(&self) -> &Arc<FailureTracker> {
        &self.tracker
    }

    /// Fetch `endpoint` and return a result if its text contains `query`
    ///
    /// Any successful fetch resets the endpoint's failure counter, match or not.
    /// Once the counter reaches the retry limit the endpoint is reported through
    /// the notifier, its counter is cleared and `None` is returned.
    pub async fn fetch(&self, endpoint: &str, query: &ScanQuery) -> Option<ScrapeResult> {
        let max_retries = self.retry.max_retries;

        for attempt in 0..max_retries {
            let error = match self.source.fetch_text(endpoint, self.timeout).await {
                Ok(body) => {
                    self.tracker.reset(endpoint);
                    return self.match_page(endpoint, &body, query);
                }
                Err(e) => e,
            };

            metrics::record_fetch_failure();
            let failures = self.tracker.increment(endpoint);
            tracing::warn!(
                url = %endpoint,
                attempt = attempt + 1,
                max_retries,
                failures,
                error = %error,
                "Fetch attempt failed"
            );

            if failures >= max_retries {
                self.give_up(endpoint, max_retries).await;
                return None;
            }

            if !self.retry.is_last_attempt(attempt) {
                tokio::time::sleep(self.retry.delay_after(attempt)).await;
            }
        }

        None
    }

    fn match_page(&self, endpoint: &str, body: &str, query: &ScanQuery) -> Option<ScrapeResult> {
        let text = extract_text(body);

        if !query.matches(&text.to_lowercase()) {
            tracing::debug!(url = %endpoint, "No match");
            return None;
        }

        tracing::info!(url = %endpoint, query = %query, "Match found");
        Some(ScrapeResult::new(
            endpoint,
            truncate_chars(&text, self.excerpt_max_chars),
        ))
    }

    async fn give_up(&self, endpoint: &str, attempts: u32) {
        metrics::record_endpoint_given_up();
        tracing::error!(url = %endpoint, attempts, "Endpoint unreachable, giving up");

        if let Err(e) = self
            .notifier
            .notify(&unreachable_message(endpoint, attempts))
            .await
        {
            tracing::error!(url = %endpoint, error = %e, "Failed to send unreachable notification");
        }

        self.tracker.reset(endpoint);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::{ChannelError, ChannelResult};
    use crate::utils::error::FetchError;
    use async_trait::async_trait;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// Replays a scripted sequence of replies per URL; exhausted scripts fail
    #[derive(Default)]
    struct ScriptedSource {
        replies: Mutex<HashMap<String, VecDeque<Option<String>>>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedSource {
        fn with(self, url: &str, replies: Vec<Option<&str>>) -> Self {
            self.replies.lock().unwrap().insert(
                url.to_string(),
                replies.into_iter().map(|r| r.map(str::to_string)).collect(),
            );
            self
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl PageSource for ScriptedSource {
        async fn fetch_text(&self, url: &str, _timeout: Duration) -> Result<String, FetchError> {
            self.calls.lock().unwrap().push(url.to_string());
            let reply = self
                .replies
                .lock()
                .unwrap()
                .get_mut(url)
                .and_then(VecDeque::pop_front)
                .flatten();
            reply.ok_or(FetchError::Timeout)
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        messages: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, message: &str) -> ChannelResult<()> {
            self.messages.lock().unwrap().push(message.to_string());
            if self.fail {
                return Err(ChannelError::Other("down".to_string()));
            }
            Ok(())
        }
    }

    fn worker(source: Arc<ScriptedSource>, notifier: Arc<RecordingNotifier>) -> FetchWorker {
        FetchWorker::new(
            source,
            Arc::new(FailureTracker::new()),
            notifier,
            RetryConfig::default(),
            Duration::from_secs(30),
            500,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_attempts_fail() {
        let source = Arc::new(ScriptedSource::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let worker = worker(source.clone(), notifier.clone());
        let started = Instant::now();

        let result = worker.fetch("http://down.onion", &ScanQuery::new("x")).await;

        assert!(result.is_none());
        assert_eq!(source.call_count(), 3);
        assert_eq!(
            notifier.messages.lock().unwrap().as_slice(),
            ["Failed to access http://down.onion after 3 attempts"]
        );
        // Slept 1s and 2s, nothing after the final attempt
        assert_eq!(started.elapsed(), Duration::from_secs(3));
        // Cleared on giving up
        assert_eq!(worker.tracker().get("http://down.onion"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_counter_at_limit_when_reported() {
        struct CounterProbe {
            tracker: Arc<FailureTracker>,
            seen: Mutex<Vec<u32>>,
        }

        #[async_trait]
        impl Notifier for CounterProbe {
            async fn notify(&self, _message: &str) -> ChannelResult<()> {
                let count = self.tracker.get("http://down.onion");
                self.seen.lock().unwrap().push(count);
                Ok(())
            }
        }

        let tracker = Arc::new(FailureTracker::new());
        let probe = Arc::new(CounterProbe {
            tracker: tracker.clone(),
            seen: Mutex::new(Vec::new()),
        });
        let worker = FetchWorker::new(
            Arc::new(ScriptedSource::default()),
            tracker.clone(),
            probe.clone(),
            RetryConfig::new(3),
            Duration::from_secs(30),
            500,
        );

        assert!(worker.fetch("http://down.onion", &ScanQuery::new("q")).await.is_none());
        assert_eq!(probe.seen.lock().unwrap().as_slice(), [3]);
        assert_eq!(tracker.get("http://down.onion"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_carried_over_failures_count_toward_limit() {
        let source = Arc::new(ScriptedSource::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let worker = worker(source.clone(), notifier.clone());

        worker.tracker().increment("http://x.onion");
        worker.tracker().increment("http://x.onion");

        assert!(worker.fetch("http://x.onion", &ScanQuery::new("q")).await.is_none());
        assert_eq!(source.call_count(), 1);
        assert_eq!(notifier.messages.lock().unwrap().len(), 1);
        assert_eq!(worker.tracker().get("http://x.onion"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_without_match_resets_counter() {
        let source = Arc::new(ScriptedSource::default().with(
            "http://flaky.onion",
            vec![None, None, Some("<p>nothing relevant</p>")],
        ));
        let notifier = Arc::new(RecordingNotifier::default());
        let worker = worker(source.clone(), notifier.clone());

        let result = worker.fetch("http://flaky.onion", &ScanQuery::new("breach")).await;

        assert!(result.is_none());
        assert_eq!(source.call_count(), 3);
        assert_eq!(worker.tracker().get("http://flaky.onion"), 0);
        assert!(notifier.messages.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_match_returns_truncated_excerpt() {
        let page = format!("<html><body><h1>Data BREACH</h1><p>{}</p></body></html>", "z".repeat(1000));
        let source = Arc::new(ScriptedSource::default().with("http://a.onion", vec![Some(&page)]));
        let worker = worker(source, Arc::new(RecordingNotifier::default()));

        let result = worker
            .fetch("http://a.onion", &ScanQuery::new("data breach"))
            .await
            .unwrap();

        assert_eq!(result.url, "http://a.onion");
        assert_eq!(result.content.chars().count(), 500);
        assert!(result.content.starts_with("Data BREACH"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_notification_failure_is_swallowed() {
        let source = Arc::new(ScriptedSource::default());
        let notifier = Arc::new(RecordingNotifier {
            fail: true,
            ..Default::default()
        });
        let worker = worker(source, notifier.clone());

        assert!(worker.fetch("http://down.onion", &ScanQuery::new("x")).await.is_none());
        assert_eq!(notifier.messages.lock().unwrap().len(), 1);
    }
}
