//! Common test utilities

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use darkwatch::config::ProxyConfig;
use darkwatch::health::HealthCheck;
use darkwatch::models::ScanOutcome;
use darkwatch::notifications::{ChannelResult, Notifier};
use darkwatch::proxy::ProxyClient;
use darkwatch::scanner::{FailureTracker, FetchWorker, ScanPool};
use darkwatch::storage::{PersistenceSink, StorageResult};
use darkwatch::utils::retry::RetryConfig;

/// Notifier remembering every message
#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, message: &str) -> ChannelResult<()> {
        self.messages.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

/// Persistence sink keeping outcomes in memory
#[derive(Default)]
pub struct MemoryStore {
    outcomes: Mutex<Vec<ScanOutcome>>,
}

impl MemoryStore {
    pub fn stored(&self) -> Vec<ScanOutcome> {
        self.outcomes.lock().unwrap().clone()
    }
}

#[async_trait]
impl PersistenceSink for MemoryStore {
    async fn store(&self, outcome: &ScanOutcome) -> StorageResult<()> {
        self.outcomes.lock().unwrap().push(outcome.clone());
        Ok(())
    }
}

/// Health gate with a switchable verdict
pub struct StaticGate {
    healthy: AtomicBool,
    calls: AtomicUsize,
}

impl StaticGate {
    pub fn new(healthy: bool) -> Self {
        Self {
            healthy: AtomicBool::new(healthy),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HealthCheck for StaticGate {
    async fn check(&self) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.healthy.load(Ordering::SeqCst)
    }
}

/// Client talking to local mock servers without a proxy
pub fn direct_client() -> ProxyClient {
    ProxyClient::direct(&ProxyConfig::default()).unwrap()
}

/// Scan pool over `client` with millisecond backoff
pub fn fast_pool(client: ProxyClient, notifier: Arc<dyn Notifier>) -> ScanPool {
    let worker = FetchWorker::new(
        Arc::new(client),
        Arc::new(FailureTracker::new()),
        notifier,
        RetryConfig::with_base_delay(3, Duration::from_millis(10)),
        Duration::from_secs(5),
        500,
    );
    ScanPool::new(Arc::new(worker), 5)
}
