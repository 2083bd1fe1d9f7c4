//! darkwatch - Keyword monitor for onion services
//!
//! Periodically fetches a watch list of endpoints through a Tor SOCKS proxy,
//! searches every page for a keyword, and reports matches through notifications,
//! a SQLite result store and an in-process live feed.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`proxy`] - HTTP client bound to the outbound proxy
//! - [`health`] - Proxy health gate checked before every cycle
//! - [`parser`] - Plain-text extraction from fetched pages
//! - [`scanner`] - Fetch workers, failure tracking and the bounded scan pool
//! - [`scheduler`] - Periodic loop with start/stop control and the watch list
//! - [`notifications`] - Telegram and webhook delivery
//! - [`storage`] - Result persistence (SQLite)
//! - [`broadcast`] - Live feed of new matches
//! - [`metrics`] - Prometheus counters
//! - [`models`] - Core data structures and types
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use darkwatch::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!
//!     let client: Arc<dyn PageSource> = Arc::new(ProxyClient::new(&config.proxy)?);
//!     let notifier: Arc<dyn Notifier> = Arc::new(NotificationManager::from_config(&config.notifications)?);
//!     let worker = FetchWorker::from_config(client.clone(), Arc::new(FailureTracker::new()), notifier.clone(), &config);
//!
//!     let scheduler = Scheduler::builder(
//!         ScanPool::new(Arc::new(worker), config.scanner.pool_size),
//!         Arc::new(ProxyHealthGate::from_config(client, &config.proxy)),
//!         Arc::new(WatchlistFile::new(&config.scheduler.watchlist_path)),
//!         notifier,
//!         Arc::new(SqliteResultStore::open(&config.storage.sqlite_path)?),
//!     )
//!     .period(config.period())
//!     .build();
//!
//!     scheduler.start().await;
//!     tokio::signal::ctrl_c().await?;
//!     scheduler.stop().await;
//!     Ok(())
//! }
//! ```

pub mod broadcast;
pub mod config;
pub mod error;
pub mod health;
pub mod metrics;
pub mod models;
pub mod notifications;
pub mod parser;
pub mod proxy;
pub mod scanner;
pub mod scheduler;
pub mod storage;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::broadcast::{ChannelBroadcaster, LiveBroadcaster};
    pub use crate::config::Config;
    pub use crate::error::{DarkwatchErrorTrait, Error, ErrorCategory, Result};
    pub use crate::health::{HealthCheck, ProxyHealthGate};
    pub use crate::models::{Endpoint, ScanOutcome, ScanQuery, ScrapeResult};
    pub use crate::notifications::{NotificationManager, Notifier};
    pub use crate::proxy::{PageSource, ProxyClient};
    pub use crate::scanner::{FailureTracker, FetchWorker, ScanPool};
    pub use crate::scheduler::{Scheduler, SharedWatchlist, Watchlist, WatchlistFile};
    pub use crate::storage::{PersistenceSink, SqliteResultStore};
}

// Direct re-exports for convenience
pub use models::{Endpoint, ScanOutcome, ScanQuery, ScrapeResult};
