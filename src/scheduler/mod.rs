//! Periodic scan scheduling
//!
//! The [`Scheduler`] owns one background task that repeatedly checks the
//! proxy, runs a scan cycle and sleeps:
//!
//! ```text
//!            ┌──────────────────────────────────────────────┐
//!            ▼                                              │
//!     ┌─────────────┐  unhealthy   ┌──────────────────┐     │
//!     │ HealthCheck │ ───────────▶ │ unhealthy backoff│ ────┤
//!     └──────┬──────┘              └──────────────────┘     │
//!            │ healthy                                      │
//!     ┌──────▼──────┐   ┌──────────┐   ┌──────────────┐     │
//!     │  Watchlist  │──▶│ ScanPool │──▶│    sinks     │     │
//!     └─────────────┘   └──────────┘   └──────┬───────┘     │
//!                                             │             │
//!                                      ┌──────▼──────┐      │
//!                                      │   period    │ ─────┘
//!                                      └─────────────┘
//! ```
//!
//! Sinks are the notifier, the persistence sink and the optional live
//! broadcaster. They are only invoked for a non-empty outcome and a failure in
//! one never blocks the others. An error or panic anywhere in an iteration is
//! logged and followed by the unhealthy backoff.
//!
//! # Settings
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `period_secs` | 900 | Wait after a healthy cycle |
//! | `unhealthy_backoff_secs` | 60 | Wait after an unhealthy gate or failed iteration |
//! | `watchlist_path` | `watchlist.json` | Watch list re-read every iteration |
//!
//! # Example
//!
//! ```ignore
//! use darkwatch::scheduler::{Scheduler, WatchlistFile};
//!
//! let scheduler = Scheduler::builder(pool, gate, Arc::new(WatchlistFile::new("watchlist.json")), notifier, store)
//!     .broadcaster(broadcaster)
//!     .build();
//!
//! scheduler.start().await;
//! tokio::signal::ctrl_c().await?;
//! scheduler.stop().await;
//! ```

pub mod error;
mod runner;
pub mod watchlist;

// Re-export main types
pub use error::{SchedulerError, SchedulerResult};
pub use runner::{Scheduler, SchedulerBuilder, DEFAULT_PERIOD, DEFAULT_UNHEALTHY_BACKOFF};
pub use watchlist::{SharedWatchlist, Watchlist, WatchlistFile, WatchlistSource};
