//! Scanning engine
//!
//! A cycle fans [`FetchWorker::fetch`] out over every endpoint through
//! [`ScanPool`], with at most `pool_size` fetches in flight:
//!
//! ```text
//! run_cycle(endpoints, query)
//!     │
//!     ├── fetch(A) ── attempt ── backoff ── attempt ── ...
//!     ├── fetch(B) ── attempt ── match ──> ScrapeResult
//!     └── fetch(C) ── queued until a slot frees up
//!     │
//!     └── join all ──> ScanOutcome
//! ```
//!
//! Per-endpoint failure counters live in the shared [`FailureTracker`].

mod pool;
mod tracker;
mod worker;

pub use pool::ScanPool;
pub use tracker::FailureTracker;
pub use worker::FetchWorker;
