//! Unified error handling for the darkwatch crate
//!
//! Domain errors stay in their modules; [`Error`] wraps them where they cross
//! module boundaries: the scheduler iteration, the sink dispatch and the binary.
//!
//! # Architecture
//!
//! - [`DarkwatchErrorTrait`] - Common interface implemented by the unified error
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors
//!
//! # Usage
//!
//! ```rust,ignore
//! use darkwatch::error::{DarkwatchErrorTrait, Error};
//!
//! fn handle_error(err: Error) {
//!     if err.is_recoverable() {
//!         tracing::warn!(category = err.category().label(), "Retrying: {err}");
//!     } else {
//!         tracing::error!("Fatal error: {err}");
//!     }
//! }
//! ```

use thiserror::Error;

// Re-export domain-specific errors for convenience
pub use crate::notifications::ChannelError;
pub use crate::scheduler::error::SchedulerError;
pub use crate::storage::StorageError;
pub use crate::utils::error::FetchError;

/// Common trait for darkwatch error types
pub trait DarkwatchErrorTrait: std::error::Error {
    /// Check if this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Proxy and fetch failures
    Network,
    /// Notification delivery failures
    Notification,
    /// Storage and I/O errors
    Storage,
    /// Malformed data
    Parsing,
    /// Configuration and validation errors
    Config,
    /// Scheduler loop and watch list errors
    Scheduler,
}

impl ErrorCategory {
    /// Short label used as a structured log field
    pub fn label(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Notification => "notification",
            Self::Storage => "storage",
            Self::Parsing => "parsing",
            Self::Config => "config",
            Self::Scheduler => "scheduler",
        }
    }
}

/// Unified error type for the darkwatch crate
#[derive(Error, Debug)]
pub enum Error {
    /// Fetch-specific errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Notification channel errors
    #[error("Notification error: {0}")]
    Channel(#[from] ChannelError),

    /// Result storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Scheduler and watch list errors
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),
}

impl DarkwatchErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Fetch(e) => e.is_recoverable(),
            Self::Channel(e) => matches!(e, ChannelError::HttpError(_) | ChannelError::Rejected(_)),
            Self::Storage(e) => matches!(e, StorageError::Unavailable(_) | StorageError::Io(_)),
            Self::Scheduler(e) => e.is_recoverable(),
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Fetch(_) => ErrorCategory::Network,
            Self::Channel(ChannelError::InvalidConfig(_)) => ErrorCategory::Config,
            Self::Channel(_) => ErrorCategory::Notification,
            Self::Storage(StorageError::CorruptRow(_)) => ErrorCategory::Parsing,
            Self::Storage(_) => ErrorCategory::Storage,
            Self::Scheduler(SchedulerError::WatchlistParse { .. }) => ErrorCategory::Parsing,
            Self::Scheduler(SchedulerError::InvalidWatchlist { .. }) => ErrorCategory::Config,
            Self::Scheduler(_) => ErrorCategory::Scheduler,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
