//! Error types for the scheduler module

use std::fmt;

/// Result type for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Scheduler-specific errors
#[derive(Debug)]
pub enum SchedulerError {
    /// Watch list update rejected
    InvalidWatchlist {
        reason: String,
    },

    /// Watch list file could not be read or written
    WatchlistIo {
        path: String,
        reason: String,
    },

    /// Watch list file is not valid JSON
    WatchlistParse {
        path: String,
        reason: String,
    },

    /// Serialization/deserialization error
    SerializationError {
        reason: String,
    },

    /// IO error
    IoError {
        operation: String,
        reason: String,
    },

    /// One loop iteration panicked
    IterationPanicked {
        reason: String,
    },
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidWatchlist { reason } => {
                write!(f, "Invalid watch list: {}", reason)
            }
            Self::WatchlistIo { path, reason } => {
                write!(f, "Watch list I/O error on '{}': {}", path, reason)
            }
            Self::WatchlistParse { path, reason } => {
                write!(f, "Malformed watch list '{}': {}", path, reason)
            }
            Self::SerializationError { reason } => {
                write!(f, "Serialization error: {}", reason)
            }
            Self::IoError { operation, reason } => {
                write!(f, "IO error during '{}': {}", operation, reason)
            }
            Self::IterationPanicked { reason } => {
                write!(f, "Scheduler iteration panicked: {}", reason)
            }
        }
    }
}

impl std::error::Error for SchedulerError {}

impl From<serde_json::Error> for SchedulerError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError {
            reason: err.to_string(),
        }
    }
}

impl From<std::io::Error> for SchedulerError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError {
            operation: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

impl SchedulerError {
    /// Create an invalid watch list error
    pub fn invalid_watchlist(reason: impl Into<String>) -> Self {
        Self::InvalidWatchlist {
            reason: reason.into(),
        }
    }

    /// Create a watch list I/O error
    pub fn watchlist_io(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::WatchlistIo {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a watch list parse error
    pub fn watchlist_parse(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::WatchlistParse {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an error from a caught panic payload
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Self::IterationPanicked { reason }
    }

    /// Check if the error is recoverable
    ///
    /// Everything except a rejected update clears up on a later iteration
    /// without operator action, or at least can.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::InvalidWatchlist { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watchlist_errors_display() {
        let err = SchedulerError::watchlist_parse("watchlist.json", "expected value");
        assert!(err.to_string().contains("watchlist.json"));
        assert!(err.to_string().contains("expected value"));

        let err = SchedulerError::invalid_watchlist("query is empty");
        assert_eq!(err.to_string(), "Invalid watch list: query is empty");
    }

    #[test]
    fn test_is_recoverable() {
        assert!(SchedulerError::watchlist_io("w.json", "denied").is_recoverable());
        assert!(!SchedulerError::invalid_watchlist("empty").is_recoverable());
    }

    #[test]
    fn test_from_panic_payload() {
        let err = SchedulerError::from_panic(Box::new("boom"));
        assert!(err.to_string().contains("boom"));

        let err = SchedulerError::from_panic(Box::new(String::from("owned boom")));
        assert!(err.to_string().contains("owned boom"));

        let err = SchedulerError::from_panic(Box::new(42_u8));
        assert!(err.to_string().contains("unknown panic"));
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: SchedulerError = json_err.into();
        assert!(matches!(err, SchedulerError::SerializationError { .. }));
    }
}
