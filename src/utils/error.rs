//! Error types for the darkwatch scanner
//!
//! This module defines the network-level error type shared by the proxy
//! client, the health gate and the fetch workers.

use thiserror::Error;

/// Errors that can occur while fetching a page through the proxy
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error (connection refused, proxy handshake, body read)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status code
    #[error("Server error: {0}")]
    ServerError(u16),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Content decoding error
    #[error("Decoding error: {0}")]
    Decode(String),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Proxy could not be configured
    #[error("Invalid proxy: {0}")]
    InvalidProxy(String),
}

impl FetchError {
    /// Classify a reqwest error, separating timeouts from other failures
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }

    /// Whether another attempt could plausibly succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Http(_) | Self::Timeout | Self::ServerError(_) => true,
            Self::Decode(_) | Self::InvalidUrl(_) | Self::InvalidProxy(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display() {
        assert_eq!(FetchError::ServerError(503).to_string(), "Server error: 503");
        assert_eq!(FetchError::Timeout.to_string(), "Request timeout");
    }

    #[test]
    fn test_fetch_error_recoverable() {
        assert!(FetchError::Timeout.is_recoverable());
        assert!(FetchError::ServerError(500).is_recoverable());
        assert!(!FetchError::InvalidUrl("nope".to_string()).is_recoverable());
    }
}
