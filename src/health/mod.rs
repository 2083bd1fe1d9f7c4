//! Proxy health gate
//!
//! Before every cycle the scheduler asks the gate whether the proxy works. The
//! check is fail-closed: only an explicit `{"IsTor": true}` answer counts as
//! healthy, every error or unexpected body counts as unhealthy.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ProxyConfig;
use crate::proxy::PageSource;

/// Precondition checked before a cycle is allowed to run
#[async_trait]
pub trait HealthCheck: Send + Sync {
    /// Whether the proxy is currently usable; never fails
    async fn check(&self) -> bool;
}

/// Response body of the Tor check API
#[derive(Debug, Deserialize)]
struct TorCheckResponse {
    #[serde(rename = "IsTor")]
    is_tor: Option<serde_json::Value>,
}

/// Health gate asking a well-known endpoint whether traffic exits through Tor
pub struct ProxyHealthGate {
    source: Arc<dyn PageSource>,
    check_url: String,
    timeout: Duration,
}

impl ProxyHealthGate {
    /// Create a gate probing `check_url` through `source`
    pub fn new(source: Arc<dyn PageSource>, check_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            source,
            check_url: check_url.into(),
            timeout,
        }
    }

    /// Create a gate from proxy configuration
    pub fn from_config(source: Arc<dyn PageSource>, config: &ProxyConfig) -> Self {
        Self::new(
            source,
            config.health_check_url.clone(),
            Duration::from_secs(config.health_check_timeout_secs),
        )
    }

    /// URL probed by this gate
    pub fn check_url(&self) -> &str {
        &self.check_url
    }

    /// Interpret a health check body
    ///
    /// Only a JSON object whose `IsTor` field is the boolean `true` is healthy.
    pub fn parse_status(body: &str) -> Result<bool, serde_json::Error> {
        let response: TorCheckResponse = serde_json::from_str(body)?;
        Ok(matches!(response.is_tor, Some(serde_json::Value::Bool(true))))
    }
}

#[async_trait]
impl HealthCheck for ProxyHealthGate {
    async fn check(&self) -> bool {
        let body = match self.source.fetch_text(&self.check_url, self.timeout).await {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(url = %self.check_url, error = %e, "Proxy health check failed");
                return false;
            }
        };

        match Self::parse_status(&body) {
            Ok(true) => {
                tracing::debug!("Proxy health check passed");
                true
            }
            Ok(false) => {
                tracing::warn!(url = %self.check_url, "Traffic is not leaving through Tor");
                false
            }
            Err(e) => {
                tracing::error!(url = %self.check_url, error = %e, "Malformed health check response");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::FetchError;

    struct FixedSource(Result<&'static str, u16>);

    #[async_trait]
    impl PageSource for FixedSource {
        async fn fetch_text(&self, _url: &str, _timeout: Duration) -> Result<String, FetchError> {
            match self.0 {
                Ok(body) => Ok(body.to_string()),
                Err(status) => Err(FetchError::ServerError(status)),
            }
        }
    }

    fn gate(source: FixedSource) -> ProxyHealthGate {
        ProxyHealthGate::new(
            Arc::new(source),
            "https://check.torproject.org/api/ip",
            Duration::from_secs(10),
        )
    }

    #[test]
    fn test_parse_status() {
        assert!(ProxyHealthGate::parse_status(r#"{"IsTor": true, "IP": "1.2.3.4"}"#).unwrap());
        assert!(!ProxyHealthGate::parse_status(r#"{"IsTor": false}"#).unwrap());
        assert!(!ProxyHealthGate::parse_status(r#"{"IsTor": "true"}"#).unwrap());
        assert!(!ProxyHealthGate::parse_status(r#"{"IP": "1.2.3.4"}"#).unwrap());
        assert!(ProxyHealthGate::parse_status("<html>").is_err());
    }

    #[tokio::test]
    async fn test_healthy_proxy() {
        assert!(gate(FixedSource(Ok(r#"{"IsTor":true}"#))).check().await);
    }

    #[tokio::test]
    async fn test_not_tor_is_unhealthy() {
        assert!(!gate(FixedSource(Ok(r#"{"IsTor":false}"#))).check().await);
    }

    #[tokio::test]
    async fn test_malformed_body_is_unhealthy() {
        assert!(!gate(FixedSource(Ok("Service Unavailable"))).check().await);
    }

    #[tokio::test]
    async fn test_fetch_error_is_unhealthy() {
        assert!(!gate(FixedSource(Err(503))).check().await);
    }

    #[test]
    fn test_from_config() {
        let source = Arc::new(FixedSource(Ok("{}")));
        let gate = ProxyHealthGate::from_config(source, &ProxyConfig::default());
        assert_eq!(gate.check_url(), "https://check.torproject.org/api/ip");
        assert_eq!(gate.timeout, Duration::from_secs(10));
    }
}
