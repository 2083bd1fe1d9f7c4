//! HTTP client bound to the outbound anonymizing proxy
//!
//! A single [`ProxyClient`] is built at startup and shared by the health gate and
//! every fetch worker, so connections to the proxy are reused for the lifetime of
//! the process.
//!
//! Consumers depend on the [`PageSource`] trait rather than on the client itself,
//! which keeps retry and matching logic testable without sockets.

use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT},
    Client, Proxy, Response,
};
use std::time::Duration;

use crate::config::ProxyConfig;
use crate::utils::error::FetchError;

/// Source of page bodies
#[async_trait]
pub trait PageSource: Send + Sync {
    /// GET `url` and return its body as text
    ///
    /// Fails on connection errors, on `timeout` expiring, and on non-success status.
    async fn fetch_text(&self, url: &str, timeout: Duration) -> Result<String, FetchError>;
}

/// HTTP client routing all traffic through a fixed proxy
#[derive(Debug, Clone)]
pub struct ProxyClient {
    /// Shared reqwest client (cheap to clone, pools connections)
    client: Client,

    /// Proxy URL, kept for diagnostics
    proxy_url: Option<String>,
}

impl ProxyClient {
    /// Create a client that sends every request through `config.url`
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidProxy` if the proxy URL is rejected and
    /// `FetchError::Http` if the client cannot be built.
    pub fn new(config: &ProxyConfig) -> Result<Self, FetchError> {
        let proxy = Proxy::all(&config.url)
            .map_err(|e| FetchError::InvalidProxy(format!("{}: {e}", config.url)))?;

        let client = Client::builder()
            .proxy(proxy)
            .default_headers(Self::build_headers(&config.user_agent)?)
            .gzip(true)
            .build()?;

        tracing::debug!(proxy = %config.url, "Proxy client created");

        Ok(Self {
            client,
            proxy_url: Some(config.url.clone()),
        })
    }

    /// Create a client that connects directly, bypassing any proxy
    ///
    /// Used against local mock servers and for diagnostics.
    pub fn direct(config: &ProxyConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .no_proxy()
            .default_headers(Self::build_headers(&config.user_agent)?)
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            proxy_url: None,
        })
    }

    /// Proxy URL this client routes through, if any
    pub fn proxy_url(&self) -> Option<&str> {
        self.proxy_url.as_deref()
    }

    /// Send a GET request with a per-request timeout
    ///
    /// # Errors
    ///
    /// - `FetchError::InvalidUrl` if `url` does not parse
    /// - `FetchError::Timeout` if `timeout` expires
    /// - `FetchError::ServerError` for non-success status codes
    /// - `FetchError::Http` for any other transport failure
    pub async fn get(&self, url: &str, timeout: Duration) -> Result<Response, FetchError> {
        let parsed = url::Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))?;

        tracing::debug!(url = %url, timeout_secs = timeout.as_secs_f64(), "Fetching URL");

        let response = self
            .client
            .get(parsed)
            .timeout(timeout)
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::ServerError(status.as_u16()));
        }

        Ok(response)
    }

    fn build_headers(user_agent: &str) -> Result<HeaderMap, FetchError> {
        let mut headers = HeaderMap::new();

        let agent = HeaderValue::from_str(user_agent)
            .map_err(|e| FetchError::InvalidProxy(format!("invalid user agent: {e}")))?;
        headers.insert(USER_AGENT, agent);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/json;q=0.9,*/*;q=0.8"),
        );

        Ok(headers)
    }
}

#[async_trait]
impl PageSource for ProxyClient {
    async fn fetch_text(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        let response = self.get(url, timeout).await?;
        response.text().await.map_err(FetchError::from_reqwest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_USER_AGENT;

    #[test]
    fn test_proxy_client_creation() {
        let client = ProxyClient::new(&ProxyConfig::default()).unwrap();
        assert_eq!(client.proxy_url(), Some("socks5h://127.0.0.1:9050"));
    }

    #[test]
    fn test_direct_client_has_no_proxy() {
        let client = ProxyClient::direct(&ProxyConfig::default()).unwrap();
        assert!(client.proxy_url().is_none());
    }

    #[test]
    fn test_invalid_proxy_rejected() {
        let config = ProxyConfig {
            url: "not a proxy url".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            ProxyClient::new(&config),
            Err(FetchError::InvalidProxy(_))
        ));
    }

    #[test]
    fn test_headers_carry_user_agent() {
        let headers = ProxyClient::build_headers(DEFAULT_USER_AGENT).unwrap();
        assert_eq!(headers.get(USER_AGENT).unwrap(), DEFAULT_USER_AGENT);
        assert!(headers.contains_key(ACCEPT));
    }

    #[tokio::test]
    async fn test_invalid_url_fails_without_network() {
        let client = ProxyClient::direct(&ProxyConfig::default()).unwrap();
        let result = client.get("not a url", Duration::from_secs(1)).await;
        assert!(matches!(result, Err(FetchError::InvalidUrl(_))));
    }
}
