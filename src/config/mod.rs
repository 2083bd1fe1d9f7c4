//! Configuration management for the darkwatch scanner
//!
//! This module handles loading and validating configuration from environment variables
//! and TOML files. The watch list itself (endpoints and query) is not part of this
//! configuration; it is re-read every cycle through [`crate::scheduler::WatchlistSource`].

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::utils::retry::RetryConfig;

/// Default Tor SOCKS proxy, resolving hostnames on the proxy side
pub const DEFAULT_TOR_PROXY: &str = "socks5h://127.0.0.1:9050";

/// Default proxy health check endpoint
pub const DEFAULT_HEALTH_CHECK_URL: &str = "https://check.torproject.org/api/ip";

/// Static User-Agent sent with every request
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Outbound proxy configuration
    pub proxy: ProxyConfig,

    /// Per-cycle scanning configuration
    pub scanner: ScannerConfig,

    /// Periodic loop configuration
    pub scheduler: SchedulerConfig,

    /// Result persistence configuration
    pub storage: StorageConfig,

    /// Notification channel configuration
    pub notifications: NotificationConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Proxy and health check configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Proxy URL applied to every request (http and https)
    pub url: String,

    /// User agent string
    pub user_agent: String,

    /// Health check URL, expected to answer with `{"IsTor": bool}`
    pub health_check_url: String,

    /// Health check timeout in seconds
    pub health_check_timeout_secs: u64,
}

/// Scanner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Number of endpoints fetched concurrently
    pub pool_size: usize,

    /// Attempts per endpoint before giving up
    pub max_retries: u32,

    /// Per-request timeout in seconds
    pub fetch_timeout_secs: u64,

    /// Base backoff delay in milliseconds (doubled after every failed attempt)
    pub backoff_base_ms: u64,

    /// Maximum excerpt length in characters
    pub excerpt_max_chars: usize,
}

/// Scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Seconds between cycles
    pub period_secs: u64,

    /// Seconds to wait after an unhealthy proxy check or a failed iteration
    pub unhealthy_backoff_secs: u64,

    /// JSON file holding `{"urls": [...], "query": "..."}`
    pub watchlist_path: PathBuf,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database path for scrape results
    pub sqlite_path: PathBuf,
}

/// Notification configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Telegram bot token
    pub telegram_token: Option<String>,

    /// Telegram chat receiving messages
    pub telegram_chat_id: Option<String>,

    /// Generic webhook receiving JSON messages
    pub webhook_url: Option<String>,

    /// Bearer token sent to the webhook
    pub webhook_token: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Unset or unparsable variables fall back to defaults.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let proxy_url = env_string("DARKWATCH_TOR_PROXY")
            .or_else(|| env_string("TOR_PROXY"))
            .unwrap_or(defaults.proxy.url);

        let user_agent = env_string("DARKWATCH_USER_AGENT").unwrap_or(defaults.proxy.user_agent);

        let health_check_url =
            env_string("DARKWATCH_HEALTH_CHECK_URL").unwrap_or(defaults.proxy.health_check_url);

        let health_check_timeout_secs = env_parse("DARKWATCH_HEALTH_CHECK_TIMEOUT")
            .unwrap_or(defaults.proxy.health_check_timeout_secs);

        let pool_size = env_parse("DARKWATCH_POOL_SIZE")
            .or_else(|| env_parse("MAX_THREADS"))
            .unwrap_or(defaults.scanner.pool_size);

        let max_retries =
            env_parse("DARKWATCH_MAX_RETRIES").unwrap_or(defaults.scanner.max_retries);

        let fetch_timeout_secs =
            env_parse("DARKWATCH_FETCH_TIMEOUT").unwrap_or(defaults.scanner.fetch_timeout_secs);

        let backoff_base_ms =
            env_parse("DARKWATCH_BACKOFF_BASE_MS").unwrap_or(defaults.scanner.backoff_base_ms);

        let excerpt_max_chars =
            env_parse("DARKWATCH_EXCERPT_MAX_CHARS").unwrap_or(defaults.scanner.excerpt_max_chars);

        let period_secs = env_parse("DARKWATCH_CHECK_INTERVAL")
            .or_else(|| env_parse("CHECK_INTERVAL"))
            .unwrap_or(defaults.scheduler.period_secs);

        let unhealthy_backoff_secs = env_parse("DARKWATCH_UNHEALTHY_BACKOFF")
            .unwrap_or(defaults.scheduler.unhealthy_backoff_secs);

        let watchlist_path = env_string("DARKWATCH_WATCHLIST")
            .map(PathBuf::from)
            .unwrap_or(defaults.scheduler.watchlist_path);

        let sqlite_path = env_string("DARKWATCH_SQLITE_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.storage.sqlite_path);

        let log_level = env_string("DARKWATCH_LOG_LEVEL").unwrap_or(defaults.logging.level);
        let log_format = env_string("DARKWATCH_LOG_FORMAT").unwrap_or(defaults.logging.format);

        Ok(Self {
            proxy: ProxyConfig {
                url: proxy_url,
                user_agent,
                health_check_url,
                health_check_timeout_secs,
            },
            scanner: ScannerConfig {
                pool_size,
                max_retries,
                fetch_timeout_secs,
                backoff_base_ms,
                excerpt_max_chars,
            },
            scheduler: SchedulerConfig {
                period_secs,
                unhealthy_backoff_secs,
                watchlist_path,
            },
            storage: StorageConfig { sqlite_path },
            notifications: NotificationConfig {
                telegram_token: env_string("TELEGRAM_TOKEN"),
                telegram_chat_id: env_string("TELEGRAM_CHAT_ID"),
                webhook_url: env_string("WEBHOOK_URL"),
                webhook_token: env_string("DARKWATCH_WEBHOOK_TOKEN")
                    .or_else(|| env_string("WEBHOOK_TOKEN")),
            },
            logging: LoggingConfig {
                level: log_level,
                format: log_format,
            },
        })
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.proxy.url.is_empty() {
            anyhow::bail!("proxy.url must not be empty");
        }

        if self.scanner.pool_size == 0 {
            anyhow::bail!("scanner.pool_size must be greater than 0");
        }

        if self.scanner.max_retries == 0 {
            anyhow::bail!("scanner.max_retries must be greater than 0");
        }

        if self.scanner.fetch_timeout_secs == 0 || self.proxy.health_check_timeout_secs == 0 {
            anyhow::bail!("timeouts must be greater than 0");
        }

        if self.scanner.excerpt_max_chars == 0 {
            anyhow::bail!("scanner.excerpt_max_chars must be greater than 0");
        }

        if self.scheduler.period_secs == 0 {
            anyhow::bail!("scheduler.period_secs must be greater than 0");
        }

        if self.notifications.telegram_token.is_some()
            != self.notifications.telegram_chat_id.is_some()
        {
            anyhow::bail!("telegram_token and telegram_chat_id must be set together");
        }

        if self.notifications.webhook_token.is_some() && self.notifications.webhook_url.is_none() {
            anyhow::bail!("webhook_token requires webhook_url");
        }

        Ok(())
    }

    /// Get fetch timeout as Duration
    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.scanner.fetch_timeout_secs)
    }

    /// Get health check timeout as Duration
    #[must_use]
    pub fn health_check_timeout(&self) -> Duration {
        Duration::from_secs(self.proxy.health_check_timeout_secs)
    }

    /// Get cycle period as Duration
    #[must_use]
    pub fn period(&self) -> Duration {
        Duration::from_secs(self.scheduler.period_secs)
    }

    /// Get unhealthy backoff as Duration
    #[must_use]
    pub fn unhealthy_backoff(&self) -> Duration {
        Duration::from_secs(self.scheduler.unhealthy_backoff_secs)
    }

    /// Retry policy for endpoint fetches
    #[must_use]
    pub fn retry(&self) -> RetryConfig {
        RetryConfig::with_base_delay(
            self.scanner.max_retries,
            Duration::from_millis(self.scanner.backoff_base_ms),
        )
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            url: String::from(DEFAULT_TOR_PROXY),
            user_agent: String::from(DEFAULT_USER_AGENT),
            health_check_url: String::from(DEFAULT_HEALTH_CHECK_URL),
            health_check_timeout_secs: 10,
        }
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            pool_size: 5,
            max_retries: 3,
            fetch_timeout_secs: 30,
            backoff_base_ms: 1000,
            excerpt_max_chars: 500,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            period_secs: 900,
            unhealthy_backoff_secs: 60,
            watchlist_path: PathBuf::from("watchlist.json"),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            sqlite_path: PathBuf::from("data/results.db"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}
