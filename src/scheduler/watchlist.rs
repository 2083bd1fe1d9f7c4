//! Watch list: the endpoints and keyword scanned every cycle
//!
//! The scheduler reloads the watch list at the start of every iteration, so
//! updates take effect on the next cycle without a restart.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::error::{SchedulerError, SchedulerResult};
use crate::models::{Endpoint, ScanQuery};

/// Endpoints and query for the next cycle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Watchlist {
    #[serde(default)]
    pub urls: Vec<Endpoint>,
    #[serde(default)]
    pub query: String,
}

impl Watchlist {
    /// Build a watch list, trimming entries and dropping blank URLs
    pub fn new<I, S>(urls: I, query: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            urls: urls
                .into_iter()
                .map(|u| u.as_ref().trim().to_string())
                .filter(|u| !u.is_empty())
                .collect(),
            query: query.into().trim().to_string(),
        }
    }

    /// Reject watch lists that would make every cycle a no-op
    pub fn validate(&self) -> SchedulerResult<()> {
        if self.urls.is_empty() {
            return Err(SchedulerError::invalid_watchlist("URL list is empty"));
        }
        if self.query.trim().is_empty() {
            return Err(SchedulerError::invalid_watchlist("query is empty"));
        }
        Ok(())
    }

    /// Query normalized for matching
    pub fn scan_query(&self) -> ScanQuery {
        ScanQuery::new(self.query.as_str())
    }
}

/// Provider of the current watch list
#[async_trait]
pub trait WatchlistSource: Send + Sync {
    /// Read the watch list to use for the next cycle
    async fn load(&self) -> SchedulerResult<Watchlist>;
}

/// In-memory watch list, updatable while the scheduler runs
#[derive(Debug, Clone, Default)]
pub struct SharedWatchlist {
    inner: Arc<RwLock<Watchlist>>,
}

impl SharedWatchlist {
    pub fn new(watchlist: Watchlist) -> Self {
        Self {
            inner: Arc::new(RwLock::new(watchlist)),
        }
    }

    /// Replace endpoints and query; empty values are rejected
    pub async fn update<I, S>(&self, urls: I, query: impl Into<String>) -> SchedulerResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let watchlist = Watchlist::new(urls, query);
        watchlist.validate()?;

        tracing::info!(
            urls = watchlist.urls.len(),
            query = %watchlist.query,
            "Watch list updated"
        );
        *self.inner.write().await = watchlist;
        Ok(())
    }

    /// Current watch list
    pub async fn snapshot(&self) -> Watchlist {
        self.inner.read().await.clone()
    }
}

#[async_trait]
impl WatchlistSource for SharedWatchlist {
    async fn load(&self) -> SchedulerResult<Watchlist> {
        Ok(self.snapshot().await)
    }
}

/// Watch list stored as a JSON file: `{"urls": [...], "query": "..."}`
///
/// A missing file reads as an empty watch list.
#[derive(Debug, Clone)]
pub struct WatchlistFile {
    path: PathBuf,
}

impl WatchlistFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `watchlist` pretty-printed, creating parent directories
    pub async fn save(&self, watchlist: &Watchlist) -> SchedulerResult<()> {
        let path_display = self.path.display().to_string();
        let json = serde_json::to_string_pretty(watchlist)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| SchedulerError::watchlist_io(&path_display, e.to_string()))?;
        }

        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| SchedulerError::watchlist_io(&path_display, e.to_string()))
    }

    /// Validate and persist a new watch list
    pub async fn update<I, S>(&self, urls: I, query: impl Into<String>) -> SchedulerResult<Watchlist>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let watchlist = Watchlist::new(urls, query);
        watchlist.validate()?;
        self.save(&watchlist).await?;
        Ok(watchlist)
    }
}

#[async_trait]
impl WatchlistSource for WatchlistFile {
    async fn load(&self) -> SchedulerResult<Watchlist> {
        let path_display = self.path.display().to_string();

        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path_display, "Watch list file not found, using empty list");
                return Ok(Watchlist::default());
            }
            Err(e) => return Err(SchedulerError::watchlist_io(path_display, e.to_string())),
        };

        let raw: Watchlist = serde_json::from_str(&content)
            .map_err(|e| SchedulerError::watchlist_parse(path_display, e.to_string()))?;

        // Hand-edited files get the same cleanup as programmatic updates
        Ok(Watchlist::new(raw.urls, raw.query))
    }
}
