//! Bounded fan-out of fetch workers over the watched endpoints

use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;

use super::FetchWorker;
use crate::models::{Endpoint, ScanOutcome, ScanQuery};

/// Runs one scan cycle across every endpoint with a bounded number of fetches in flight
pub struct ScanPool {
    worker: Arc<FetchWorker>,
    pool_size: usize,
}

impl ScanPool {
    /// Create a pool running at most `pool_size` fetches at once
    pub fn new(worker: Arc<FetchWorker>, pool_size: usize) -> Self {
        Self {
            worker,
            pool_size: pool_size.max(1),
        }
    }

    /// Maximum number of concurrent fetches
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// The worker dispatched for each endpoint
    pub fn worker(&self) -> &Arc<FetchWorker> {
        &self.worker
    }

    /// Fetch every endpoint and collect the matches
    ///
    /// Returns only once every fetch, retries included, has finished. An empty
    /// endpoint list or a blank query yields an empty outcome without touching
    /// the network. Repeated endpoints are fetched once per cycle.
    pub async fn run_cycle(&self, endpoints: &[Endpoint], query: &ScanQuery) -> ScanOutcome {
        // One fetch per endpoint, since failure counters are keyed by URL
        let endpoints: Vec<Endpoint> = {
            let mut seen = HashSet::new();
            endpoints
                .iter()
                .filter(|&endpoint| seen.insert(endpoint.as_str()))
                .cloned()
                .collect()
        };

        if endpoints.is_empty() || query.is_empty() {
            tracing::warn!(
                endpoints = endpoints.len(),
                query_empty = query.is_empty(),
                "No endpoints or query configured, skipping scan"
            );
            return ScanOutcome::new();
        }

        tracing::info!(
            endpoints = endpoints.len(),
            pool_size = self.pool_size,
            query = %query,
            "Starting scan cycle"
        );

        let outcome: ScanOutcome = stream::iter(endpoints)
            .map(|endpoint| {
                let worker = self.worker.clone();
                let query = query.clone();

                async move { worker.fetch(&endpoint, &query).await }
            })
            .buffer_unordered(self.pool_size)
            .filter_map(|result| async move { result })
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .collect();

        tracing::info!(matches = outcome.len(), "Scan cycle complete");
        outcome
    }
}
