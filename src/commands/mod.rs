pub mod health;
pub mod results;
pub mod run;
pub mod scan;
pub mod watch;

// Re-export command functions for convenience
pub use health::health;
pub use results::results;
pub use run::run;
pub use scan::scan;
pub use watch::watch;

use anyhow::{Context, Result};
use std::sync::Arc;

use darkwatch::broadcast::ChannelBroadcaster;
use darkwatch::config::Config;
use darkwatch::error::Error;
use darkwatch::health::ProxyHealthGate;
use darkwatch::notifications::{NotificationManager, Notifier};
use darkwatch::proxy::{PageSource, ProxyClient};
use darkwatch::scanner::{FailureTracker, FetchWorker, ScanPool};
use darkwatch::scheduler::{Scheduler, WatchlistFile};
use darkwatch::storage::SqliteResultStore;

/// Everything wired together from one configuration
pub struct Services {
    pub scheduler: Scheduler,
    pub broadcaster: Arc<ChannelBroadcaster>,
    pub channel_names: Vec<String>,
}

/// Assemble the scheduler and its collaborators
pub fn build_services(config: &Config) -> Result<Services> {
    let client: Arc<dyn PageSource> =
        Arc::new(ProxyClient::new(&config.proxy).context("Failed to create proxy client")?);

    let manager = NotificationManager::from_config(&config.notifications)
        .context("Failed to configure notification channels")?;
    let channel_names = manager
        .channel_names()
        .into_iter()
        .map(str::to_string)
        .collect();
    let notifier: Arc<dyn Notifier> = Arc::new(manager);

    let store = SqliteResultStore::open(&config.storage.sqlite_path)
        .map_err(Error::from)
        .with_context(|| {
            format!(
                "Failed to open result database {}",
                config.storage.sqlite_path.display()
            )
        })?;

    let worker = FetchWorker::from_config(
        client.clone(),
        Arc::new(FailureTracker::new()),
        notifier.clone(),
        config,
    );
    let pool = ScanPool::new(Arc::new(worker), config.scanner.pool_size);
    let broadcaster = Arc::new(ChannelBroadcaster::default());

    let scheduler = Scheduler::builder(
        pool,
        Arc::new(ProxyHealthGate::from_config(client, &config.proxy)),
        Arc::new(WatchlistFile::new(&config.scheduler.watchlist_path)),
        notifier,
        Arc::new(store),
    )
    .broadcaster(broadcaster.clone())
    .period(config.period())
    .unhealthy_backoff(config.unhealthy_backoff())
    .build();

    Ok(Services {
        scheduler,
        broadcaster,
        channel_names,
    })
}
