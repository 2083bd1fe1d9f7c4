use anyhow::{Context, Result};

use darkwatch::config::Config;
use darkwatch::error::Error;
use darkwatch::scheduler::WatchlistFile;
use darkwatch::utils::is_onion_url;

pub async fn watch(config: &Config, urls: Vec<String>, query: String) -> Result<()> {
    let file = WatchlistFile::new(&config.scheduler.watchlist_path);
    let watchlist = file
        .update(urls, query)
        .await
        .map_err(Error::from)
        .with_context(|| format!("Failed to update {}", file.path().display()))?;

    for url in watchlist.urls.iter().filter(|u| !is_onion_url(u)) {
        tracing::warn!(url = %url, "Endpoint is not an onion service");
    }

    println!("Watch list saved to {}", file.path().display());
    println!("  Query: {}", watchlist.query);
    println!("  Endpoints: {}", watchlist.urls.len());
    for url in &watchlist.urls {
        println!("    {url}");
    }

    Ok(())
}
