use anyhow::{Context, Result};

use darkwatch::config::Config;
use darkwatch::error::Error;
use darkwatch::storage::SqliteResultStore;

pub fn results(config: &Config, limit: usize) -> Result<()> {
    let store = SqliteResultStore::open(&config.storage.sqlite_path)
        .map_err(Error::from)
        .with_context(|| {
            format!(
                "Failed to open result database {}",
                config.storage.sqlite_path.display()
            )
        })?;

    let total = store.count().map_err(Error::from)?;
    let results = store.recent(limit).map_err(Error::from)?;

    println!("Stored matches: {total} (showing {})", results.len());
    println!("==========================");

    for result in results {
        println!();
        println!("  {}", result.timestamp.format("%Y-%m-%d %H:%M:%S UTC"));
        println!("  {}", result.url);
        println!("  {}", darkwatch::utils::truncate_chars(&result.content, 160));
    }

    Ok(())
}
