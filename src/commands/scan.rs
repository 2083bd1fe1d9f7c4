use anyhow::Result;

use darkwatch::config::Config;

use super::build_services;

pub async fn scan(config: &Config) -> Result<()> {
    let services = build_services(config)?;

    println!("Running one scan cycle");
    println!("======================");

    let Some(outcome) = services.scheduler.run_once().await? else {
        println!("Proxy is not healthy, scan skipped.");
        return Ok(());
    };

    if outcome.is_empty() {
        println!("No matches.");
        return Ok(());
    }

    println!("{} match(es):", outcome.len());
    for result in &outcome {
        println!();
        println!("  {} ({})", result.url, result.timestamp.format("%Y-%m-%d %H:%M:%S UTC"));
        println!("  {}", darkwatch::utils::truncate_chars(&result.content, 160));
    }

    Ok(())
}
