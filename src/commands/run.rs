use anyhow::{Context, Result};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use darkwatch::config::Config;
use darkwatch::metrics;

use super::build_services;

pub async fn run(config: &Config, metrics_addr: Option<SocketAddr>) -> Result<()> {
    let services = build_services(config)?;

    if services.channel_names.is_empty() {
        anyhow::bail!(
            "No notification channel configured: set TELEGRAM_TOKEN and TELEGRAM_CHAT_ID, or WEBHOOK_URL"
        );
    }

    println!("Starting darkwatch");
    println!("==================");
    println!("  Proxy: {}", config.proxy.url);
    println!("  Watch list: {}", config.scheduler.watchlist_path.display());
    println!("  Period: {}s", config.scheduler.period_secs);
    println!("  Pool size: {}", config.scanner.pool_size);
    println!("  Channels: {}", services.channel_names.join(", "));
    if let Some(addr) = metrics_addr {
        println!("  Metrics: http://{addr}/metrics");
    }
    println!();

    let (metrics_stop, metrics_stopped) = oneshot::channel::<()>();
    let metrics_task = match metrics_addr {
        Some(addr) => {
            let listener = TcpListener::bind(addr)
                .await
                .with_context(|| format!("Failed to bind metrics address {addr}"))?;
            Some(tokio::spawn(metrics::serve_metrics(listener, async {
                let _ = metrics_stopped.await;
            })))
        }
        None => None,
    };

    // Mirror new matches into the log as they are broadcast
    let mut feed = services.broadcaster.subscribe();
    let feed_task = tokio::spawn(async move {
        while let Ok(outcome) = feed.recv().await {
            for result in &outcome {
                tracing::info!(url = %result.url, timestamp = %result.timestamp, "New match");
            }
        }
    });

    services.scheduler.start().await;

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    println!("Shutting down, waiting for the current cycle to finish...");
    services.scheduler.stop().await;
    feed_task.abort();

    let _ = metrics_stop.send(());
    if let Some(task) = metrics_task {
        match task.await {
            Ok(Err(e)) => tracing::error!(error = %e, "Metrics server failed"),
            Err(e) => tracing::error!(error = %e, "Metrics server task failed"),
            Ok(Ok(())) => {}
        }
    }

    println!("Stopped.");
    Ok(())
}
