use anyhow::{Context, Result};
use std::sync::Arc;

use darkwatch::config::Config;
use darkwatch::health::{HealthCheck, ProxyHealthGate};
use darkwatch::proxy::ProxyClient;

/// Check the proxy and print the verdict; returns whether it is healthy
pub async fn health(config: &Config) -> Result<bool> {
    let client = ProxyClient::new(&config.proxy).context("Failed to create proxy client")?;
    let gate = ProxyHealthGate::from_config(Arc::new(client), &config.proxy);

    println!("Checking proxy {} via {}", config.proxy.url, gate.check_url());

    let healthy = gate.check().await;
    if healthy {
        println!("Proxy is healthy: traffic exits through Tor.");
    } else {
        println!("Proxy is NOT healthy.");
    }

    Ok(healthy)
}
