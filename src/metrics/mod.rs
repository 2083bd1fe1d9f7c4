//! Prometheus metrics for the scanner and scheduler
//!
//! Tracks cycle execution, gate decisions, fetch failures and matches.
//!
//! # Usage
//!
//! Call `init_metrics()` at application startup to register all metrics.
//! If initialization fails, metrics operations become no-ops.
//!
//! [`serve_metrics`] exposes them at `GET /metrics` for scraping.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use prometheus::{
    register_counter, register_gauge, register_histogram, Counter, Encoder, Gauge, Histogram,
    TextEncoder,
};
use std::future::Future;
use std::sync::OnceLock;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

// ============================================================================
// Metrics Storage
// ============================================================================

/// Container for all scanner metrics
struct ScanMetrics {
    cycles_run: Counter,
    cycles_skipped: Counter,
    cycle_duration: Histogram,
    fetch_failures: Counter,
    endpoints_given_up: Counter,
    matches_found: Counter,
    loop_errors: Counter,
    is_running: Gauge,
}

/// Global storage for scanner metrics
static SCAN_METRICS: OnceLock<ScanMetrics> = OnceLock::new();

/// Flag to track if initialization was attempted
static METRICS_INIT_ATTEMPTED: OnceLock<bool> = OnceLock::new();

// ============================================================================
// Initialization
// ============================================================================

/// Initialize all Prometheus metrics
///
/// Call once at startup. A second call is a no-op.
///
/// ```ignore
/// if let Err(e) = darkwatch::metrics::init_metrics() {
///     tracing::warn!(error = %e, "Metrics disabled");
/// }
/// ```
pub fn init_metrics() -> Result<(), Box<dyn std::error::Error>> {
    if METRICS_INIT_ATTEMPTED.get().is_some() {
        return Ok(());
    }
    METRICS_INIT_ATTEMPTED.set(true).ok();

    let metrics = ScanMetrics {
        cycles_run: register_counter!(
            "darkwatch_cycles_run_total",
            "Total number of scan cycles executed"
        )?,
        cycles_skipped: register_counter!(
            "darkwatch_cycles_skipped_total",
            "Total number of cycles skipped because the proxy was unhealthy"
        )?,
        cycle_duration: register_histogram!(
            "darkwatch_cycle_duration_seconds",
            "Time spent running one scan cycle in seconds",
            vec![1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0]
        )?,
        fetch_failures: register_counter!(
            "darkwatch_fetch_failures_total",
            "Total number of failed fetch attempts"
        )?,
        endpoints_given_up: register_counter!(
            "darkwatch_endpoints_given_up_total",
            "Total number of endpoints reported unreachable after exhausting retries"
        )?,
        matches_found: register_counter!(
            "darkwatch_matches_found_total",
            "Total number of keyword matches"
        )?,
        loop_errors: register_counter!(
            "darkwatch_loop_errors_total",
            "Total number of failed scheduler iterations"
        )?,
        is_running: register_gauge!(
            "darkwatch_scheduler_running",
            "Whether the scheduler loop is running (1 = yes, 0 = no)"
        )?,
    };

    SCAN_METRICS
        .set(metrics)
        .map_err(|_| "Scan metrics already initialized")?;

    tracing::info!("Prometheus metrics initialized successfully");
    Ok(())
}

/// Check if metrics have been initialized
pub fn metrics_initialized() -> bool {
    SCAN_METRICS.get().is_some()
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Encode all metrics to Prometheus text format
pub fn gather_metrics() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

// ============================================================================
// HTTP Exposition
// ============================================================================

/// Router serving `GET /metrics` in the Prometheus text format
pub fn metrics_router() -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
}

async fn metrics_handler() -> Response {
    match gather_metrics() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to encode metrics").into_response()
        }
    }
}

/// Serve the metrics router on `listener` until `shutdown` resolves
pub async fn serve_metrics(
    listener: TcpListener,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(addr = %addr, "Serving metrics at /metrics");
    }

    axum::serve(listener, metrics_router())
        .with_graceful_shutdown(shutdown)
        .await
}

/// Record a completed cycle and the number of matches it produced
pub fn record_cycle(matches: usize) {
    let Some(m) = SCAN_METRICS.get() else {
        return;
    };

    m.cycles_run.inc();
    if matches > 0 {
        m.matches_found.inc_by(matches as f64);
    }
}

/// Record a cycle skipped by the health gate
pub fn record_cycle_skipped() {
    if let Some(m) = SCAN_METRICS.get() {
        m.cycles_skipped.inc();
    }
}

/// Record one failed fetch attempt
pub fn record_fetch_failure() {
    if let Some(m) = SCAN_METRICS.get() {
        m.fetch_failures.inc();
    }
}

/// Record an endpoint reported unreachable
pub fn record_endpoint_given_up() {
    if let Some(m) = SCAN_METRICS.get() {
        m.endpoints_given_up.inc();
    }
}

/// Record a failed scheduler iteration
pub fn record_loop_error() {
    if let Some(m) = SCAN_METRICS.get() {
        m.loop_errors.inc();
    }
}

/// Update the scheduler running gauge
pub fn set_scheduler_running(running: bool) {
    if let Some(m) = SCAN_METRICS.get() {
        m.is_running.set(if running { 1.0 } else { 0.0 });
    }
}

/// Histogram timer guard that records duration on drop
pub struct MetricsTimer {
    timer: Option<prometheus::HistogramTimer>,
}

impl Drop for MetricsTimer {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.stop_and_record();
        }
    }
}

/// Start timing a cycle
pub fn start_cycle_timer() -> MetricsTimer {
    MetricsTimer {
        timer: SCAN_METRICS.get().map(|m| m.cycle_duration.start_timer()),
    }
}

// ============================================================================
// Tests
// ============================================================================
