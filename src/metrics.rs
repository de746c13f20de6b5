//! Observability metrics for log shipping
//!
//! Counters cover remote-call retries, downloaded and skipped log files, and
//! checkpoint writes. Recording is always cheap: without an installed
//! recorder the `metrics` macros are no-ops, so the exporter is only started
//! when `--metrics-addr` is given.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::Lazy;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

static METRICS_INITIALIZED: Lazy<Arc<RwLock<bool>>> = Lazy::new(|| Arc::new(RwLock::new(false)));

/// Initialize the Prometheus exporter
///
/// Idempotent; a second call is a no-op.
///
/// # Arguments
/// * `addr` - Socket address for the scrape endpoint (e.g., "0.0.0.0:9090")
pub async fn init_metrics(addr: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    let mut initialized = METRICS_INITIALIZED.write().await;
    if *initialized {
        debug!("Metrics already initialized, skipping");
        return Ok(());
    }

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))?;

    describe_counter!(
        "remote_retries_total",
        Unit::Count,
        "Retry attempts of RDS and S3 calls"
    );
    describe_counter!(
        "log_files_downloaded_total",
        Unit::Count,
        "Log files downloaded completely"
    );
    describe_counter!(
        "log_files_skipped_total",
        Unit::Count,
        "Log files skipped as already captured"
    );
    describe_counter!(
        "log_bytes_downloaded_total",
        Unit::Bytes,
        "Bytes of log content downloaded"
    );
    describe_histogram!(
        "log_file_pages",
        Unit::Count,
        "Portions fetched per downloaded log file"
    );
    describe_counter!(
        "checkpoint_writes_total",
        Unit::Count,
        "Checkpoint writes by result"
    );
    describe_counter!(
        "sync_passes_total",
        Unit::Count,
        "Completed sync passes by result"
    );

    *initialized = true;
    info!(%addr, "Metrics exporter listening");
    Ok(())
}

/// Record a retry of a remote operation
pub fn record_retry(operation: &str, attempt: u32) {
    counter!(
        "remote_retries_total",
        "operation" => operation.to_string(),
        "attempt" => attempt.to_string(),
    )
    .increment(1);
}

/// Record one fully downloaded log file
pub fn record_file_downloaded(instance: &str, bytes: usize, pages: usize) {
    counter!("log_files_downloaded_total", "instance" => instance.to_string()).increment(1);
    counter!("log_bytes_downloaded_total", "instance" => instance.to_string())
        .increment(bytes as u64);
    histogram!("log_file_pages").record(pages as f64);
}

/// Record a log file skipped as already captured
pub fn record_file_skipped(instance: &str) {
    counter!("log_files_skipped_total", "instance" => instance.to_string()).increment(1);
}

/// Record the result of a checkpoint write
pub fn record_checkpoint_write(instance: &str, ok: bool) {
    counter!(
        "checkpoint_writes_total",
        "instance" => instance.to_string(),
        "result" => result_label(ok),
    )
    .increment(1);
}

/// Record the end of a sync pass
pub fn record_pass(instance: &str, ok: bool) {
    counter!(
        "sync_passes_total",
        "instance" => instance.to_string(),
        "result" => result_label(ok),
    )
    .increment(1);
}

fn result_label(ok: bool) -> &'static str {
    if ok {
        "success"
    } else {
        "failure"
    }
}
