//! Prometheus metrics for the in-memory store.
//!
//! Installs a global Prometheus recorder using `metrics-exporter-prometheus`
//! and defines the metric name constants recorded by the storage facade and
//! the client stub.  When no recorder is installed every macro is a no-op.

use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

use crate::config::ObservabilityConfig;

// -- Metric name constants ----------------------------------------------------

/// Total operations (counter). Labels: operation, status.
pub const OPERATIONS_TOTAL: &str = "memstore_operations_total";

/// Total objects currently stored (gauge).
pub const OBJECTS_TOTAL: &str = "memstore_objects_total";

/// Total registered buckets (gauge).
pub const BUCKETS_TOTAL: &str = "memstore_buckets_total";

/// Total bytes accepted by object writes (counter).
pub const BYTES_RECEIVED_TOTAL: &str = "memstore_bytes_received_total";

// -- Global recorder installation ---------------------------------------------

static PROMETHEUS_HANDLE: OnceLock<Option<PrometheusHandle>> = OnceLock::new();

/// Install the global Prometheus metrics recorder. Idempotent -- safe to call
/// multiple times (e.g. in tests).  Returns `None` if another recorder was
/// already installed by the host application.
pub fn init_metrics() -> Option<&'static PrometheusHandle> {
    PROMETHEUS_HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::warn!("Prometheus recorder not installed: {e}");
                None
            }
        })
        .as_ref()
}

/// Register metric descriptions with the global recorder. Call once after
/// `init_metrics()`.
pub fn describe_metrics() {
    describe_counter!(OPERATIONS_TOTAL, "Total operations by name and status");
    describe_gauge!(OBJECTS_TOTAL, "Total objects across all buckets");
    describe_gauge!(BUCKETS_TOTAL, "Total registered buckets");
    describe_counter!(BYTES_RECEIVED_TOTAL, "Total bytes accepted by object writes");
}

/// Install and describe the global recorder when `config.metrics` is set.
///
/// Returns the handle when metrics are enabled and the recorder is ours;
/// with metrics disabled no recorder is installed and every `memstore_*`
/// metric stays a no-op.
pub fn init_from_config(config: &ObservabilityConfig) -> Option<&'static PrometheusHandle> {
    if !config.metrics {
        tracing::info!("Prometheus metrics disabled");
        return None;
    }
    let handle = init_metrics()?;
    describe_metrics();
    tracing::info!("Prometheus metrics initialized");
    Some(handle)
}

/// Render the current metrics in Prometheus exposition format, if a
/// recorder is installed.
pub fn render() -> Option<String> {
    PROMETHEUS_HANDLE
        .get()
        .and_then(|handle| handle.as_ref())
        .map(PrometheusHandle::render)
}

/// Increment the operation counter for `operation` with the given outcome.
pub(crate) fn record_operation(operation: &'static str, status: &'static str) {
    metrics::counter!(OPERATIONS_TOTAL, "operation" => operation, "status" => status)
        .increment(1);
}
