//! memstore -- in-memory S3-style object store.
//!
//! This crate provides a bucket registry and an object registry guarded by
//! their own locks, a [`storage::MemStore`] facade over both, and a
//! [`client::MemClient`] that exposes the S3 capability surface, handling
//! bucket and object CRUD in process and rejecting everything else as
//! unsupported.

pub mod client;
pub mod config;
pub mod errors;
pub mod logging;
pub mod metrics;
pub mod storage;

pub use client::{MemClient, S3Operation, S3Request, S3Response};
pub use errors::StoreError;
pub use storage::{Bucket, MemStore, StoredObject};

/// Set up logging and, when enabled, the Prometheus recorder from a loaded
/// [`config::Config`].
pub fn init_observability(
    config: &config::Config,
) -> Option<&'static metrics_exporter_prometheus::PrometheusHandle> {
    logging::init_logging(&config.logging);
    crate::metrics::init_from_config(&config.observability)
}
