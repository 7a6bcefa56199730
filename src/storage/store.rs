//! Storage facade over the bucket and object registries.
//!
//! [`MemStore`] is constructed explicitly and handed to whoever needs it;
//! two stores never share state.  It owns no data beyond the two
//! registries and mediates every access through their locks.

use std::io::Read;
use std::sync::Arc;

use super::bucket::{Bucket, BucketRegistry};
use super::object::{ObjectRegistry, StoredObject};
use crate::config::StorageConfig;
use crate::errors::StoreError;
use crate::metrics::BUCKETS_TOTAL;

/// In-memory bucket and object store.
#[derive(Debug)]
pub struct MemStore {
    buckets: Arc<BucketRegistry>,
    objects: ObjectRegistry,
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemStore {
    /// Create an empty store with default limits.
    pub fn new() -> Self {
        Self::with_config(&StorageConfig::default())
    }

    /// Create an empty store using the storage section of the config.
    pub fn with_config(config: &StorageConfig) -> Self {
        let buckets = Arc::new(BucketRegistry::new());
        let objects = ObjectRegistry::with_limits(
            Arc::clone(&buckets),
            config.max_object_size,
            &config.storage_class,
        );
        tracing::info!(
            max_object_size = config.max_object_size,
            storage_class = %config.storage_class,
            "in-memory store initialized"
        );
        Self { buckets, objects }
    }

    /// The underlying bucket registry.
    pub fn buckets(&self) -> &BucketRegistry {
        &self.buckets
    }

    /// The underlying object registry.
    pub fn objects(&self) -> &ObjectRegistry {
        &self.objects
    }

    // ── Buckets ─────────────────────────────────────────────────────

    /// Register `bucket`, replacing any bucket of the same name.
    pub fn register_bucket(&self, bucket: Bucket) {
        if self.buckets.register_bucket(bucket).is_none() {
            metrics::gauge!(BUCKETS_TOTAL).increment(1.0);
        }
    }

    /// Register a bucket named `name`, stamped with the current time.
    pub fn create_bucket(&self, name: &str) -> Bucket {
        let bucket = Bucket::created_now(name);
        self.register_bucket(bucket.clone());
        bucket
    }

    pub fn get_bucket(&self, name: &str) -> Option<Bucket> {
        self.buckets.lookup_bucket(name)
    }

    /// Remove `bucket` from the registry.  Objects written under it stay in
    /// the object registry but no new writes are accepted.
    pub fn remove_bucket(&self, bucket: &Bucket) {
        if self.buckets.remove_bucket(bucket).is_some() {
            metrics::gauge!(BUCKETS_TOTAL).decrement(1.0);
        }
    }

    /// Remove the bucket named `name`.  Idempotent.
    pub fn delete_bucket(&self, name: &str) {
        self.remove_bucket(&Bucket::new(name));
    }

    /// All registered buckets, sorted by name.
    pub fn list_buckets(&self) -> Vec<Bucket> {
        self.buckets.list_buckets()
    }

    // ── Objects ─────────────────────────────────────────────────────

    /// Drain `body` and store it at `bucket/key`.
    pub fn put_object<R: Read>(
        &self,
        bucket: &str,
        key: &str,
        body: R,
    ) -> Result<StoredObject, StoreError> {
        self.objects.put_object(bucket, key, body)
    }

    pub fn get_object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.objects.get_object(bucket, key)
    }

    pub fn get_object_version(
        &self,
        bucket: &str,
        key: &str,
        version_id: &str,
    ) -> Option<StoredObject> {
        self.objects.get_object_version(bucket, key, version_id)
    }

    /// Remove `bucket/key`.  Missing objects and buckets are a no-op.
    pub fn delete_object(&self, bucket: &str, key: &str) {
        self.objects.delete_object(bucket, key);
    }

    /// Current objects in `bucket`, sorted by key.
    pub fn list_objects(&self, bucket: &str) -> Vec<StoredObject> {
        self.objects.list_objects(bucket)
    }

    /// Clear both registries.
    ///
    /// Not atomic with respect to in-flight operations on this store; a
    /// fresh [`MemStore`] is the preferred way to isolate test runs.
    pub fn reset_all(&self) {
        let buckets = self.buckets.clear();
        let objects = self.objects.clear();
        metrics::gauge!(BUCKETS_TOTAL).decrement(buckets as f64);
        tracing::info!(buckets, objects, "in-memory store reset");
    }
}
