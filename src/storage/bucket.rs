//! Bucket registry.
//!
//! Maps bucket name to [`Bucket`] under a single mutex.  Registration
//! overwrites on conflict and removal of an absent bucket is a no-op.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A named top-level container for objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    /// Bucket name (case-sensitive).
    pub name: String,
    /// Creation timestamp, if the creator stamped one.
    pub created_at: Option<DateTime<Utc>>,
}

impl Bucket {
    /// Bucket descriptor with no creation metadata.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            created_at: None,
        }
    }

    /// Bucket descriptor stamped with the current time.
    pub fn created_now(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            created_at: Some(Utc::now()),
        }
    }
}

/// Registry of buckets keyed by name.
#[derive(Debug, Default)]
pub struct BucketRegistry {
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl BucketRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Bucket>> {
        self.buckets.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or replace the bucket entry keyed by its name, returning the
    /// entry it replaced.
    pub fn register_bucket(&self, bucket: Bucket) -> Option<Bucket> {
        let mut buckets = self.lock();
        tracing::debug!(bucket = %bucket.name, "registering bucket");
        buckets.insert(bucket.name.clone(), bucket)
    }

    /// Return the bucket registered under `name`, if any.
    pub fn lookup_bucket(&self, name: &str) -> Option<Bucket> {
        self.lock().get(name).cloned()
    }

    /// Whether a bucket named `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.lock().contains_key(name)
    }

    /// Remove the entry keyed by the bucket's name.  Idempotent.
    pub fn remove_bucket(&self, bucket: &Bucket) -> Option<Bucket> {
        let removed = self.lock().remove(&bucket.name);
        if removed.is_some() {
            tracing::debug!(bucket = %bucket.name, "removed bucket");
        }
        removed
    }

    /// All registered buckets, sorted by name.
    pub fn list_buckets(&self) -> Vec<Bucket> {
        let mut buckets: Vec<_> = self.lock().values().cloned().collect();
        buckets.sort_by(|a, b| a.name.cmp(&b.name));
        buckets
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop every registered bucket, returning how many were removed.
    pub fn clear(&self) -> usize {
        std::mem::take(&mut *self.lock()).len()
    }
}
