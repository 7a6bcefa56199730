//! Object registry.
//!
//! A three-level map (bucket -> key -> version -> [`StoredObject`]) behind a
//! single mutex.  Writes always land in the [`CURRENT_VERSION`] slot, so a
//! second write to the same key replaces the first with no history kept.
//!
//! Bucket existence is checked against the shared [`BucketRegistry`]; the
//! two registries are locked independently, so a bucket removed while a
//! write is in flight may or may not reject that write.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use md5::{Digest, Md5};
use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::bucket::BucketRegistry;
use crate::errors::StoreError;
use crate::metrics::{BYTES_RECEIVED_TOTAL, OBJECTS_TOTAL};

/// Version slot every write targets.
pub const CURRENT_VERSION: &str = "1";

/// Storage-class marker for objects held in memory.
pub const MEMORY_STORAGE_CLASS: &str = "memory";

/// An object payload plus its metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Object key within its bucket.
    pub key: String,
    /// Version slot the object occupies.
    pub version_id: String,
    /// Time of the write that produced this object.
    pub last_modified: DateTime<Utc>,
    /// Storage-class marker.
    pub storage_class: String,
    /// Payload length in bytes.
    pub size: u64,
    /// Quoted MD5-hex ETag of the payload.
    pub etag: String,
    /// Fully materialized payload.
    pub content: Bytes,
}

type VersionMap = BTreeMap<String, StoredObject>;
type KeyMap = HashMap<String, VersionMap>;

/// Registry of objects keyed by bucket, key, and version.
#[derive(Debug)]
pub struct ObjectRegistry {
    objects: Mutex<HashMap<String, KeyMap>>,
    buckets: Arc<BucketRegistry>,
    /// Maximum payload size in bytes.  0 means unlimited.
    max_object_size: u64,
    storage_class: String,
}

impl ObjectRegistry {
    /// Create an empty registry that validates writes against `buckets`.
    pub fn new(buckets: Arc<BucketRegistry>) -> Self {
        Self::with_limits(buckets, 0, MEMORY_STORAGE_CLASS)
    }

    /// Create an empty registry with a payload cap and storage-class marker.
    pub fn with_limits(
        buckets: Arc<BucketRegistry>,
        max_object_size: u64,
        storage_class: &str,
    ) -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            buckets,
            max_object_size,
            storage_class: storage_class.to_string(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, KeyMap>> {
        self.objects.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Compute the quoted MD5-hex ETag for a byte slice.
    fn compute_etag(data: &[u8]) -> String {
        let mut hasher = Md5::new();
        hasher.update(data);
        format!("\"{}\"", hex::encode(hasher.finalize()))
    }

    /// Drain `body` into memory, honouring the size cap.
    fn read_body<R: Read>(&self, bucket: &str, key: &str, body: R) -> Result<Bytes, StoreError> {
        let mut buf = Vec::new();
        let limit = match self.max_object_size {
            0 => u64::MAX,
            max => max.saturating_add(1),
        };
        let read = body.take(limit).read_to_end(&mut buf);
        read.map_err(|source| StoreError::UploadReadFailure {
            bucket: bucket.to_string(),
            key: key.to_string(),
            source,
        })?;

        let size = buf.len() as u64;
        if self.max_object_size > 0 && size > self.max_object_size {
            return Err(StoreError::EntityTooLarge {
                size,
                max: self.max_object_size,
            });
        }
        Ok(Bytes::from(buf))
    }

    /// Store the full contents of `body` at `bucket/key`, replacing any
    /// previous payload.
    pub fn put_object<R: Read>(
        &self,
        bucket: &str,
        key: &str,
        body: R,
    ) -> Result<StoredObject, StoreError> {
        if !self.buckets.contains(bucket) {
            tracing::warn!(bucket, key, "rejecting write to unknown bucket");
            return Err(StoreError::NoSuchBucket {
                bucket: bucket.to_string(),
            });
        }

        let content = self.read_body(bucket, key, body)?;
        let object = StoredObject {
            key: key.to_string(),
            version_id: CURRENT_VERSION.to_string(),
            last_modified: Utc::now(),
            storage_class: self.storage_class.clone(),
            size: content.len() as u64,
            etag: Self::compute_etag(&content),
            content,
        };

        let previous = {
            let mut objects = self.lock();
            objects
                .entry(bucket.to_string())
                .or_default()
                .entry(key.to_string())
                .or_default()
                .insert(CURRENT_VERSION.to_string(), object.clone())
        };

        if previous.is_none() {
            metrics::gauge!(OBJECTS_TOTAL).increment(1.0);
        }
        metrics::counter!(BYTES_RECEIVED_TOTAL).increment(object.size);
        tracing::debug!(bucket, key, size = object.size, "stored object");

        Ok(object)
    }

    /// Current version of `bucket/key`, if present.
    pub fn get_object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.get_object_version(bucket, key, CURRENT_VERSION)
    }

    /// A specific version of `bucket/key`, if present.
    pub fn get_object_version(
        &self,
        bucket: &str,
        key: &str,
        version_id: &str,
    ) -> Option<StoredObject> {
        self.lock()
            .get(bucket)
            .and_then(|keys| keys.get(key))
            .and_then(|versions| versions.get(version_id))
            .cloned()
    }

    /// Remove the current version of `bucket/key`, pruning maps left empty.
    /// Deleting a missing object is a no-op.
    pub fn delete_object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        let removed = {
            let mut objects = self.lock();
            let Some(keys) = objects.get_mut(bucket) else {
                return None;
            };
            let removed = keys
                .get_mut(key)
                .and_then(|versions| versions.remove(CURRENT_VERSION));
            if keys.get(key).is_some_and(BTreeMap::is_empty) {
                keys.remove(key);
            }
            if keys.is_empty() {
                objects.remove(bucket);
            }
            removed
        };

        if removed.is_some() {
            metrics::gauge!(OBJECTS_TOTAL).decrement(1.0);
            tracing::debug!(bucket, key, "deleted object");
        }
        removed
    }

    /// Current versions of every object in `bucket`, sorted by key.
    pub fn list_objects(&self, bucket: &str) -> Vec<StoredObject> {
        let objects = self.lock();
        let mut listed: Vec<_> = objects
            .get(bucket)
            .map(|keys| {
                keys.values()
                    .filter_map(|versions| versions.get(CURRENT_VERSION).cloned())
                    .collect()
            })
            .unwrap_or_default();
        listed.sort_by(|a, b| a.key.cmp(&b.key));
        listed
    }

    /// Whether any key-level map exists under `bucket`.
    pub fn has_bucket_entry(&self, bucket: &str) -> bool {
        self.lock().contains_key(bucket)
    }

    /// Number of stored objects across all buckets and versions.
    pub fn len(&self) -> usize {
        self.lock()
            .values()
            .flat_map(HashMap::values)
            .map(BTreeMap::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every stored object, returning how many were removed.
    pub fn clear(&self) -> usize {
        let removed: usize = std::mem::take(&mut *self.lock())
            .values()
            .flat_map(HashMap::values)
            .map(BTreeMap::len)
            .sum();
        metrics::gauge!(OBJECTS_TOTAL).decrement(removed as f64);
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::bucket::Bucket;
    use std::io::{self, Cursor};

    fn registry_with_bucket(name: &str) -> ObjectRegistry {
        let buckets = Arc::new(BucketRegistry::new());
        buckets.register_bucket(Bucket::new(name));
        ObjectRegistry::new(buckets)
    }

    /// Reader that yields some bytes and then fails.
    struct FailingReader {
        served: bool,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.served {
                return Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
            }
            self.served = true;
            buf[..3].copy_from_slice(b"abc");
            Ok(3)
        }
    }

    #[test]
    fn test_put_and_get_roundtrip() {
        let registry = registry_with_bucket("b");
        let stored = registry
            .put_object("b", "key.txt", Cursor::new("hello world"))
            .unwrap();

        assert_eq!(stored.key, "key.txt");
        assert_eq!(stored.version_id, CURRENT_VERSION);
        assert_eq!(stored.storage_class, MEMORY_STORAGE_CLASS);
        assert_eq!(stored.size, 11);

        let fetched = registry.get_object("b", "key.txt").unwrap();
        assert_eq!(fetched.content, Bytes::from("hello world"));
        assert_eq!(fetched, stored);
    }

    #[test]
    fn test_etag_is_md5() {
        let registry = registry_with_bucket("b");
        let stored = registry.put_object("b", "empty", io::empty()).unwrap();
        assert_eq!(stored.etag, "\"d41d8cd98f00b204e9800998ecf8427e\"");
        assert_eq!(stored.size, 0);
    }

    #[test]
    fn test_put_unknown_bucket() {
        let registry = registry_with_bucket("b");
        let err = registry
            .put_object("other", "k", Cursor::new("x"))
            .unwrap_err();
        assert!(matches!(err, StoreError::NoSuchBucket { ref bucket } if bucket == "other"));
        assert!(!registry.has_bucket_entry("other"));
    }

    #[test]
    fn test_put_read_failure() {
        let registry = registry_with_bucket("b");
        let err = registry
            .put_object("b", "k", FailingReader { served: false })
            .unwrap_err();
        assert!(matches!(err, StoreError::UploadReadFailure { .. }));
        assert!(registry.get_object("b", "k").is_none());
    }

    #[test]
    fn test_put_overwrites() {
        let registry = registry_with_bucket("b");
        registry.put_object("b", "k", Cursor::new("version 1")).unwrap();
        registry.put_object("b", "k", Cursor::new("version 2")).unwrap();

        let fetched = registry.get_object("b", "k").unwrap();
        assert_eq!(fetched.content, Bytes::from("version 2"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_get_missing_levels() {
        let registry = registry_with_bucket("b");
        assert!(registry.get_object("nope", "k").is_none());
        assert!(registry.get_object("b", "k").is_none());

        registry.put_object("b", "k", Cursor::new("x")).unwrap();
        assert!(registry.get_object_version("b", "k", "2").is_none());
        assert!(registry.get_object_version("b", "k", CURRENT_VERSION).is_some());
    }

    #[test]
    fn test_delete_prunes_empty_maps() {
        let registry = registry_with_bucket("b");
        registry.put_object("b", "k", Cursor::new("x")).unwrap();

        assert!(registry.delete_object("b", "k").is_some());
        assert!(registry.get_object("b", "k").is_none());
        assert!(!registry.has_bucket_entry("b"));
    }

    #[test]
    fn test_delete_nonexistent_is_ok() {
        let registry = registry_with_bucket("b");
        assert!(registry.delete_object("b", "k").is_none());
        assert!(registry.delete_object("missing", "k").is_none());
    }

    #[test]
    fn test_delete_keeps_sibling_keys() {
        let registry = registry_with_bucket("b");
        registry.put_object("b", "a", Cursor::new("1")).unwrap();
        registry.put_object("b", "c", Cursor::new("2")).unwrap();

        registry.delete_object("b", "a");
        assert!(registry.has_bucket_entry("b"));
        assert!(registry.get_object("b", "c").is_some());
    }

    #[test]
    fn test_list_objects_sorted() {
        let registry = registry_with_bucket("b");
        for key in ["z.txt", "a.txt", "m.txt"] {
            registry.put_object("b", key, Cursor::new(key)).unwrap();
        }
        let keys: Vec<_> = registry
            .list_objects("b")
            .into_iter()
            .map(|o| o.key)
            .collect();
        assert_eq!(keys, vec!["a.txt", "m.txt", "z.txt"]);
        assert!(registry.list_objects("other").is_empty());
    }

    #[test]
    fn test_size_limit() {
        let buckets = Arc::new(BucketRegistry::new());
        buckets.register_bucket(Bucket::new("b"));
        let registry = ObjectRegistry::with_limits(buckets, 4, MEMORY_STORAGE_CLASS);

        registry.put_object("b", "fits", Cursor::new("1234")).unwrap();
        let err = registry
            .put_object("b", "big", Cursor::new("12345"))
            .unwrap_err();
        assert!(matches!(err, StoreError::EntityTooLarge { size: 5, max: 4 }));
        assert!(registry.get_object("b", "big").is_none());
    }

    #[test]
    fn test_custom_storage_class() {
        let buckets = Arc::new(BucketRegistry::new());
        buckets.register_bucket(Bucket::new("b"));
        let registry = ObjectRegistry::with_limits(buckets, 0, "scratch");

        let stored = registry.put_object("b", "k", Cursor::new("x")).unwrap();
        assert_eq!(stored.storage_class, "scratch");
    }

    #[test]
    fn test_clear() {
        let registry = registry_with_bucket("b");
        registry.put_object("b", "k", Cursor::new("x")).unwrap();
        registry.put_object("b", "k2", Cursor::new("y")).unwrap();
        assert_eq!(registry.clear(), 2);
        assert!(registry.is_empty());
        assert!(registry.get_object("b", "k").is_none());
    }
}
