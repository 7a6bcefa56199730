//! In-process client exposing the S3 capability surface.
//!
//! [`MemClient::send`] is a synchronous call straight into a [`MemStore`]:
//! no network I/O and no serialization.  Bucket and object CRUD are
//! handled; every other capability is rejected with
//! [`StoreError::Unsupported`] before the store is touched.

pub mod operation;
pub mod request;

use std::sync::Arc;

use crate::errors::StoreError;
use crate::metrics::record_operation;
use crate::storage::MemStore;

pub use operation::S3Operation;
pub use request::{Body, S3Request, S3Response, UnsupportedOperation};

/// Client stub backed by an in-memory store.
#[derive(Debug, Clone)]
pub struct MemClient {
    store: Arc<MemStore>,
}

impl MemClient {
    pub fn new(store: Arc<MemStore>) -> Self {
        Self { store }
    }

    /// The store this client operates on.
    pub fn store(&self) -> &Arc<MemStore> {
        &self.store
    }

    /// Execute `request` against the store.
    pub fn send(&self, request: S3Request) -> Result<S3Response, StoreError> {
        let operation = request.operation();
        let result = self.dispatch(request);
        match &result {
            Ok(_) => record_operation(operation.as_str(), "ok"),
            Err(e) => {
                tracing::debug!(%operation, code = e.code(), "request failed");
                record_operation(operation.as_str(), e.code());
            }
        }
        result
    }

    fn dispatch(&self, request: S3Request) -> Result<S3Response, StoreError> {
        match request {
            S3Request::CreateBucket { bucket } => {
                Ok(S3Response::BucketCreated(self.store.create_bucket(&bucket)))
            }
            S3Request::DeleteBucket { bucket } => {
                self.store.delete_bucket(&bucket);
                Ok(S3Response::BucketDeleted)
            }
            S3Request::PutObject { bucket, key, body } => self
                .store
                .put_object(&bucket, &key, body)
                .map(S3Response::ObjectStored),
            S3Request::GetObject { bucket, key } => {
                Ok(S3Response::Object(self.store.get_object(&bucket, &key)))
            }
            S3Request::DeleteObject { bucket, key } => {
                self.store.delete_object(&bucket, &key);
                Ok(S3Response::ObjectDeleted)
            }
            S3Request::Other(unsupported) => Err(StoreError::Unsupported {
                operation: unsupported.operation(),
            }),
        }
    }

    /// Delete `bucket/key`.  Succeeds whether or not the object existed.
    pub fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StoreError> {
        self.send(S3Request::delete_object(bucket, key)).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn client() -> MemClient {
        MemClient::new(Arc::new(MemStore::new()))
    }

    #[test]
    fn test_bucket_lifecycle() {
        let client = client();
        let response = client.send(S3Request::create_bucket("b")).unwrap();
        assert!(matches!(response, S3Response::BucketCreated(ref b) if b.name == "b"));

        client.send(S3Request::delete_bucket("b")).unwrap();
        assert!(client.store().get_bucket("b").is_none());
    }

    #[test]
    fn test_put_get_delete() {
        let client = client();
        client.send(S3Request::create_bucket("b")).unwrap();
        client
            .send(S3Request::put_object("b", "k", Cursor::new("payload")))
            .unwrap();

        match client.send(S3Request::get_object("b", "k")).unwrap() {
            S3Response::Object(Some(object)) => assert_eq!(&object.content[..], b"payload"),
            other => panic!("unexpected response: {other:?}"),
        }

        client.delete_object("b", "k").unwrap();
        assert_eq!(
            client.send(S3Request::get_object("b", "k")).unwrap(),
            S3Response::Object(None)
        );
    }

    #[test]
    fn test_put_to_missing_bucket_surfaces_error() {
        let client = client();
        let err = client
            .send(S3Request::put_object("nope", "k", Cursor::new("x")))
            .unwrap_err();
        assert!(matches!(err, StoreError::NoSuchBucket { .. }));
    }

    #[test]
    fn test_delete_without_bucket_succeeds() {
        let client = client();
        client.delete_object("nope", "k").unwrap();
        client.delete_object("nope", "k").unwrap();
    }

    #[test]
    fn test_other_operations_unsupported() {
        let client = client();
        for op in S3Operation::ALL.iter().filter(|op| !op.is_implemented()) {
            let err = client.send(S3Request::other(*op).unwrap()).unwrap_err();
            match err {
                StoreError::Unsupported { operation } => assert_eq!(operation, *op),
                other => panic!("unexpected error: {other:?}"),
            }
        }
        assert!(client.store().list_buckets().is_empty());
    }

    #[test]
    fn test_named_delete_object_routes_to_typed_request() {
        let client = client();
        client.send(S3Request::create_bucket("demo")).unwrap();
        client
            .send(S3Request::put_object("demo", "file.txt", Cursor::new("hello")))
            .unwrap();

        let op = S3Operation::from_name("DeleteObject").unwrap();
        assert!(S3Request::other(op).is_none());

        let request = match op {
            S3Operation::DeleteObject => S3Request::delete_object("demo", "file.txt"),
            other => panic!("unexpected operation: {other}"),
        };
        assert_eq!(client.send(request).unwrap(), S3Response::ObjectDeleted);
        assert!(client.store().get_object("demo", "file.txt").is_none());
    }

    #[test]
    fn test_clones_share_store() {
        let client = client();
        let other = client.clone();
        client.send(S3Request::create_bucket("b")).unwrap();
        assert!(other.store().get_bucket("b").is_some());
    }
}
