//! Request and response types for the in-memory client.

use std::fmt;
use std::io::Read;

use super::operation::S3Operation;
use crate::storage::{Bucket, StoredObject};

/// Object body handed to a `PutObject` request.
pub type Body = Box<dyn Read + Send>;

/// A named capability the client has no handler for.
///
/// Only constructible for operations where
/// [`S3Operation::is_implemented`] is false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnsupportedOperation(S3Operation);

impl UnsupportedOperation {
    /// `None` if the client handles `operation`.
    pub fn new(operation: S3Operation) -> Option<Self> {
        (!operation.is_implemented()).then_some(Self(operation))
    }

    pub fn operation(&self) -> S3Operation {
        self.0
    }
}

/// A request addressed to the client.
///
/// Operations the client handles carry typed inputs; every other named
/// capability is expressed as [`S3Request::Other`].
pub enum S3Request {
    CreateBucket { bucket: String },
    DeleteBucket { bucket: String },
    PutObject { bucket: String, key: String, body: Body },
    GetObject { bucket: String, key: String },
    DeleteObject { bucket: String, key: String },
    Other(UnsupportedOperation),
}

impl S3Request {
    /// Request for a capability by name alone.  `None` for the operations
    /// the client handles, which need typed inputs.
    pub fn other(operation: S3Operation) -> Option<Self> {
        UnsupportedOperation::new(operation).map(S3Request::Other)
    }

    pub fn create_bucket(bucket: impl Into<String>) -> Self {
        S3Request::CreateBucket {
            bucket: bucket.into(),
        }
    }

    pub fn delete_bucket(bucket: impl Into<String>) -> Self {
        S3Request::DeleteBucket {
            bucket: bucket.into(),
        }
    }

    pub fn put_object(
        bucket: impl Into<String>,
        key: impl Into<String>,
        body: impl Read + Send + 'static,
    ) -> Self {
        S3Request::PutObject {
            bucket: bucket.into(),
            key: key.into(),
            body: Box::new(body),
        }
    }

    pub fn get_object(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        S3Request::GetObject {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    pub fn delete_object(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        S3Request::DeleteObject {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// The operation this request targets.
    pub fn operation(&self) -> S3Operation {
        match self {
            S3Request::CreateBucket { .. } => S3Operation::CreateBucket,
            S3Request::DeleteBucket { .. } => S3Operation::DeleteBucket,
            S3Request::PutObject { .. } => S3Operation::PutObject,
            S3Request::GetObject { .. } => S3Operation::GetObject,
            S3Request::DeleteObject { .. } => S3Operation::DeleteObject,
            S3Request::Other(unsupported) => unsupported.operation(),
        }
    }
}

impl fmt::Debug for S3Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            S3Request::CreateBucket { bucket } | S3Request::DeleteBucket { bucket } => f
                .debug_struct(self.operation().as_str())
                .field("bucket", bucket)
                .finish(),
            S3Request::PutObject { bucket, key, .. } => f
                .debug_struct("PutObject")
                .field("bucket", bucket)
                .field("key", key)
                .finish_non_exhaustive(),
            S3Request::GetObject { bucket, key } | S3Request::DeleteObject { bucket, key } => f
                .debug_struct(self.operation().as_str())
                .field("bucket", bucket)
                .field("key", key)
                .finish(),
            S3Request::Other(unsupported) => f
                .debug_tuple("Other")
                .field(&unsupported.operation())
                .finish(),
        }
    }
}

/// Successful outcome of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum S3Response {
    BucketCreated(Bucket),
    BucketDeleted,
    ObjectStored(StoredObject),
    /// `None` when the bucket, key, or version slot is absent.
    Object(Option<StoredObject>),
    ObjectDeleted,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_operation_names() {
        assert_eq!(
            S3Request::create_bucket("b").operation(),
            S3Operation::CreateBucket
        );
        assert_eq!(
            S3Request::put_object("b", "k", Cursor::new(Vec::new())).operation(),
            S3Operation::PutObject
        );
        assert_eq!(
            S3Request::other(S3Operation::PutBucketTagging)
                .unwrap()
                .operation(),
            S3Operation::PutBucketTagging
        );
    }

    #[test]
    fn test_other_rejects_implemented_operations() {
        for op in S3Operation::ALL {
            assert_eq!(S3Request::other(*op).is_none(), op.is_implemented());
            assert_eq!(UnsupportedOperation::new(*op).is_none(), op.is_implemented());
        }
        let by_name = S3Operation::from_name("DeleteObject").unwrap();
        assert!(S3Request::other(by_name).is_none());
    }

    #[test]
    fn test_debug_omits_body() {
        let request = S3Request::put_object("b", "k", Cursor::new(b"secret".to_vec()));
        let rendered = format!("{request:?}");
        assert!(rendered.contains("PutObject"));
        assert!(!rendered.contains("secret"));
    }
}
