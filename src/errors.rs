//! S3-style error types for the in-memory store.
//!
//! Every variant maps to a well-known S3 error code via [`StoreError::code`].
//! Reads and deletes of missing entities are not errors: they surface as
//! `None` or as a silent no-op.

use thiserror::Error;

use crate::client::operation::S3Operation;

/// Errors returned by the storage facade and the client stub.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A write targeted a bucket that is not registered.
    #[error("The specified bucket does not exist")]
    NoSuchBucket { bucket: String },

    /// The object body could not be fully drained into memory.
    #[error("Failed to read upload body for {bucket}/{key}: {source}")]
    UploadReadFailure {
        bucket: String,
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// The object body is larger than the configured cap.
    #[error("Your proposed upload exceeds the maximum allowed object size ({size} > {max})")]
    EntityTooLarge { size: u64, max: u64 },

    /// The client stub has no implementation for this capability.
    #[error("Operation {operation} is not supported by the in-memory client")]
    Unsupported { operation: S3Operation },
}

impl StoreError {
    /// Return the S3 error code string.
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::NoSuchBucket { .. } => "NoSuchBucket",
            StoreError::UploadReadFailure { .. } => "NoSuchUpload",
            StoreError::EntityTooLarge { .. } => "EntityTooLarge",
            StoreError::Unsupported { .. } => "NotImplemented",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        let err = StoreError::NoSuchBucket {
            bucket: "b".to_string(),
        };
        assert_eq!(err.code(), "NoSuchBucket");

        let err = StoreError::Unsupported {
            operation: S3Operation::PutBucketCors,
        };
        assert_eq!(err.code(), "NotImplemented");
        assert!(err.to_string().contains("PutBucketCors"));
    }

    #[test]
    fn test_upload_read_failure_keeps_source() {
        let err = StoreError::UploadReadFailure {
            bucket: "b".to_string(),
            key: "k".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed"),
        };
        assert_eq!(err.code(), "NoSuchUpload");
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("b/k"));
    }
}
