//! The closed set of named S3 capabilities a client is expected to expose.

macro_rules! s3_operations {
    ($($name:ident),+ $(,)?) => {
        /// Every named S3 capability.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum S3Operation {
            $(
                #[doc = concat!("The ", stringify!($name), " operation.")]
                $name,
            )+
        }

        impl S3Operation {
            /// All operations, in declaration order.
            pub const ALL: &'static [S3Operation] = &[$(S3Operation::$name),+];

            /// The operation name as it appears in the S3 API.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(S3Operation::$name => stringify!($name),)+
                }
            }

            /// Look up an operation by its S3 API name.
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $(stringify!($name) => Some(S3Operation::$name),)+
                    _ => None,
                }
            }
        }
    };
}

s3_operations! {
    AbortMultipartUpload,
    CompleteMultipartUpload,
    CopyObject,
    CreateBucket,
    CreateMultipartUpload,
    DeleteBucket,
    DeleteBucketAnalyticsConfiguration,
    DeleteBucketCors,
    DeleteBucketEncryption,
    DeleteBucketInventoryConfiguration,
    DeleteBucketLifecycle,
    DeleteBucketMetricsConfiguration,
    DeleteBucketPolicy,
    DeleteBucketReplication,
    DeleteBucketTagging,
    DeleteBucketWebsite,
    DeleteObject,
    DeleteObjectTagging,
    DeleteObjects,
    DeletePublicAccessBlock,
    GetBucketAccelerateConfiguration,
    GetBucketAcl,
    GetBucketAnalyticsConfiguration,
    GetBucketCors,
    GetBucketEncryption,
    GetBucketInventoryConfiguration,
    GetBucketLifecycle,
    GetBucketLifecycleConfiguration,
    GetBucketLocation,
    GetBucketLogging,
    GetBucketMetricsConfiguration,
    GetBucketNotification,
    GetBucketNotificationConfiguration,
    GetBucketPolicy,
    GetBucketPolicyStatus,
    GetBucketReplication,
    GetBucketRequestPayment,
    GetBucketTagging,
    GetBucketVersioning,
    GetBucketWebsite,
    GetObject,
    GetObjectAcl,
    GetObjectLegalHold,
    GetObjectLockConfiguration,
    GetObjectRetention,
    GetObjectTagging,
    GetObjectTorrent,
    GetPublicAccessBlock,
    HeadBucket,
    HeadObject,
    ListBucketAnalyticsConfigurations,
    ListBucketInventoryConfigurations,
    ListBucketMetricsConfigurations,
    ListBuckets,
    ListMultipartUploads,
    ListObjectVersions,
    ListObjects,
    ListObjectsV2,
    ListParts,
    PutBucketAccelerateConfiguration,
    PutBucketAcl,
    PutBucketAnalyticsConfiguration,
    PutBucketCors,
    PutBucketEncryption,
    PutBucketInventoryConfiguration,
    PutBucketLifecycle,
    PutBucketLifecycleConfiguration,
    PutBucketLogging,
    PutBucketMetricsConfiguration,
    PutBucketNotification,
    PutBucketNotificationConfiguration,
    PutBucketPolicy,
    PutBucketReplication,
    PutBucketRequestPayment,
    PutBucketTagging,
    PutBucketVersioning,
    PutBucketWebsite,
    PutObject,
    PutObjectAcl,
    PutObjectLegalHold,
    PutObjectLockConfiguration,
    PutObjectRetention,
    PutObjectTagging,
    PutPublicAccessBlock,
    RestoreObject,
    UploadPart,
    UploadPartCopy,
    WaitUntilBucketExists,
    WaitUntilBucketNotExists,
    WaitUntilObjectExists,
    WaitUntilObjectNotExists,
}

impl S3Operation {
    /// Whether the in-memory client handles this operation.
    pub fn is_implemented(&self) -> bool {
        matches!(
            self,
            S3Operation::CreateBucket
                | S3Operation::DeleteBucket
                | S3Operation::PutObject
                | S3Operation::GetObject
                | S3Operation::DeleteObject
        )
    }
}

impl std::fmt::Display for S3Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
