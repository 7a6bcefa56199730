//! In-memory bucket and object storage.
//!
//! [`bucket::BucketRegistry`] and [`object::ObjectRegistry`] hold the data,
//! each behind its own lock.  [`store::MemStore`] is the facade callers use.

pub mod bucket;
pub mod object;
pub mod store;

pub use bucket::{Bucket, BucketRegistry};
pub use object::{ObjectRegistry, StoredObject, CURRENT_VERSION, MEMORY_STORAGE_CLASS};
pub use store::MemStore;
