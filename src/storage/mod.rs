//! Object storage access.
//!
//! [`ObjectStore`] is the narrow get/put contract both pipeline stages
//! depend on. [`S3Store`] implements it against an S3 bucket using the
//! ambient AWS configuration; [`MemoryStore`] backs tests with an
//! in-process map so no stage ever needs a real bucket.

mod memory;
mod s3;

pub use memory::MemoryStore;
pub use s3::S3Store;

use anyhow::Result;
use bytes::Bytes;

/// Get/put access to a single bucket.
///
/// Keys are full object keys including the `raw/` or `results/` prefix.
/// `get` distinguishes an absent object (`Ok(None)`) from a transport
/// failure (`Err`), leaving the missing-object policy to the caller.
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores `body` at `key`, overwriting any existing object.
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<()>;

    /// Retrieves the object at `key`, or `None` if no such object exists.
    async fn get(&self, key: &str) -> Result<Option<Bytes>>;
}
