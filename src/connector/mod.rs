//! Connector handle for S3-compatible object storage
//!
//! The runner never looks inside a connector: it builds one per scenario with
//! [`connect`] and hands the same reference to every entry point of that
//! scenario. Test units talk to storage exclusively through the
//! [`Connector`] trait.

mod memory;
mod s3;

pub use memory::MemoryConnector;
pub use s3::S3Connector;

use std::path::Path;

use async_trait::async_trait;

use crate::common::{ResolvedConfiguration, Result};

/// Minimum part size accepted by S3 for every part but the last
pub const MULTIPART_CHUNK_SIZE: usize = 5 * 1024 * 1024;

/// Metadata returned by a HEAD request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    pub key: String,
    pub size: u64,
    pub etag: Option<String>,
}

/// Object storage operations consumed by test units
#[async_trait]
pub trait Connector: Send + Sync {
    /// Short name of the implementation, for logs
    fn name(&self) -> &'static str;

    /// Upload an object in a single request
    async fn put_object(&self, bucket: &str, key: &str, data: Vec<u8>) -> Result<()>;

    /// Upload a local file using a multipart upload
    async fn upload_multipart(&self, bucket: &str, key: &str, source: &Path) -> Result<()>;

    /// Download an object into memory
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;

    /// Download an object into a local file, replacing its contents
    async fn get_object_to_file(&self, bucket: &str, key: &str, target: &Path) -> Result<()>;

    /// Fetch object metadata; `None` when the object does not exist
    async fn head_object(&self, bucket: &str, key: &str) -> Result<Option<ObjectInfo>>;

    /// Delete an object
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()>;

    /// List the keys under a prefix, in lexicographic order
    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<String>>;
}

/// Build the connector for a resolved scenario configuration
pub fn connect(config: &ResolvedConfiguration) -> Box<dyn Connector> {
    if config.uses_memory_endpoint() {
        tracing::debug!("Using in-memory connector");
        return Box::new(MemoryConnector::new());
    }

    Box::new(S3Connector::new(config))
}
