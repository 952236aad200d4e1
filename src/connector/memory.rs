//! In-memory connector
//!
//! Selected with `endpoint: "memory://"`. Buckets spring into existence on
//! first write, so any bucket name works.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::{Connector, ObjectInfo};
use crate::common::{Error, Result};

type ObjectMap = BTreeMap<(String, String), Vec<u8>>;

/// Connector keeping objects in process memory
#[derive(Debug, Default)]
pub struct MemoryConnector {
    objects: Mutex<ObjectMap>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects across all buckets
    pub fn len(&self) -> usize {
        self.objects().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn objects(&self) -> MutexGuard<'_, ObjectMap> {
        self.objects.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn fetch(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        self.objects()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| Error::object_not_found(bucket, key))
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn put_object(&self, bucket: &str, key: &str, data: Vec<u8>) -> Result<()> {
        self.objects()
            .insert((bucket.to_string(), key.to_string()), data);
        Ok(())
    }

    async fn upload_multipart(&self, bucket: &str, key: &str, source: &Path) -> Result<()> {
        let data = tokio::fs::read(source).await.map_err(|e| Error::FileRead {
            path: source.display().to_string(),
            error: e.to_string(),
        })?;
        self.put_object(bucket, key, data).await
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        self.fetch(bucket, key)
    }

    async fn get_object_to_file(&self, bucket: &str, key: &str, target: &Path) -> Result<()> {
        let data = self.fetch(bucket, key)?;
        tokio::fs::write(target, data).await?;
        Ok(())
    }

    async fn head_object(&self, bucket: &str, key: &str) -> Result<Option<ObjectInfo>> {
        Ok(self
            .objects()
            .get(&(bucket.to_string(), key.to_string()))
            .map(|data| ObjectInfo {
                key: key.to_string(),
                size: data.len() as u64,
                etag: Some(format!("{:x}", Sha256::digest(data))),
            }))
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        self.objects()
            .remove(&(bucket.to_string(), key.to_string()));
        Ok(())
    }

    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .objects()
            .keys()
            .filter(|(b, k)| b == bucket && k.starts_with(prefix))
            .map(|(_, k)| k.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = MemoryConnector::new();
        store.put_object("b", "k", b"hello".to_vec()).await.unwrap();
        assert_eq!(store.get_object("b", "k").await.unwrap(), b"hello");
        assert_eq!(store.len(), 1);

        store.delete_object("b", "k").await.unwrap();
        assert!(store.is_empty());
        assert!(matches!(
            store.get_object("b", "k").await,
            Err(Error::ObjectNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_head_reports_size_and_absence() {
        let store = MemoryConnector::new();
        store.put_object("b", "k", vec![0; 42]).await.unwrap();
        let info = store.head_object("b", "k").await.unwrap().unwrap();
        assert_eq!(info.size, 42);
        assert!(store.head_object("b", "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_is_scoped_to_bucket_and_prefix() {
        let store = MemoryConnector::new();
        for key in ["dir/b", "dir/a", "other/c"] {
            store.put_object("one", key, vec![]).await.unwrap();
        }
        store.put_object("two", "dir/z", vec![]).await.unwrap();

        let keys = store.list_objects("one", "dir/").await.unwrap();
        assert_eq!(keys, vec!["dir/a".to_string(), "dir/b".to_string()]);
    }

    #[tokio::test]
    async fn test_file_transfers() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.bin");
        let target = dir.path().join("target.bin");
        std::fs::write(&source, vec![7u8; 1024]).unwrap();

        let store = MemoryConnector::new();
        store.upload_multipart("b", "big", &source).await.unwrap();
        store.get_object_to_file("b", "big", &target).await.unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), vec![7u8; 1024]);
    }
}
