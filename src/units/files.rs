//! File helpers shared by the test units

use std::io::Write;
use std::path::Path;

use rand::distributions::Alphanumeric;
use rand::{Rng, RngCore};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use crate::common::{Error, Result};
use crate::connector::Connector;

/// Key prefix for every object the test units create
pub const REMOTE_PREFIX: &str = "minitest";

pub const KB: usize = 1024;
pub const MB: usize = 1024 * KB;

/// Create a temporary file filled with `size` random bytes
pub fn create_random_file(size: usize) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    let mut rng = rand::thread_rng();
    let mut buffer = vec![0u8; 64 * KB];
    let mut remaining = size;

    while remaining > 0 {
        let chunk = remaining.min(buffer.len());
        rng.fill_bytes(&mut buffer[..chunk]);
        file.write_all(&buffer[..chunk])?;
        remaining -= chunk;
    }

    file.flush()?;
    Ok(file)
}

/// Random suffix keeping object keys of concurrent runs apart
pub fn random_suffix() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(12)
        .map(char::from)
        .collect::<String>()
        .to_lowercase()
}

/// Build a remote key under the shared prefix
pub fn remote_key(name: &str) -> String {
    format!("{}/{}", REMOTE_PREFIX, name)
}

/// SHA-256 of a local file, hex encoded
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path).map_err(|e| Error::FileRead {
        path: path.display().to_string(),
        error: e.to_string(),
    })?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// Upload a local file in a single request
pub async fn upload_small(
    s3: &dyn Connector,
    local: &Path,
    bucket: &str,
    remote: &str,
) -> Result<()> {
    let data = tokio::fs::read(local).await.map_err(|e| Error::FileRead {
        path: local.display().to_string(),
        error: e.to_string(),
    })?;
    s3.put_object(bucket, remote, data).await
}

/// Upload a local file with a multipart upload
pub async fn upload_big(
    s3: &dyn Connector,
    local: &Path,
    bucket: &str,
    remote: &str,
) -> Result<()> {
    s3.upload_multipart(bucket, remote, local).await
}

/// Download an object into memory and compare it with the local file
pub async fn download_and_verify_small(
    s3: &dyn Connector,
    local: &Path,
    bucket: &str,
    remote: &str,
) -> Result<bool> {
    let expected = tokio::fs::read(local).await?;
    let actual = s3.get_object(bucket, remote).await?;
    Ok(actual == expected)
}

/// Download an object to a temporary file and compare SHA-256 hashes
///
/// The temporary file is removed whatever the outcome.
pub async fn download_and_verify_big(
    s3: &dyn Connector,
    local: &Path,
    bucket: &str,
    remote: &str,
) -> Result<bool> {
    let temp = NamedTempFile::new()?;
    s3.get_object_to_file(bucket, remote, temp.path()).await?;

    let local_hash = sha256_file(local)?;
    let remote_hash = sha256_file(temp.path())?;
    tracing::debug!(remote, %local_hash, %remote_hash, "Compared hashes");

    Ok(local_hash == remote_hash)
}
