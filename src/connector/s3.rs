//! S3 connector backed by `aws-sdk-s3`

use std::path::Path;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use aws_sdk_s3::Client;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use super::{Connector, ObjectInfo, MULTIPART_CHUNK_SIZE};
use crate::common::{Error, ResolvedConfiguration, Result};

/// Connector talking to a real S3-compatible endpoint
#[derive(Debug, Clone)]
pub struct S3Connector {
    client: Client,
}

impl S3Connector {
    /// Build a client from the resolved scenario configuration
    pub fn new(config: &ResolvedConfiguration) -> Self {
        match config.signature.to_ascii_lowercase().as_str() {
            "v4" => {}
            "v2" => tracing::warn!("Signature v2 is not supported by the S3 client; signing with v4"),
            other => tracing::warn!(signature = other, "Unknown signature method; signing with v4"),
        }

        let credentials = Credentials::new(
            config.access.clone(),
            config.secret.clone(),
            None,
            None,
            "minitest",
        );

        let mut builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .force_path_style(config.path_access)
            .use_dual_stack(config.dualstack);

        if let Some(endpoint) = config.endpoint() {
            builder = builder.endpoint_url(endpoint);
        }

        tracing::debug!(
            region = %config.region,
            path_access = config.path_access,
            dualstack = config.dualstack,
            endpoint = config.endpoint().unwrap_or("<default>"),
            "Created S3 client"
        );

        Self {
            client: Client::from_conf(builder.build()),
        }
    }

    async fn abort_multipart(&self, bucket: &str, key: &str, upload_id: &str) {
        if let Err(e) = self
            .client
            .abort_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .send()
            .await
        {
            tracing::warn!(
                key,
                upload_id,
                "Failed to abort multipart upload: {}",
                DisplayErrorContext(&e)
            );
        }
    }

    async fn upload_parts(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        source: &Path,
    ) -> Result<Vec<CompletedPart>> {
        let mut file = tokio::fs::File::open(source).await.map_err(|e| Error::FileRead {
            path: source.display().to_string(),
            error: e.to_string(),
        })?;

        let mut parts = Vec::new();
        let mut part_number = 1;

        loop {
            let chunk = read_chunk(&mut file, MULTIPART_CHUNK_SIZE).await?;
            if chunk.is_empty() && part_number > 1 {
                break;
            }
            let last = chunk.len() < MULTIPART_CHUNK_SIZE;

            let response = self
                .client
                .upload_part()
                .bucket(bucket)
                .key(key)
                .upload_id(upload_id)
                .part_number(part_number)
                .body(ByteStream::from(chunk))
                .send()
                .await
                .map_err(|e| Error::connector("UploadPart", DisplayErrorContext(&e)))?;

            tracing::debug!(key, part_number, "Uploaded part");

            parts.push(
                CompletedPart::builder()
                    .part_number(part_number)
                    .set_e_tag(response.e_tag().map(str::to_string))
                    .build(),
            );

            if last {
                break;
            }
            part_number += 1;
        }

        Ok(parts)
    }
}

/// Fill a buffer of up to `size` bytes; shorter only at end of file
async fn read_chunk(file: &mut tokio::fs::File, size: usize) -> Result<Vec<u8>> {
    let mut buffer = vec![0u8; size];
    let mut filled = 0;

    while filled < size {
        let read = file.read(&mut buffer[filled..]).await?;
        if read == 0 {
            break;
        }
        filled += read;
    }

    buffer.truncate(filled);
    Ok(buffer)
}

#[async_trait]
impl Connector for S3Connector {
    fn name(&self) -> &'static str {
        "s3"
    }

    async fn put_object(&self, bucket: &str, key: &str, data: Vec<u8>) -> Result<()> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| Error::connector("PutObject", DisplayErrorContext(&e)))?;
        Ok(())
    }

    async fn upload_multipart(&self, bucket: &str, key: &str, source: &Path) -> Result<()> {
        let created = self
            .client
            .create_multipart_upload()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| Error::connector("CreateMultipartUpload", DisplayErrorContext(&e)))?;

        let upload_id = created
            .upload_id()
            .ok_or_else(|| Error::connector("CreateMultipartUpload", "no upload ID returned"))?
            .to_string();

        let parts = match self.upload_parts(bucket, key, &upload_id, source).await {
            Ok(parts) => parts,
            Err(e) => {
                self.abort_multipart(bucket, key, &upload_id).await;
                return Err(e);
            }
        };

        let completed = CompletedMultipartUpload::builder()
            .set_parts(Some(parts))
            .build();

        if let Err(e) = self
            .client
            .complete_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(&upload_id)
            .multipart_upload(completed)
            .send()
            .await
        {
            self.abort_multipart(bucket, key, &upload_id).await;
            return Err(Error::connector(
                "CompleteMultipartUpload",
                DisplayErrorContext(&e),
            ));
        }

        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| Error::connector("GetObject", DisplayErrorContext(&e)))?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| Error::connector("GetObject", e))?;

        Ok(data.into_bytes().to_vec())
    }

    async fn get_object_to_file(&self, bucket: &str, key: &str, target: &Path) -> Result<()> {
        let mut response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| Error::connector("GetObject", DisplayErrorContext(&e)))?;

        let mut file = tokio::fs::File::create(target).await?;
        while let Some(chunk) = response
            .body
            .try_next()
            .await
            .map_err(|e| Error::connector("GetObject", e))?
        {
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        Ok(())
    }

    async fn head_object(&self, bucket: &str, key: &str) -> Result<Option<ObjectInfo>> {
        match self.client.head_object().bucket(bucket).key(key).send().await {
            Ok(response) => Ok(Some(ObjectInfo {
                key: key.to_string(),
                size: response.content_length().unwrap_or_default().max(0) as u64,
                etag: response.e_tag().map(str::to_string),
            })),
            Err(e) if e.as_service_error().map(|s| s.is_not_found()).unwrap_or(false) => Ok(None),
            Err(e) => Err(Error::connector("HeadObject", DisplayErrorContext(&e))),
        }
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| Error::connector("DeleteObject", DisplayErrorContext(&e)))?;
        Ok(())
    }

    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let response = self
                .client
                .list_objects_v2()
                .bucket(bucket)
                .prefix(prefix)
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(|e| Error::connector("ListObjectsV2", DisplayErrorContext(&e)))?;

            keys.extend(
                response
                    .contents()
                    .iter()
                    .filter_map(|object| object.key().map(str::to_string)),
            );

            match (response.is_truncated(), response.next_continuation_token()) {
                (Some(true), Some(token)) => continuation = Some(token.to_string()),
                _ => break,
            }
        }

        keys.sort();
        Ok(keys)
    }
}
