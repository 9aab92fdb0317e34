//! Server-side storage of uploaded photo bytes.

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone)]
pub struct StoredAsset {
    pub content_type: String,
    pub bytes: Bytes,
}

/// Carried in `AppState` as `Arc<dyn AssetStore>`.
#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn put(&self, id: Uuid, content_type: &str, bytes: Bytes) -> Result<(), AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<StoredAsset>, AppError>;
}

pub fn photo_key(id: Uuid) -> String {
    format!("photos/{id}")
}

pub struct S3AssetStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3AssetStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl AssetStore for S3AssetStore {
    async fn put(&self, id: Uuid, content_type: &str, bytes: Bytes) -> Result<(), AppError> {
        let key = photo_key(id);
        let len = bytes.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| AppError::S3(format!("upload of {key} failed: {e}")))?;

        info!("Uploaded {len} bytes to s3://{}/{}", self.bucket, key);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<StoredAsset>, AppError> {
        let key = photo_key(id);
        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) => {
                let err = err.into_service_error();
                if err.is_no_such_key() {
                    return Ok(None);
                }
                return Err(AppError::S3(format!("read of {key} failed: {err}")));
            }
        };

        let content_type = output
            .content_type()
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();
        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| AppError::S3(format!("read of {key} failed: {e}")))?
            .into_bytes();

        Ok(Some(StoredAsset {
            content_type,
            bytes,
        }))
    }
}
