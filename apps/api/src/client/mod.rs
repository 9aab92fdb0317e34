//! HTTP adapter for the editor side: implements [`CvBackend`] and
//! [`AssetTransfer`] against the cvsync API.
//!
//! Timeouts belong here, not in the editor session or the upload controller.
//! No retries: a failed call surfaces to the caller, who decides whether to
//! invoke the action again.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use reqwest::{header, Body, Client, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::cv::backend::{BackendError, CvBackend};
use crate::cv::models::{CvRecord, UserProfile};
use crate::photo::asset::AssetReference;
use crate::photo::handlers::UploadedAsset;
use crate::photo::transfer::{AssetTransfer, ProgressCallback, TransferError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const UPLOAD_CHUNK_BYTES: usize = 64 * 1024;

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    user_id: Uuid,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, user_id: Uuid) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_id,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Asset URLs returned by the API are service-relative.
    fn resolve(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            self.url(url)
        }
    }

    fn user_query(&self) -> [(&'static str, Uuid); 1] {
        [("user_id", self.user_id)]
    }
}

fn unavailable(e: reqwest::Error) -> BackendError {
    BackendError::Unavailable(e.to_string())
}

/// Passes successful responses through and turns the rest into `Rejected`,
/// using the API's error message when the body carries one.
async fn expect_success(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiError>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);
    warn!("API returned {status}: {message}");
    Err(BackendError::Rejected {
        status: status.as_u16(),
        message,
    })
}

fn percent(sent: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((sent as u64 * 100) / total as u64).min(100) as u8
}

#[async_trait]
impl CvBackend for HttpBackend {
    async fn load_cv(&self) -> Result<Option<CvRecord>, BackendError> {
        let response = self
            .client
            .get(self.url("/api/v1/cv"))
            .query(&self.user_query())
            .send()
            .await
            .map_err(unavailable)?;
        expect_success(response)
            .await?
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    async fn save_cv(&self, record: &CvRecord) -> Result<(), BackendError> {
        let response = self
            .client
            .put(self.url("/api/v1/cv"))
            .query(&self.user_query())
            .json(record)
            .send()
            .await
            .map_err(unavailable)?;
        expect_success(response).await?;
        Ok(())
    }

    async fn clear_cv(&self) -> Result<(), BackendError> {
        let response = self
            .client
            .delete(self.url("/api/v1/cv"))
            .query(&self.user_query())
            .send()
            .await
            .map_err(unavailable)?;
        expect_success(response).await?;
        Ok(())
    }

    async fn load_profile(&self) -> Result<Option<UserProfile>, BackendError> {
        let response = self
            .client
            .get(self.url("/api/v1/profile"))
            .query(&self.user_query())
            .send()
            .await
            .map_err(unavailable)?;
        expect_success(response)
            .await?
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    async fn save_profile(&self, profile: &UserProfile) -> Result<(), BackendError> {
        let response = self
            .client
            .put(self.url("/api/v1/profile"))
            .query(&self.user_query())
            .json(profile)
            .send()
            .await
            .map_err(unavailable)?;
        expect_success(response).await?;
        Ok(())
    }
}

#[async_trait]
impl AssetTransfer for HttpBackend {
    /// Streams the bytes in fixed-size chunks, reporting the share handed to
    /// the transport so far, and 100 once the API confirmed the upload.
    async fn upload(
        &self,
        local: AssetReference,
        on_progress: ProgressCallback,
    ) -> Result<AssetReference, TransferError> {
        let bytes = local
            .cached_bytes()
            .cloned()
            .ok_or_else(|| TransferError::Failed("no local bytes to upload".to_string()))?;
        let content_type = local
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();

        let total = bytes.len();
        let chunks: Vec<Bytes> = (0..total)
            .step_by(UPLOAD_CHUNK_BYTES)
            .map(|start| bytes.slice(start..(start + UPLOAD_CHUNK_BYTES).min(total)))
            .collect();
        let progress = Arc::clone(&on_progress);
        let mut sent = 0usize;
        let stream = futures::stream::iter(chunks).map(move |chunk| {
            sent += chunk.len();
            progress(percent(sent, total));
            Ok::<Bytes, std::io::Error>(chunk)
        });

        debug!("Uploading {total} bytes ({content_type})");
        let response = self
            .client
            .post(self.url("/api/v1/assets"))
            .header(header::CONTENT_TYPE, &content_type)
            .body(Body::wrap_stream(stream))
            .send()
            .await
            .map_err(|e| TransferError::Failed(e.to_string()))?;
        let uploaded: UploadedAsset = expect_success(response)
            .await
            .map_err(|e| TransferError::Failed(e.to_string()))?
            .json()
            .await
            .map_err(|e| TransferError::Failed(e.to_string()))?;

        on_progress(100);
        Ok(AssetReference::from_url(self.resolve(&uploaded.url))
            .with_content_type(uploaded.content_type)
            .with_bytes(bytes))
    }

    async fn fetch(&self, asset: &AssetReference) -> Result<Bytes, TransferError> {
        let url = self.resolve(asset.direct_url());
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| TransferError::Failed(e.to_string()))?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(TransferError::NotFound(url)),
            s if !s.is_success() => Err(TransferError::Failed(format!("GET {url} returned {s}"))),
            _ => response
                .bytes()
                .await
                .map_err(|e| TransferError::Failed(e.to_string())),
        }
    }
}
