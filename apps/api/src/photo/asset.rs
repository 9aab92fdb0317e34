use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::photo::transfer::{AssetTransfer, TransferError};

/// Handle to a photo: a URL that can be displayed directly, plus the raw
/// bytes when this process has them.
///
/// Only the URL and content type are serialised, so the same reference can be
/// stored in a [`crate::cv::models::CvRecord`]. References built with
/// [`AssetReference::from_bytes`] carry a `data:` URL until the upload
/// resolves to a remote one.
#[derive(Clone, Serialize, Deserialize)]
pub struct AssetReference {
    url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content_type: Option<String>,
    #[serde(skip)]
    bytes: Option<Bytes>,
}

impl AssetReference {
    /// Local reference, usable for preview before any upload happened.
    pub fn from_bytes(bytes: Bytes, content_type: &str) -> Self {
        let url = format!("data:{content_type};base64,{}", STANDARD.encode(&bytes));
        Self {
            url,
            content_type: Some(content_type.to_string()),
            bytes: Some(bytes),
        }
    }

    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            content_type: None,
            bytes: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Keeps `bytes` alongside a remote URL so they can be re-read without
    /// another round trip.
    pub fn with_bytes(mut self, bytes: Bytes) -> Self {
        self.bytes = Some(bytes);
        self
    }

    pub fn direct_url(&self) -> &str {
        &self.url
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Bytes held in memory, if any.
    pub fn cached_bytes(&self) -> Option<&Bytes> {
        self.bytes.as_ref()
    }

    pub fn is_local(&self) -> bool {
        self.url.starts_with("data:")
    }

    /// Returns the asset's bytes: from memory, from a `data:` URL, or fetched
    /// through `transfer`.
    pub async fn get_bytes(&self, transfer: &dyn AssetTransfer) -> Result<Bytes, TransferError> {
        if let Some(bytes) = &self.bytes {
            return Ok(bytes.clone());
        }
        if let Some(bytes) = self.decode_data_url()? {
            return Ok(bytes);
        }
        transfer.fetch(self).await
    }

    fn decode_data_url(&self) -> Result<Option<Bytes>, TransferError> {
        let Some(rest) = self.url.strip_prefix("data:") else {
            return Ok(None);
        };
        let (_, payload) = rest
            .split_once(";base64,")
            .ok_or_else(|| TransferError::Failed("unsupported data URL".to_string()))?;
        STANDARD
            .decode(payload)
            .map(|b| Some(Bytes::from(b)))
            .map_err(|e| TransferError::Failed(format!("invalid data URL: {e}")))
    }
}

// Identity is the URL and content type; cached bytes are a local detail.
impl PartialEq for AssetReference {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url && self.content_type == other.content_type
    }
}

impl Eq for AssetReference {}

impl fmt::Debug for AssetReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const MAX_URL: usize = 64;
        let url = match self.url.char_indices().nth(MAX_URL) {
            Some((cut, _)) => format!("{}…", &self.url[..cut]),
            None => self.url.clone(),
        };
        f.debug_struct("AssetReference")
            .field("url", &url)
            .field("content_type", &self.content_type)
            .field("cached_bytes", &self.bytes.as_ref().map(Bytes::len))
            .finish()
    }
}
