//! In-memory fakes of the collaborator traits, shared by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::cv::backend::{BackendError, CvBackend};
use crate::cv::models::{CvRecord, UserProfile};
use crate::cv::store::CvStore;
use crate::errors::AppError;
use crate::photo::asset::AssetReference;
use crate::photo::store::{AssetStore, StoredAsset};
use crate::photo::transfer::{AssetTransfer, ProgressCallback, TransferError};

// ────────────────────────────────────────────────────────────────────────────
// Editor-side fakes
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryBackend {
    cv: Mutex<Option<CvRecord>>,
    profile: Mutex<Option<UserProfile>>,
    failing: AtomicBool,
    save_calls: AtomicUsize,
}

impl MemoryBackend {
    pub fn with_cv(record: CvRecord) -> Self {
        let backend = Self::default();
        backend.set_cv(Some(record));
        backend
    }

    pub fn set_cv(&self, record: Option<CvRecord>) {
        *self.cv.lock().unwrap() = record;
    }

    pub fn stored_cv(&self) -> Option<CvRecord> {
        self.cv.lock().unwrap().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), BackendError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("memory backend offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CvBackend for MemoryBackend {
    async fn load_cv(&self) -> Result<Option<CvRecord>, BackendError> {
        self.check()?;
        Ok(self.stored_cv())
    }

    async fn save_cv(&self, record: &CvRecord) -> Result<(), BackendError> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.set_cv(Some(record.clone()));
        Ok(())
    }

    async fn clear_cv(&self) -> Result<(), BackendError> {
        self.check()?;
        self.set_cv(None);
        Ok(())
    }

    async fn load_profile(&self) -> Result<Option<UserProfile>, BackendError> {
        self.check()?;
        Ok(self.profile.lock().unwrap().clone())
    }

    async fn save_profile(&self, profile: &UserProfile) -> Result<(), BackendError> {
        self.check()?;
        *self.profile.lock().unwrap() = Some(profile.clone());
        Ok(())
    }
}

/// Completes uploads immediately, reporting 50 then 100.
#[derive(Default)]
pub struct MemoryTransfer {
    assets: Mutex<HashMap<String, Bytes>>,
    failing: AtomicBool,
    uploads: AtomicUsize,
    fetches: AtomicUsize,
}

impl MemoryTransfer {
    pub fn put(&self, url: &str, bytes: Bytes) {
        self.assets.lock().unwrap().insert(url.to_string(), bytes);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn upload_calls(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AssetTransfer for MemoryTransfer {
    async fn upload(
        &self,
        local: AssetReference,
        on_progress: ProgressCallback,
    ) -> Result<AssetReference, TransferError> {
        let n = self.uploads.fetch_add(1, Ordering::SeqCst) + 1;
        if self.failing.load(Ordering::SeqCst) {
            return Err(TransferError::Failed("memory transfer offline".to_string()));
        }
        on_progress(50);
        let url = format!("memory://assets/{n}");
        let bytes = local.cached_bytes().cloned().unwrap_or_default();
        self.put(&url, bytes);
        on_progress(100);

        let mut remote = AssetReference::from_url(url);
        if let Some(ct) = local.content_type() {
            remote = remote.with_content_type(ct);
        }
        Ok(remote)
    }

    async fn fetch(&self, asset: &AssetReference) -> Result<Bytes, TransferError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.assets
            .lock()
            .unwrap()
            .get(asset.direct_url())
            .cloned()
            .ok_or_else(|| TransferError::NotFound(asset.direct_url().to_string()))
    }
}

struct PendingUpload {
    on_progress: ProgressCallback,
    done: Option<oneshot::Sender<Result<AssetReference, TransferError>>>,
}

/// Parks every upload until the test completes it, and hands out the
/// progress callback of each so tests can fire it at will.
#[derive(Default)]
pub struct ManualTransfer {
    pending: Mutex<Vec<PendingUpload>>,
}

impl ManualTransfer {
    /// Yields until at least `n` uploads have been started.
    pub async fn wait_for_uploads(&self, n: usize) {
        for _ in 0..10_000 {
            if self.pending.lock().unwrap().len() >= n {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("expected {n} uploads to start");
    }

    pub fn progress(&self, index: usize) -> ProgressCallback {
        self.pending.lock().unwrap()[index].on_progress.clone()
    }

    pub fn complete(&self, index: usize, result: Result<AssetReference, TransferError>) {
        let done = self.pending.lock().unwrap()[index]
            .done
            .take()
            .expect("upload already completed");
        let _ = done.send(result);
    }
}

#[async_trait]
impl AssetTransfer for ManualTransfer {
    async fn upload(
        &self,
        _local: AssetReference,
        on_progress: ProgressCallback,
    ) -> Result<AssetReference, TransferError> {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().unwrap().push(PendingUpload {
            on_progress,
            done: Some(tx),
        });
        rx.await
            .unwrap_or_else(|_| Err(TransferError::Failed("upload abandoned".to_string())))
    }

    async fn fetch(&self, asset: &AssetReference) -> Result<Bytes, TransferError> {
        Err(TransferError::NotFound(asset.direct_url().to_string()))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Server-side fakes
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryCvStore {
    cvs: Mutex<HashMap<Uuid, CvRecord>>,
    profiles: Mutex<HashMap<Uuid, UserProfile>>,
}

#[async_trait]
impl CvStore for MemoryCvStore {
    async fn get_cv(&self, user_id: Uuid) -> Result<Option<CvRecord>, AppError> {
        Ok(self.cvs.lock().unwrap().get(&user_id).cloned())
    }

    async fn put_cv(&self, user_id: Uuid, record: &CvRecord) -> Result<(), AppError> {
        self.cvs.lock().unwrap().insert(user_id, record.clone());
        Ok(())
    }

    async fn delete_cv(&self, user_id: Uuid) -> Result<(), AppError> {
        self.cvs.lock().unwrap().remove(&user_id);
        Ok(())
    }

    async fn get_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>, AppError> {
        Ok(self.profiles.lock().unwrap().get(&user_id).cloned())
    }

    async fn put_profile(&self, user_id: Uuid, profile: &UserProfile) -> Result<(), AppError> {
        self.profiles.lock().unwrap().insert(user_id, profile.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryAssetStore {
    assets: Mutex<HashMap<Uuid, StoredAsset>>,
}

#[async_trait]
impl AssetStore for MemoryAssetStore {
    async fn put(&self, id: Uuid, content_type: &str, bytes: Bytes) -> Result<(), AppError> {
        self.assets.lock().unwrap().insert(
            id,
            StoredAsset {
                content_type: content_type.to_string(),
                bytes,
            },
        );
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<StoredAsset>, AppError> {
        Ok(self.assets.lock().unwrap().get(&id).cloned())
    }
}
