//! Asset Upload Controller.
//!
//! Tracks one photo through `Empty → Validating → Uploading → Attached`.
//! Every selection (and every removal) bumps a generation counter; progress
//! callbacks and completions carry the generation they were started with and
//! are dropped once a newer one exists. A superseded transfer is not
//! cancelled, the controller just stops listening to it.
//!
//! State is published on a `tokio::sync::watch` channel so a UI can re-render
//! on every change via [`UploadController::subscribe`].

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::photo::asset::AssetReference;
use crate::photo::transfer::{AssetTransfer, ProgressCallback, SelectedFile, TransferError};
use crate::photo::validation::{validate_photo, PhotoRejection};

#[derive(Debug, Clone, PartialEq)]
pub enum UploadState {
    Empty,
    /// File accepted on its declared metadata, content being read and checked.
    Validating,
    /// Transfer in flight. `preview` is the local `data:` reference.
    Uploading {
        progress: u8,
        preview: AssetReference,
    },
    Attached(AssetReference),
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadSnapshot {
    pub generation: u64,
    pub state: UploadState,
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error(transparent)]
    Rejected(#[from] PhotoRejection),

    #[error("Failed to read the selected file: {0}")]
    Read(#[source] std::io::Error),

    #[error("Failed to upload photo. Please try again.")]
    Transfer(#[source] TransferError),

    /// A newer selection or a removal took over while this one was running.
    #[error("Upload superseded by a newer selection")]
    Superseded,
}

pub struct UploadController {
    transfer: Arc<dyn AssetTransfer>,
    state: Arc<watch::Sender<UploadSnapshot>>,
}

impl UploadController {
    pub fn new(transfer: Arc<dyn AssetTransfer>) -> Self {
        let (tx, _rx) = watch::channel(UploadSnapshot {
            generation: 0,
            state: UploadState::Empty,
        });
        Self {
            transfer,
            state: Arc::new(tx),
        }
    }

    pub fn state(&self) -> UploadState {
        self.state.borrow().state.clone()
    }

    pub fn generation(&self) -> u64 {
        self.state.borrow().generation
    }

    pub fn subscribe(&self) -> watch::Receiver<UploadSnapshot> {
        self.state.subscribe()
    }

    /// The attached photo, if the controller is settled on one.
    pub fn photo(&self) -> Option<AssetReference> {
        match &self.state.borrow().state {
            UploadState::Attached(asset) => Some(asset.clone()),
            _ => None,
        }
    }

    /// Seeds the controller from a loaded CV's photo. Supersedes anything in
    /// flight.
    pub fn restore(&self, photo: Option<AssetReference>) {
        let next = match photo {
            Some(asset) => UploadState::Attached(asset),
            None => UploadState::Empty,
        };
        self.begin(next);
    }

    /// Validates and uploads `file`, resolving to the remote reference that
    /// should become the CV's photo.
    ///
    /// A file rejected on its declared type or size changes nothing: whatever
    /// was attached or uploading stays so. Once accepted, the file becomes the
    /// current target and any previous asset or in-flight upload is discarded.
    pub async fn select(&self, file: SelectedFile) -> Result<AssetReference, UploadError> {
        if let Err(e) = validate_photo(file.content_type(), file.size()) {
            warn!(file = file.name(), "Photo rejected: {e}");
            return Err(e.into());
        }

        let generation = self.begin(UploadState::Validating);
        debug!(generation, file = file.name(), "Photo selected");

        let bytes = match file.read_all().await {
            Ok(bytes) => bytes,
            Err(e) => return Err(self.fail(generation, UploadError::Read(e))),
        };
        // The declared size may not match what was actually read.
        if let Err(e) = validate_photo(file.content_type(), bytes.len() as u64) {
            return Err(self.fail(generation, e.into()));
        }

        let local = AssetReference::from_bytes(bytes, file.content_type());
        let started = self.settle(
            generation,
            UploadState::Uploading {
                progress: 0,
                preview: local.clone(),
            },
        );
        if !started {
            return Err(UploadError::Superseded);
        }

        let on_progress = self.progress_callback(generation);
        match self.transfer.upload(local, on_progress).await {
            Ok(remote) => {
                if self.settle(generation, UploadState::Attached(remote.clone())) {
                    info!(generation, url = remote.direct_url(), "Photo attached");
                    Ok(remote)
                } else {
                    debug!(generation, "Discarding completed upload, superseded");
                    Err(UploadError::Superseded)
                }
            }
            Err(e) => {
                warn!(generation, "Photo upload failed: {e}");
                Err(self.fail(generation, UploadError::Transfer(e)))
            }
        }
    }

    /// Clears the photo. Does not delete anything remotely.
    pub fn remove(&self) {
        let generation = self.begin(UploadState::Empty);
        info!(generation, "Photo removed");
    }

    /// Starts a new generation in state `next`, superseding the previous one.
    fn begin(&self, next: UploadState) -> u64 {
        let mut generation = 0;
        self.state.send_modify(|snap| {
            snap.generation += 1;
            snap.state = next;
            generation = snap.generation;
        });
        generation
    }

    /// Moves to `next` only if `generation` is still current.
    fn settle(&self, generation: u64, next: UploadState) -> bool {
        self.state.send_if_modified(|snap| {
            if snap.generation != generation {
                return false;
            }
            snap.state = next;
            true
        })
    }

    fn fail(&self, generation: u64, err: UploadError) -> UploadError {
        if self.settle(generation, UploadState::Empty) {
            err
        } else {
            UploadError::Superseded
        }
    }

    fn progress_callback(&self, generation: u64) -> ProgressCallback {
        let state = Arc::clone(&self.state);
        Arc::new(move |pct: u8| {
            let pct = pct.min(100);
            state.send_if_modified(|snap| {
                if snap.generation != generation {
                    return false;
                }
                match &mut snap.state {
                    UploadState::Uploading { progress, .. } if pct > *progress => {
                        *progress = pct;
                        true
                    }
                    _ => false,
                }
            });
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    use crate::photo::validation::MAX_PHOTO_BYTES;
    use crate::testing::{ManualTransfer, MemoryTransfer};

    fn png(name: &str, len: usize) -> SelectedFile {
        SelectedFile::from_bytes(name, "image/png", Bytes::from(vec![7u8; len]))
    }

    fn progress_of(state: &UploadState) -> Option<u8> {
        match state {
            UploadState::Uploading { progress, .. } => Some(*progress),
            _ => None,
        }
    }

    #[tokio::test]
    async fn test_successful_upload_attaches_remote_reference() {
        let transfer = Arc::new(MemoryTransfer::default());
        let controller = UploadController::new(transfer.clone());

        let asset = controller.select(png("me.png", 10)).await.unwrap();
        assert!(!asset.is_local());
        assert_eq!(controller.state(), UploadState::Attached(asset.clone()));
        assert_eq!(controller.photo(), Some(asset));
        assert_eq!(transfer.upload_calls(), 1);
    }

    #[tokio::test]
    async fn test_rejected_type_leaves_state_untouched() {
        let transfer = Arc::new(MemoryTransfer::default());
        let controller = UploadController::new(transfer.clone());
        let attached = controller.select(png("me.png", 10)).await.unwrap();
        let generation = controller.generation();

        let pdf = SelectedFile::from_bytes("cv.pdf", "application/pdf", Bytes::from_static(b"%PDF"));
        let err = controller.select(pdf).await.unwrap_err();

        assert!(matches!(err, UploadError::Rejected(PhotoRejection::InvalidType(_))));
        assert_eq!(controller.state(), UploadState::Attached(attached));
        assert_eq!(controller.generation(), generation);
        assert_eq!(transfer.upload_calls(), 1);
    }

    #[tokio::test]
    async fn test_oversized_image_is_rejected_before_reading() {
        let transfer = Arc::new(MemoryTransfer::default());
        let controller = UploadController::new(transfer.clone());

        let err = controller
            .select(png("big.png", MAX_PHOTO_BYTES as usize + 1))
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Rejected(PhotoRejection::TooLarge { .. })));
        assert_eq!(controller.state(), UploadState::Empty);
        assert_eq!(transfer.upload_calls(), 0);
    }

    #[tokio::test]
    async fn test_image_at_exact_limit_uploads() {
        let transfer = Arc::new(MemoryTransfer::default());
        let controller = UploadController::new(transfer);
        assert!(controller
            .select(png("edge.png", MAX_PHOTO_BYTES as usize))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_transfer_failure_reverts_to_empty() {
        let transfer = Arc::new(MemoryTransfer::default());
        transfer.set_failing(true);
        let controller = UploadController::new(transfer);

        let err = controller.select(png("me.png", 10)).await.unwrap_err();
        assert!(matches!(err, UploadError::Transfer(_)));
        assert_eq!(controller.state(), UploadState::Empty);
        assert_eq!(controller.photo(), None);
    }

    #[tokio::test]
    async fn test_unreadable_file_reverts_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.png");
        std::fs::write(&path, b"png").unwrap();
        let file = SelectedFile::from_path(&path, None).await.unwrap();
        std::fs::remove_file(&path).unwrap();

        let controller = UploadController::new(Arc::new(MemoryTransfer::default()));
        let err = controller.select(file).await.unwrap_err();
        assert!(matches!(err, UploadError::Read(_)));
        assert_eq!(controller.state(), UploadState::Empty);
    }

    #[tokio::test]
    async fn test_file_grown_after_selection_is_rechecked_after_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grows.png");
        std::fs::write(&path, b"png").unwrap();
        let file = SelectedFile::from_path(&path, None).await.unwrap();
        assert_eq!(file.size(), 3);
        std::fs::write(&path, vec![0u8; MAX_PHOTO_BYTES as usize + 1]).unwrap();

        let transfer = Arc::new(MemoryTransfer::default());
        let controller = UploadController::new(transfer.clone());
        let err = controller.select(file).await.unwrap_err();

        assert!(matches!(
            err,
            UploadError::Rejected(PhotoRejection::TooLarge { size, .. }) if size == MAX_PHOTO_BYTES + 1
        ));
        assert_eq!(controller.state(), UploadState::Empty);
        assert_eq!(controller.generation(), 1);
        assert_eq!(transfer.upload_calls(), 0);
    }

    #[tokio::test]
    async fn test_progress_is_monotonic_and_clamped() {
        let transfer = Arc::new(ManualTransfer::default());
        let controller = Arc::new(UploadController::new(transfer.clone()));

        let task = {
            let c = Arc::clone(&controller);
            tokio::spawn(async move { c.select(png("me.png", 10)).await })
        };
        transfer.wait_for_uploads(1).await;
        assert_eq!(progress_of(&controller.state()), Some(0));

        let progress = transfer.progress(0);
        progress(40);
        assert_eq!(progress_of(&controller.state()), Some(40));
        progress(25);
        assert_eq!(progress_of(&controller.state()), Some(40));
        progress(250);
        assert_eq!(progress_of(&controller.state()), Some(100));

        let remote = AssetReference::from_url("https://cdn.test/me.png");
        transfer.complete(0, Ok(remote.clone()));
        assert_eq!(task.await.unwrap().unwrap(), remote);
        assert_eq!(controller.state(), UploadState::Attached(remote));
    }

    #[tokio::test]
    async fn test_stale_progress_does_not_touch_newer_upload() {
        let transfer = Arc::new(ManualTransfer::default());
        let controller = Arc::new(UploadController::new(transfer.clone()));

        let first = {
            let c = Arc::clone(&controller);
            tokio::spawn(async move { c.select(png("first.png", 10)).await })
        };
        transfer.wait_for_uploads(1).await;
        let second = {
            let c = Arc::clone(&controller);
            tokio::spawn(async move { c.select(png("second.png", 20)).await })
        };
        transfer.wait_for_uploads(2).await;

        transfer.progress(0)(90);
        assert_eq!(progress_of(&controller.state()), Some(0));

        transfer.progress(1)(30);
        assert_eq!(progress_of(&controller.state()), Some(30));

        transfer.complete(0, Ok(AssetReference::from_url("https://cdn.test/first.png")));
        assert!(matches!(first.await.unwrap(), Err(UploadError::Superseded)));
        assert_eq!(progress_of(&controller.state()), Some(30));

        let remote = AssetReference::from_url("https://cdn.test/second.png");
        transfer.complete(1, Ok(remote.clone()));
        assert_eq!(second.await.unwrap().unwrap(), remote);
        assert_eq!(controller.photo(), Some(remote));
    }

    #[tokio::test]
    async fn test_stale_failure_does_not_clear_newer_photo() {
        let transfer = Arc::new(ManualTransfer::default());
        let controller = Arc::new(UploadController::new(transfer.clone()));

        let first = {
            let c = Arc::clone(&controller);
            tokio::spawn(async move { c.select(png("first.png", 10)).await })
        };
        transfer.wait_for_uploads(1).await;
        controller.restore(Some(AssetReference::from_url("https://cdn.test/kept.png")));

        transfer.complete(0, Err(TransferError::Failed("boom".to_string())));
        assert!(matches!(first.await.unwrap(), Err(UploadError::Superseded)));
        assert_eq!(
            controller.photo(),
            Some(AssetReference::from_url("https://cdn.test/kept.png"))
        );
    }

    #[tokio::test]
    async fn test_remove_during_upload_discards_it() {
        let transfer = Arc::new(ManualTransfer::default());
        let controller = Arc::new(UploadController::new(transfer.clone()));

        let task = {
            let c = Arc::clone(&controller);
            tokio::spawn(async move { c.select(png("me.png", 10)).await })
        };
        transfer.wait_for_uploads(1).await;
        controller.remove();
        transfer.progress(0)(50);
        assert_eq!(controller.state(), UploadState::Empty);

        transfer.complete(0, Ok(AssetReference::from_url("https://cdn.test/me.png")));
        assert!(matches!(task.await.unwrap(), Err(UploadError::Superseded)));
        assert_eq!(controller.state(), UploadState::Empty);
    }

    #[tokio::test]
    async fn test_subscribers_see_each_transition() {
        let transfer = Arc::new(ManualTransfer::default());
        let controller = Arc::new(UploadController::new(transfer.clone()));
        let mut rx = controller.subscribe();

        let task = {
            let c = Arc::clone(&controller);
            tokio::spawn(async move { c.select(png("me.png", 10)).await })
        };
        transfer.wait_for_uploads(1).await;
        assert!(rx.has_changed().unwrap());
        let snap = rx.borrow_and_update().clone();
        assert_eq!(snap.generation, 1);
        assert!(matches!(snap.state, UploadState::Uploading { .. }));

        transfer.progress(0)(60);
        assert!(rx.has_changed().unwrap());
        assert_eq!(progress_of(&rx.borrow_and_update().state), Some(60));

        transfer.complete(0, Ok(AssetReference::from_url("https://cdn.test/me.png")));
        task.await.unwrap().unwrap();
        assert!(matches!(rx.borrow().state, UploadState::Attached(_)));
    }

    #[tokio::test]
    async fn test_uploading_preview_is_local_data_url() {
        let transfer = Arc::new(ManualTransfer::default());
        let controller = Arc::new(UploadController::new(transfer.clone()));

        let task = {
            let c = Arc::clone(&controller);
            tokio::spawn(async move { c.select(png("me.png", 3)).await })
        };
        transfer.wait_for_uploads(1).await;
        match controller.state() {
            UploadState::Uploading { preview, .. } => {
                assert!(preview.is_local());
                assert_eq!(preview.cached_bytes().map(|b| b.len()), Some(3));
            }
            other => panic!("unexpected state {other:?}"),
        }
        transfer.complete(0, Ok(AssetReference::from_url("https://cdn.test/me.png")));
        task.await.unwrap().unwrap();
    }
}
