//! Editor session: owns the editable model for one editing session and
//! orchestrates load and save against a [`CvBackend`].

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::cv::backend::{BackendError, CvBackend};
use crate::cv::codec::{decode, encode};
use crate::cv::models::{CvRecord, EditableCv, UserProfile};
use crate::cv::validation::{normalize_profile_name, validate_for_save, ValidationError};
use crate::photo::asset::AssetReference;
use crate::photo::controller::{UploadController, UploadSnapshot, UploadState};

#[derive(Debug, Error)]
pub enum SaveError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Failed to save. Please try again.")]
    Transfer(#[source] BackendError),
}

/// Whether a loaded record may still replace the editable model.
///
/// The latch closes on the first applied load, on the first edit and on the
/// first save attempt, and never reopens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadLatch {
    Open,
    Loaded,
    Edited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The record replaced the default model.
    Applied,
    /// No record is stored yet; the model keeps its defaults and the latch
    /// stays open.
    NothingSaved,
    /// The latch was already closed; the record was discarded.
    Ignored,
}

/// Upload controller whose settled state drives `EditableCv::photo`.
struct PhotoBinding {
    controller: Arc<UploadController>,
    updates: watch::Receiver<UploadSnapshot>,
}

pub struct EditorSession {
    backend: Arc<dyn CvBackend>,
    cv: EditableCv,
    latch: LoadLatch,
    photo: Option<PhotoBinding>,
}

impl EditorSession {
    pub fn new(backend: Arc<dyn CvBackend>) -> Self {
        Self {
            backend,
            cv: EditableCv::default(),
            latch: LoadLatch::Open,
            photo: None,
        }
    }

    /// A session whose photo field follows `uploads`: an attached upload sets
    /// it, a removal or failed upload clears it. A loaded record's photo is
    /// pushed back into the controller.
    pub fn with_uploads(backend: Arc<dyn CvBackend>, uploads: Arc<UploadController>) -> Self {
        let updates = uploads.subscribe();
        Self {
            photo: Some(PhotoBinding {
                controller: uploads,
                updates,
            }),
            ..Self::new(backend)
        }
    }

    pub fn cv(&self) -> &EditableCv {
        &self.cv
    }

    pub fn latch(&self) -> LoadLatch {
        self.latch
    }

    /// Mutable access for user edits. Closes the load latch, so a load that
    /// completes afterwards is ignored.
    pub fn edit(&mut self) -> &mut EditableCv {
        self.close_latch();
        &mut self.cv
    }

    /// Attaches (or with `None`, removes) the photo. Counts as an edit.
    pub fn set_photo(&mut self, photo: Option<AssetReference>) {
        self.edit().photo = photo;
    }

    /// Pulls the bound controller's state into the photo field.
    ///
    /// Any controller change since the last sync counts as an edit. `Attached`
    /// sets the field and `Empty` clears it; an upload still in flight leaves
    /// it as it was. Returns whether the field changed. `save` and
    /// `apply_loaded` sync first, so callers only need this to refresh
    /// [`EditorSession::cv`] in between.
    pub fn sync_photo(&mut self) -> bool {
        let Some(binding) = self.photo.as_mut() else {
            return false;
        };
        if !binding.updates.has_changed().unwrap_or(false) {
            return false;
        }
        let settled = match &binding.updates.borrow_and_update().state {
            UploadState::Attached(asset) => Some(Some(asset.clone())),
            UploadState::Empty => Some(None),
            UploadState::Validating | UploadState::Uploading { .. } => None,
        };
        self.close_latch();
        match settled {
            Some(photo) if self.cv.photo != photo => {
                debug!(attached = photo.is_some(), "Photo field synced from upload");
                self.cv.photo = photo;
                true
            }
            _ => false,
        }
    }

    /// Applies a load result that arrived from the backend.
    pub fn apply_loaded(&mut self, record: Option<&CvRecord>) -> LoadOutcome {
        self.sync_photo();
        let Some(record) = record else {
            debug!("No stored CV; keeping defaults");
            return LoadOutcome::NothingSaved;
        };
        if self.latch != LoadLatch::Open {
            info!(latch = ?self.latch, "Ignoring late CV load");
            return LoadOutcome::Ignored;
        }
        self.cv = decode(record);
        self.latch = LoadLatch::Loaded;
        if let Some(binding) = self.photo.as_mut() {
            binding.controller.restore(self.cv.photo.clone());
            // The restore is ours, not a user edit.
            binding.updates.borrow_and_update();
        }
        info!(
            work = self.cv.work_experience.len(),
            education = self.cv.education.len(),
            "Loaded stored CV"
        );
        LoadOutcome::Applied
    }

    /// Fetches the stored record and applies it under the load-once latch.
    pub async fn load(&mut self) -> Result<LoadOutcome, BackendError> {
        let record = self.backend.load_cv().await?;
        Ok(self.apply_loaded(record.as_ref()))
    }

    /// Validates, encodes and stores the current model.
    ///
    /// On success the in-memory model stays the source of truth and the
    /// encoded record is returned. On failure the model is untouched; the
    /// caller may retry. `summary`, `projects` and `certifications` are not
    /// part of what is stored.
    pub async fn save(&mut self) -> Result<CvRecord, SaveError> {
        self.sync_photo();
        self.close_latch();

        if let Err(e) = validate_for_save(&self.cv) {
            warn!("CV save rejected: {e}");
            return Err(e.into());
        }

        let record = encode(&self.cv);
        match self.backend.save_cv(&record).await {
            Ok(()) => {
                info!("CV saved");
                Ok(record)
            }
            Err(e) => {
                warn!("CV save failed: {e}");
                Err(SaveError::Transfer(e))
            }
        }
    }

    /// Deletes the stored record. The editable model is left as it is.
    pub async fn clear(&self) -> Result<(), BackendError> {
        self.backend.clear_cv().await?;
        info!("Stored CV cleared");
        Ok(())
    }

    pub async fn load_profile(&self) -> Result<Option<UserProfile>, BackendError> {
        self.backend.load_profile().await
    }

    /// Stores the caller's profile under a trimmed, non-blank name.
    pub async fn save_profile(&self, name: &str) -> Result<UserProfile, SaveError> {
        let profile = UserProfile {
            name: normalize_profile_name(name)?,
        };
        self.backend
            .save_profile(&profile)
            .await
            .map_err(SaveError::Transfer)?;
        Ok(profile)
    }

    fn close_latch(&mut self) {
        if self.latch == LoadLatch::Open {
            self.latch = LoadLatch::Edited;
        }
    }
}
