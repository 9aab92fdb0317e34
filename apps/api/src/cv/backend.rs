//! The persistence endpoint the editor talks to.
//!
//! The session only ever sees this trait, so the transport (HTTP in
//! [`crate::client::HttpBackend`], an in-memory fake in tests) can be swapped
//! without touching the session.

use async_trait::async_trait;
use thiserror::Error;

use crate::cv::models::{CvRecord, UserProfile};

#[derive(Debug, Error)]
pub enum BackendError {
    /// The endpoint could not be reached. Finer causes are not distinguished.
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Backend rejected the request (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Malformed backend response: {0}")]
    Decode(String),
}

#[async_trait]
pub trait CvBackend: Send + Sync {
    /// `None` when the caller has never saved a CV.
    async fn load_cv(&self) -> Result<Option<CvRecord>, BackendError>;

    async fn save_cv(&self, record: &CvRecord) -> Result<(), BackendError>;

    /// Removes the stored record entirely.
    async fn clear_cv(&self) -> Result<(), BackendError>;

    async fn load_profile(&self) -> Result<Option<UserProfile>, BackendError>;

    async fn save_profile(&self, profile: &UserProfile) -> Result<(), BackendError>;
}
