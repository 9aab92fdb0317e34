use std::sync::Arc;

use crate::cv::store::CvStore;
use crate::photo::store::AssetStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// CV records and user profiles. Postgres in production.
    pub cv_store: Arc<dyn CvStore>,
    /// Photo bytes. S3 / MinIO in production.
    pub assets: Arc<dyn AssetStore>,
}
