pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::cv::handlers as cv;
use crate::photo::handlers as photo;
use crate::photo::validation::MAX_PHOTO_BYTES;
use crate::state::AppState;

/// Request body cap for uploads. Slightly above the photo limit so that a
/// modestly oversized image gets a validation error instead of a bare 413.
const ASSET_BODY_LIMIT: usize = MAX_PHOTO_BYTES as usize + 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/cv",
            get(cv::handle_get_cv)
                .put(cv::handle_put_cv)
                .delete(cv::handle_delete_cv),
        )
        .route(
            "/api/v1/profile",
            get(cv::handle_get_profile).put(cv::handle_put_profile),
        )
        .route(
            "/api/v1/assets",
            post(photo::handle_upload_asset).layer(DefaultBodyLimit::max(ASSET_BODY_LIMIT)),
        )
        .route("/api/v1/assets/:id", get(photo::handle_get_asset))
        .with_state(state)
}
