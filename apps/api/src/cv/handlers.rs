//! Axum route handlers for CV records and user profiles.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::cv::models::{CvRecord, UserProfile};
use crate::cv::validation::{normalize_profile_name, validate_record};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

/// GET /api/v1/cv
/// `null` when the user has never saved a CV.
pub async fn handle_get_cv(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Option<CvRecord>>, AppError> {
    Ok(Json(state.cv_store.get_cv(params.user_id).await?))
}

/// PUT /api/v1/cv
pub async fn handle_put_cv(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
    Json(record): Json<CvRecord>,
) -> Result<StatusCode, AppError> {
    validate_record(&record)?;
    state.cv_store.put_cv(params.user_id, &record).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/cv
pub async fn handle_delete_cv(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    state.cv_store.delete_cv(params.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/profile
pub async fn handle_get_profile(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Option<UserProfile>>, AppError> {
    Ok(Json(state.cv_store.get_profile(params.user_id).await?))
}

/// PUT /api/v1/profile
pub async fn handle_put_profile(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
    Json(profile): Json<UserProfile>,
) -> Result<StatusCode, AppError> {
    let profile = UserProfile {
        name: normalize_profile_name(&profile.name)?,
    };
    state.cv_store.put_profile(params.user_id, &profile).await?;
    Ok(StatusCode::NO_CONTENT)
}
