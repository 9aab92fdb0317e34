//! Axum route handlers for photo uploads.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::photo::validation::validate_photo;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadedAsset {
    pub id: Uuid,
    /// Path under this service the photo can be displayed from.
    pub url: String,
    pub content_type: String,
}

/// Any `image/*` is accepted, SVG included. Served assets get no script
/// execution and no subresources on this origin.
const ASSET_CSP: &str = "default-src 'none'; style-src 'unsafe-inline'; sandbox";

pub fn asset_path(id: Uuid) -> String {
    format!("/api/v1/assets/{id}")
}

/// POST /api/v1/assets
/// Raw image body, type taken from the `Content-Type` header.
pub async fn handle_upload_asset(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<UploadedAsset>), AppError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .trim()
        .to_string();
    validate_photo(&content_type, body.len() as u64)?;

    let id = Uuid::new_v4();
    let len = body.len();
    state.assets.put(id, &content_type, body).await?;
    info!("Stored photo {id} ({len} bytes, {content_type})");

    Ok((
        StatusCode::CREATED,
        Json(UploadedAsset {
            id,
            url: asset_path(id),
            content_type,
        }),
    ))
}

/// GET /api/v1/assets/:id
/// Stored bytes under their stored content type, never sniffed.
pub async fn handle_get_asset(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let asset = state
        .assets
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Asset {id} not found")))?;

    Ok((
        [
            (header::CONTENT_TYPE, asset.content_type),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff".to_string()),
            (header::CONTENT_SECURITY_POLICY, ASSET_CSP.to_string()),
        ],
        asset.bytes,
    )
        .into_response())
}
