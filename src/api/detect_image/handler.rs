// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection endpoint handler

use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use tracing::{debug, info};

use super::response::DetectImageResponse;
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::api::request::ImageRequest;
use crate::vision::{decode_base64_image, InferenceError};

/// Detect objects in a base64-encoded image
///
/// # Request
/// - `image_base64`: PNG, JPEG, WebP, GIF, BMP or TIFF, optionally as a data URL
///
/// # Response
/// - `predictions`: `{ bbox, confidence, label }` in model order
///
/// # Errors
/// - 400: missing field, bad base64, undecodable image
/// - 503: detection model not loaded
/// - 500: inference failed
pub async fn detect_image_handler(
    State(state): State<AppState>,
    payload: Result<Json<ImageRequest>, JsonRejection>,
) -> Result<Json<DetectImageResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
    let image_base64 = request.image()?.to_string();

    let detector = state
        .models
        .detector()
        .ok_or_else(|| ApiError::ServiceUnavailable("Detection model not loaded".to_string()))?;

    let start = Instant::now();
    let detections = tokio::task::spawn_blocking(move || {
        let (image, info) = decode_base64_image(&image_base64)?;
        debug!(
            "Decoded image: {}x{} {:?}, {} bytes",
            info.width, info.height, info.format, info.size_bytes
        );
        detector.detect(&image).map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::from(InferenceError::TaskFailed(e.to_string())))??;

    info!(
        "Detection complete: {} objects in {}ms",
        detections.len(),
        start.elapsed().as_millis()
    );

    Ok(Json(DetectImageResponse::new(detections)))
}
