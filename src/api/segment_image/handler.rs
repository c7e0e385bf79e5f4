// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Segmentation endpoint handler

use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use tracing::{debug, info};

use super::response::SegmentImageResponse;
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::api::request::ImageRequest;
use crate::vision::{decode_base64_image, encode_base64, encode_webp, plot_segmentation, InferenceError};

/// Segment a base64-encoded image and return it annotated
///
/// Each object is filled with a translucent per-class colour and outlined.
/// The result keeps the input's dimensions and is returned as base64 WebP.
///
/// # Errors
/// - 400: missing field, bad base64, undecodable image
/// - 503: segmentation model not loaded
/// - 500: inference or encoding failed
pub async fn segment_image_handler(
    State(state): State<AppState>,
    payload: Result<Json<ImageRequest>, JsonRejection>,
) -> Result<Json<SegmentImageResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
    let image_base64 = request.image()?.to_string();

    let segmenter = state.models.segmenter().ok_or_else(|| {
        ApiError::ServiceUnavailable("Segmentation model not loaded".to_string())
    })?;

    let start = Instant::now();
    let (object_count, webp) = tokio::task::spawn_blocking(move || {
        let (image, info) = decode_base64_image(&image_base64)?;
        debug!(
            "Decoded image: {}x{} {:?}, {} bytes",
            info.width, info.height, info.format, info.size_bytes
        );

        let objects = segmenter.segment(&image)?;
        let annotated = plot_segmentation(&image, &objects);
        let webp = encode_webp(&annotated)
            .map_err(|e| ApiError::from(InferenceError::Encode(e.to_string())))?;
        Ok::<_, ApiError>((objects.len(), webp))
    })
    .await
    .map_err(|e| ApiError::from(InferenceError::TaskFailed(e.to_string())))??;

    info!(
        "Segmentation complete: {} objects, {} byte WebP in {}ms",
        object_count,
        webp.len(),
        start.elapsed().as_millis()
    );

    Ok(Json(SegmentImageResponse::new(
        object_count,
        encode_base64(&webp),
    )))
}
