// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /v1/segment-image

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{GenericImageView, ImageFormat};
use serde_json::json;
use vision_endpoints::{
    registry::EndpointRegistry,
    vision::{Task, VisionModelManager},
};

use super::support::*;

async fn segment(app: axum::Router, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    send(app, json_request(Method::POST, "/v1/segment-image", body)).await
}

#[tokio::test]
async fn test_segmented_image_keeps_dimensions() {
    for (width, height) in [(64, 48), (17, 93)] {
        let (status, body) =
            segment(default_app(), json!({ "image_base64": fixture_png(width, height) })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Segmented 1 object");

        let bytes = STANDARD
            .decode(body["segmented_image"].as_str().unwrap())
            .unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::WebP);

        let output = image::load_from_memory(&bytes).unwrap();
        assert_eq!(output.dimensions(), (width, height));
    }
}

#[tokio::test]
async fn test_mask_is_drawn_over_object() {
    let input = fixture_png(40, 40);
    let (_, body) = segment(default_app(), json!({ "image_base64": input.clone() })).await;

    let original = image::load_from_memory(&STANDARD.decode(&input).unwrap())
        .unwrap()
        .to_rgb8();
    let output = image::load_from_memory(&STANDARD.decode(body["segmented_image"].as_str().unwrap()).unwrap())
        .unwrap()
        .to_rgb8();

    // Inside the mask the pixel is blended, the corner is untouched
    assert_ne!(output.get_pixel(20, 20), original.get_pixel(20, 20));
    assert_eq!(output.get_pixel(0, 0), original.get_pixel(0, 0));
}

#[tokio::test]
async fn test_malformed_base64_is_bad_request() {
    let (status, body) = segment(default_app(), json!({ "image_base64": "%%%%" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "decode_error");
}

#[tokio::test]
async fn test_segmenter_not_loaded() {
    let app = app_with(VisionModelManager::empty(), EndpointRegistry::default());
    let (status, _) = segment(app, json!({ "image_base64": fixture_png(8, 8) })).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_inference_failure_is_server_error() {
    let models =
        VisionModelManager::empty().with_segmenter(Arc::new(FailingModel::new(Task::Segment)));
    let app = app_with(models, EndpointRegistry::default());
    let (status, body) = segment(app, json!({ "image_base64": fixture_png(8, 8) })).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error_type"], "inference_error");
}
