// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /v1/detect-image
//!
//! Runs against a stub detector so no model file is needed.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use image::ImageFormat;
use serde_json::json;
use vision_endpoints::{
    api::{MAX_BASE64_LEN, MAX_BODY_SIZE},
    registry::EndpointRegistry,
    vision::{Task, VisionModelManager},
};

use super::support::*;

async fn detect(app: axum::Router, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    send(app, json_request(Method::POST, "/v1/detect-image", body)).await
}

#[tokio::test]
async fn test_detect_returns_predictions() {
    let (status, body) = detect(default_app(), json!({ "image_base64": fixture_png(64, 48) })).await;

    assert_eq!(status, StatusCode::OK);
    let predictions = body["predictions"].as_array().unwrap();
    assert_eq!(predictions.len(), 2);

    // Model order is preserved
    assert_eq!(predictions[0]["label"], "dog");
    assert_eq!(predictions[1]["label"], "person");

    for prediction in predictions {
        let confidence = prediction["confidence"].as_array().unwrap();
        assert_eq!(confidence.len(), 1);
        let c = confidence[0].as_f64().unwrap();
        assert!((0.0..=1.0).contains(&c));

        let bbox: Vec<f64> = prediction["bbox"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_f64().unwrap())
            .collect();
        assert_eq!(bbox.len(), 4);
        assert!(bbox[0] < bbox[2] && bbox[1] < bbox[3]);
        assert!(bbox[2] <= 64.0 && bbox[3] <= 48.0);
    }
}

#[tokio::test]
async fn test_detect_accepts_other_formats_and_data_urls() {
    let jpeg = fixture_image(40, 40, ImageFormat::Jpeg);
    let (status, _) = detect(default_app(), json!({ "image_base64": jpeg })).await;
    assert_eq!(status, StatusCode::OK);

    let data_url = format!("data:image/png;base64,{}", fixture_png(20, 10));
    let (status, body) = detect(default_app(), json!({ "image_base64": data_url })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["predictions"][0]["bbox"], json!([5.0, 2.5, 15.0, 7.5]));
}

#[tokio::test]
async fn test_image_above_two_megabytes_is_accepted() {
    let image = fixture_noise_png(1024, 1024);
    assert!(image.len() > 2 * 1024 * 1024 && image.len() < MAX_BASE64_LEN);

    let (status, body) = detect(default_app(), json!({ "image_base64": image })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["predictions"][0]["bbox"], json!([256.0, 256.0, 768.0, 768.0]));
}

#[tokio::test]
async fn test_image_above_size_cap_is_validation_error() {
    let image = "A".repeat(MAX_BASE64_LEN + 1);
    let body = json!({ "image_base64": image });
    assert!(body.to_string().len() < MAX_BODY_SIZE);

    let (status, body) = detect(default_app(), body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "validation_error");
    assert!(body["message"].as_str().unwrap().contains("maximum size"));
}

#[tokio::test]
async fn test_malformed_base64_is_bad_request() {
    let (status, body) = detect(default_app(), json!({ "image_base64": "not base64!!" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "decode_error");
}

#[tokio::test]
async fn test_non_image_payload_is_bad_request() {
    // "hello world" is valid base64 of bytes that are not an image
    let (status, body) = detect(default_app(), json!({ "image_base64": "aGVsbG8gd29ybGQ=" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "decode_error");
}

#[tokio::test]
async fn test_missing_image_is_validation_error() {
    let (status, body) = detect(default_app(), json!({})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "validation_error");
    assert_eq!(body["details"]["field"], "image_base64");
}

#[tokio::test]
async fn test_non_json_body_is_bad_request() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/v1/detect-image")
        .header("content-type", "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let (status, body) = send(default_app(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "invalid_request");
}

#[tokio::test]
async fn test_detector_not_loaded() {
    let app = app_with(VisionModelManager::empty(), EndpointRegistry::default());
    let (status, body) = detect(app, json!({ "image_base64": fixture_png(8, 8) })).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error_type"], "service_unavailable");
}

#[tokio::test]
async fn test_inference_failure_is_server_error() {
    let models =
        VisionModelManager::empty().with_detector(Arc::new(FailingModel::new(Task::Detect)));
    let app = app_with(models, EndpointRegistry::default());
    let (status, body) = detect(app, json!({ "image_base64": fixture_png(8, 8) })).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error_type"], "inference_error");
}
