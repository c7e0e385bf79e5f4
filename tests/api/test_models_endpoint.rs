// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! GET /models

use axum::http::{Method, StatusCode};
use vision_endpoints::{registry::EndpointRegistry, vision::VisionModelManager};

use super::support::*;

#[tokio::test]
async fn test_lists_detection_then_segmentation() {
    let (status, body) = send(default_app(), empty_request(Method::GET, "/models")).await;

    assert_eq!(status, StatusCode::OK);
    let models = body["models"].as_array().unwrap();
    assert_eq!(models.len(), 2);

    assert_eq!(models[0]["name"], "yolo26n");
    assert_eq!(models[0]["task"], "detect");
    assert_eq!(models[1]["name"], "yolo26n-seg");
    assert_eq!(models[1]["task"], "segment");

    for model in models {
        for field in ["name", "checkpoint", "date", "task", "loaded_at"] {
            assert!(model.get(field).is_some(), "missing {}", field);
        }
    }
}

#[tokio::test]
async fn test_repeated_calls_are_identical() {
    let models = stub_models();
    let app = || app_with(models.clone(), EndpointRegistry::default());

    let (_, first) = send(app(), empty_request(Method::GET, "/models")).await;
    let (_, second) = send(app(), empty_request(Method::GET, "/models")).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_no_models_loaded() {
    let app = app_with(VisionModelManager::empty(), EndpointRegistry::default());
    let (status, body) = send(app, empty_request(Method::GET, "/models")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["models"], serde_json::json!([]));
}
