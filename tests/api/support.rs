// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Shared fixtures for the HTTP tests: stub models and generated images

use std::io::Cursor;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgb, RgbImage};
use tower::util::ServiceExt;
use vision_endpoints::{
    api::{create_app, AppState},
    registry::EndpointRegistry,
    vision::{
        encode_base64, Detection, ImageSegmenter, InferenceError, ModelMetadata, ObjectDetector,
        SegmentedObject, Task, VisionModelManager,
    },
};

fn metadata(name: &str, task: Task) -> ModelMetadata {
    ModelMetadata {
        name: name.to_string(),
        checkpoint: format!("./data/models/{}.onnx", name),
        date: "2025-11-20T00:00:00".to_string(),
        task,
        loaded_at: Utc::now(),
    }
}

/// Box covering the centre quarter of the image
fn centre_box(image: &DynamicImage) -> [f32; 4] {
    let (w, h) = (image.width() as f32, image.height() as f32);
    [w * 0.25, h * 0.25, w * 0.75, h * 0.75]
}

/// Reports one "dog" and one "person" in the centre of any image
pub struct StubDetector {
    metadata: ModelMetadata,
}

impl StubDetector {
    pub fn new() -> Self {
        Self {
            metadata: metadata("yolo26n", Task::Detect),
        }
    }
}

impl ObjectDetector for StubDetector {
    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    fn detect(&self, image: &DynamicImage) -> Result<Vec<Detection>, InferenceError> {
        let bbox = centre_box(image);
        Ok(vec![
            Detection {
                bbox,
                confidence: 0.91,
                class_id: 16,
                label: "dog".to_string(),
            },
            Detection {
                bbox,
                confidence: 0.42,
                class_id: 0,
                label: "person".to_string(),
            },
        ])
    }
}

/// Segments the centre of any image as a single "cat"
pub struct StubSegmenter {
    metadata: ModelMetadata,
}

impl StubSegmenter {
    pub fn new() -> Self {
        Self {
            metadata: metadata("yolo26n-seg", Task::Segment),
        }
    }
}

impl ImageSegmenter for StubSegmenter {
    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    fn segment(&self, image: &DynamicImage) -> Result<Vec<SegmentedObject>, InferenceError> {
        let bbox = centre_box(image);
        let mask = GrayImage::from_fn(image.width(), image.height(), |x, y| {
            let (x, y) = (x as f32, y as f32);
            if x >= bbox[0] && x < bbox[2] && y >= bbox[1] && y < bbox[3] {
                Luma([255])
            } else {
                Luma([0])
            }
        });
        Ok(vec![SegmentedObject {
            detection: Detection {
                bbox,
                confidence: 0.88,
                class_id: 15,
                label: "cat".to_string(),
            },
            mask,
        }])
    }
}

/// A model whose session always fails
pub struct FailingModel {
    metadata: ModelMetadata,
}

impl FailingModel {
    pub fn new(task: Task) -> Self {
        Self {
            metadata: metadata("broken", task),
        }
    }
}

impl ObjectDetector for FailingModel {
    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    fn detect(&self, _image: &DynamicImage) -> Result<Vec<Detection>, InferenceError> {
        Err(InferenceError::UnexpectedOutput("output tensor has rank 2".to_string()))
    }
}

impl ImageSegmenter for FailingModel {
    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    fn segment(&self, _image: &DynamicImage) -> Result<Vec<SegmentedObject>, InferenceError> {
        Err(InferenceError::UnexpectedOutput("missing prototype output".to_string()))
    }
}

pub fn stub_models() -> VisionModelManager {
    VisionModelManager::empty()
        .with_detector(Arc::new(StubDetector::new()))
        .with_segmenter(Arc::new(StubSegmenter::new()))
}

pub fn app_with(models: VisionModelManager, registry: EndpointRegistry) -> Router {
    create_app(AppState::new(models, registry))
}

pub fn default_app() -> Router {
    app_with(stub_models(), EndpointRegistry::default())
}

/// Gradient image encoded in `format`, as base64
pub fn fixture_image(width: u32, height: u32, format: ImageFormat) -> String {
    let image = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 255 / width) as u8, (y * 255 / height) as u8, 128])
    });
    let mut bytes = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut bytes, format)
        .unwrap();
    encode_base64(bytes.get_ref())
}

/// Pseudo-random pixels, so the PNG barely compresses
pub fn fixture_noise_png(width: u32, height: u32) -> String {
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    let image = RgbImage::from_fn(width, height, |_, _| {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        let [r, g, b, ..] = state.to_le_bytes();
        Rgb([r, g, b])
    });
    let mut bytes = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut bytes, ImageFormat::Png)
        .unwrap();
    encode_base64(bytes.get_ref())
}

pub fn fixture_png(width: u32, height: u32) -> String {
    fixture_image(width, height, ImageFormat::Png)
}

pub fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Send one request, returning status and parsed JSON body (Null when empty)
pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, body)
}
