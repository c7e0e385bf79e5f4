// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision processing: image transport, YOLO inference and result rendering
//!
//! This module provides:
//! - Object detection via a YOLO ONNX model
//! - Instance segmentation via a YOLO-seg ONNX model
//!
//! Both run on CPU through ONNX Runtime.

pub mod image_utils;
pub mod model_manager;
pub mod render;
pub mod yolo;

pub use image_utils::{decode_base64_image, encode_base64, encode_webp, DecodeError, ImageInfo};
pub use model_manager::{
    ImageSegmenter, ModelMetadata, ObjectDetector, Task, VisionModelConfig, VisionModelManager,
};
pub use render::plot_segmentation;
pub use yolo::{Detection, InferenceError, SegmentedObject, YoloParams};
