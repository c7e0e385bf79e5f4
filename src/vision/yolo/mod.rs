// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! YOLO object detection and instance segmentation on ONNX Runtime
//!
//! Components:
//! - `preprocessing` - Letterbox resize into the model's NCHW input tensor
//! - `postprocessing` - Output tensor decoding (end-to-end and anchor layouts) and NMS
//! - `masks` - Instance masks from prototype tensors
//! - `class_names` - Class name dictionary from ONNX metadata
//! - `model` - ONNX session wrapper implementing the detector/segmenter traits

pub mod class_names;
pub mod masks;
pub mod model;
pub mod postprocessing;
pub mod preprocessing;

use image::GrayImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use model::YoloOnnxModel;
pub use preprocessing::Letterbox;

/// Default square input size of exported YOLO models
pub const DEFAULT_INPUT_SIZE: u32 = 640;

/// Errors raised while running a model
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("ONNX Runtime error: {0}")]
    Runtime(String),

    #[error("Unexpected model output: {0}")]
    UnexpectedOutput(String),

    #[error("Model session lock poisoned")]
    SessionPoisoned,

    #[error("Failed to encode output image: {0}")]
    Encode(String),

    #[error("Inference task failed: {0}")]
    TaskFailed(String),
}

impl From<ort::Error> for InferenceError {
    fn from(e: ort::Error) -> Self {
        InferenceError::Runtime(e.to_string())
    }
}

impl From<ndarray::ShapeError> for InferenceError {
    fn from(e: ndarray::ShapeError) -> Self {
        InferenceError::UnexpectedOutput(e.to_string())
    }
}

/// Post-processing thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct YoloParams {
    /// Minimum class score for a box to be kept (0..1)
    pub conf_threshold: f32,
    /// Overlap above which same-class boxes are suppressed (0..1)
    pub iou_threshold: f32,
    pub max_detections: usize,
}

impl Default for YoloParams {
    fn default() -> Self {
        Self {
            conf_threshold: 0.25,
            iou_threshold: 0.45,
            max_detections: 300,
        }
    }
}

impl YoloParams {
    pub fn clamped(self) -> Self {
        Self {
            conf_threshold: self.conf_threshold.clamp(0.0, 1.0),
            iou_threshold: self.iou_threshold.clamp(0.0, 1.0),
            max_detections: self.max_detections.max(1),
        }
    }
}

/// A detected object in original-image pixel coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// x1, y1, x2, y2
    pub bbox: [f32; 4],
    /// Class score (0.0-1.0)
    pub confidence: f32,
    pub class_id: usize,
    pub label: String,
}

/// A detection plus its binary mask (same size as the input image, 0 or 255)
#[derive(Debug, Clone)]
pub struct SegmentedObject {
    pub detection: Detection,
    pub mask: GrayImage,
}
