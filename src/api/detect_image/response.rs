// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection response types

use serde::{Deserialize, Serialize};

use crate::vision::Detection;

/// One detected object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prediction {
    /// [x1, y1, x2, y2] in original-image pixels
    pub bbox: [f32; 4],
    /// Single-element score list (0.0-1.0)
    pub confidence: Vec<f32>,
    pub label: String,
}

impl From<Detection> for Prediction {
    fn from(detection: Detection) -> Self {
        Self {
            bbox: detection.bbox,
            confidence: vec![detection.confidence],
            label: detection.label,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectImageResponse {
    pub predictions: Vec<Prediction>,
}

impl DetectImageResponse {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self {
            predictions: detections.into_iter().map(Prediction::from).collect(),
        }
    }
}
