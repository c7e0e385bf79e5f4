// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Decoding of YOLO prediction tensors
//!
//! Two export layouts are in circulation:
//! - end-to-end `[1, N, 6 + nm]`: one row per detection, `x1, y1, x2, y2, score, class`
//!   followed by `nm` mask coefficients. Already deduplicated by the model.
//! - anchors `[1, 4 + nc + nm, A]`: one column per anchor, `cx, cy, w, h`, then
//!   `nc` class scores and `nm` mask coefficients. Needs NMS.
//!
//! Boxes stay in model-input space here; callers map them through the letterbox.

use std::cmp::Ordering;

use ndarray::ArrayView3;

use super::{InferenceError, YoloParams};

/// Prediction tensor layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLayout {
    EndToEnd,
    Anchors { num_classes: usize },
}

/// A candidate box in model-input coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct RawBox {
    pub bbox: [f32; 4],
    pub score: f32,
    pub class_id: usize,
    pub coeffs: Vec<f32>,
}

/// Identify the layout of a `[1, a, b]` prediction tensor carrying `num_coeffs`
/// mask coefficients per box
pub fn detect_layout(shape: &[usize], num_coeffs: usize) -> Result<OutputLayout, InferenceError> {
    if shape.len() != 3 || shape[0] != 1 {
        return Err(InferenceError::UnexpectedOutput(format!(
            "prediction shape {:?}, expected [1, a, b]",
            shape
        )));
    }

    if shape[2] == 6 + num_coeffs {
        return Ok(OutputLayout::EndToEnd);
    }

    let channels = shape[1];
    if channels <= 4 + num_coeffs {
        return Err(InferenceError::UnexpectedOutput(format!(
            "prediction shape {:?} has no class channels",
            shape
        )));
    }

    Ok(OutputLayout::Anchors {
        num_classes: channels - 4 - num_coeffs,
    })
}

/// Decode predictions into boxes, applying thresholds (and NMS for anchor layouts)
pub fn decode_predictions(
    output: ArrayView3<f32>,
    num_coeffs: usize,
    params: &YoloParams,
) -> Result<Vec<RawBox>, InferenceError> {
    match detect_layout(output.shape(), num_coeffs)? {
        OutputLayout::EndToEnd => Ok(decode_end_to_end(output, num_coeffs, params)),
        OutputLayout::Anchors { num_classes } => {
            let candidates = decode_anchors(output, num_classes, num_coeffs, params);
            Ok(non_max_suppression(
                candidates,
                params.iou_threshold,
                params.max_detections,
            ))
        }
    }
}

fn decode_end_to_end(output: ArrayView3<f32>, num_coeffs: usize, params: &YoloParams) -> Vec<RawBox> {
    let mut boxes = Vec::new();

    for row in output.index_axis(ndarray::Axis(0), 0).rows() {
        let score = row[4];
        if !(score >= params.conf_threshold) {
            continue;
        }

        let [x1, y1, x2, y2] = [row[0], row[1], row[2], row[3]];
        if x2 <= x1 || y2 <= y1 {
            continue;
        }

        boxes.push(RawBox {
            bbox: [x1, y1, x2, y2],
            score: score.min(1.0),
            class_id: row[5].max(0.0).round() as usize,
            coeffs: (6..6 + num_coeffs).map(|i| row[i]).collect(),
        });

        if boxes.len() >= params.max_detections {
            break;
        }
    }

    boxes
}

fn decode_anchors(
    output: ArrayView3<f32>,
    num_classes: usize,
    num_coeffs: usize,
    params: &YoloParams,
) -> Vec<RawBox> {
    let preds = output.index_axis(ndarray::Axis(0), 0);
    let num_anchors = preds.shape()[1];
    let mut boxes = Vec::new();

    for a in 0..num_anchors {
        let (class_id, score) = (0..num_classes)
            .map(|c| (c, preds[[4 + c, a]]))
            .fold((0, f32::MIN), |best, cur| if cur.1 > best.1 { cur } else { best });

        if !(score >= params.conf_threshold) {
            continue;
        }

        let (cx, cy, w, h) = (preds[[0, a]], preds[[1, a]], preds[[2, a]], preds[[3, a]]);
        if w <= 0.0 || h <= 0.0 {
            continue;
        }

        let coeff_start = 4 + num_classes;
        boxes.push(RawBox {
            bbox: [cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0],
            score: score.min(1.0),
            class_id,
            coeffs: (coeff_start..coeff_start + num_coeffs)
                .map(|i| preds[[i, a]])
                .collect(),
        });
    }

    boxes
}

/// Intersection over union of two xyxy boxes
pub fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let ix = (a[2].min(b[2]) - a[0].max(b[0])).max(0.0);
    let iy = (a[3].min(b[3]) - a[1].max(b[1])).max(0.0);
    let inter = ix * iy;
    let area_a = (a[2] - a[0]) * (a[3] - a[1]);
    let area_b = (b[2] - b[0]) * (b[3] - b[1]);
    let union = area_a + area_b - inter;
    if union <= 0.0 {
        0.0
    } else {
        inter / union
    }
}

/// Greedy class-wise NMS; output is ordered by descending score
pub fn non_max_suppression(
    mut boxes: Vec<RawBox>,
    iou_threshold: f32,
    max_detections: usize,
) -> Vec<RawBox> {
    boxes.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    let mut kept: Vec<RawBox> = Vec::new();
    for candidate in boxes {
        let suppressed = kept.iter().any(|k| {
            k.class_id == candidate.class_id && iou(&k.bbox, &candidate.bbox) > iou_threshold
        });
        if !suppressed {
            kept.push(candidate);
            if kept.len() >= max_detections {
                break;
            }
        }
    }

    kept
}
