// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Instance masks from YOLO prototype tensors
//!
//! A segmentation head emits `nm` prototype masks `[nm, ph, pw]` covering the
//! model input, plus `nm` coefficients per detection. The instance mask is
//! `sigmoid(coeffs · protos)`, cropped to the detection box and thresholded at 0.5.
//! `sigmoid(v) > 0.5` is equivalent to `v > 0`, so the sigmoid is never evaluated.

use image::{GrayImage, Luma};
use ndarray::{Array2, ArrayView3};

use super::{InferenceError, Letterbox};

/// Build a full-resolution binary mask (0/255) for one detection
///
/// `bbox` is in original-image pixels.
pub fn build_mask(
    coeffs: &[f32],
    protos: ArrayView3<f32>,
    bbox: [f32; 4],
    letterbox: &Letterbox,
) -> Result<GrayImage, InferenceError> {
    let (num_protos, proto_h, proto_w) = protos.dim();
    if proto_h == 0 || proto_w == 0 {
        return Err(InferenceError::UnexpectedOutput(
            "empty prototype tensor".to_string(),
        ));
    }
    if coeffs.len() != num_protos {
        return Err(InferenceError::UnexpectedOutput(format!(
            "{} mask coefficients for {} prototypes",
            coeffs.len(),
            num_protos
        )));
    }

    let width = letterbox.orig_width;
    let height = letterbox.orig_height;
    let mut mask = GrayImage::new(width, height);

    let x_start = bbox[0].floor().max(0.0) as u32;
    let y_start = bbox[1].floor().max(0.0) as u32;
    let x_end = (bbox[2].ceil() as u32).min(width);
    let y_end = (bbox[3].ceil() as u32).min(height);
    if x_start >= x_end || y_start >= y_end {
        return Ok(mask);
    }

    // Prototype cells per input pixel
    let sx = proto_w as f32 / letterbox.input_size as f32;
    let sy = proto_h as f32 / letterbox.input_size as f32;
    let to_cell = |x: u32, y: u32| -> (usize, usize) {
        let (ix, iy) = letterbox.to_input(x as f32 + 0.5, y as f32 + 0.5);
        let px = ((ix * sx) as usize).min(proto_w - 1);
        let py = ((iy * sy) as usize).min(proto_h - 1);
        (px, py)
    };

    // Evaluate logits once per prototype cell inside the box
    let (cx0, cy0) = to_cell(x_start, y_start);
    let (cx1, cy1) = to_cell(x_end - 1, y_end - 1);
    let mut logits = Array2::<f32>::zeros((cy1 - cy0 + 1, cx1 - cx0 + 1));
    for ((row, col), logit) in logits.indexed_iter_mut() {
        let (py, px) = (cy0 + row, cx0 + col);
        *logit = coeffs
            .iter()
            .enumerate()
            .map(|(k, c)| c * protos[[k, py, px]])
            .sum();
    }

    for y in y_start..y_end {
        for x in x_start..x_end {
            let (px, py) = to_cell(x, y);
            if logits[[py - cy0, px - cx0]] > 0.0 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
    }

    Ok(mask)
}
