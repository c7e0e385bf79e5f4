// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use serde::{Deserialize, Serialize};

/// Annotated image plus a short summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentImageResponse {
    pub message: String,
    /// Base64 WebP, same dimensions as the input
    pub segmented_image: String,
}

impl SegmentImageResponse {
    pub fn new(object_count: usize, segmented_image: String) -> Self {
        let noun = if object_count == 1 { "object" } else { "objects" };
        Self {
            message: format!("Segmented {} {}", object_count, noun),
            segmented_image,
        }
    }
}
