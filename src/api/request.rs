// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Request body shared by the image endpoints

use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;
use crate::vision::image_utils::MAX_IMAGE_SIZE;

/// Base64 text is 4/3 the size of the bytes it carries, plus slack for a data URL prefix
pub const MAX_BASE64_LEN: usize = MAX_IMAGE_SIZE / 3 * 4 + 1024;

/// `{ "image_base64": "<base64 image>" }`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageRequest {
    #[serde(default)]
    pub image_base64: Option<String>,
}

impl ImageRequest {
    pub fn new(image_base64: impl Into<String>) -> Self {
        Self {
            image_base64: Some(image_base64.into()),
        }
    }

    /// Validate presence and size, returning the payload
    pub fn image(&self) -> Result<&str, ApiError> {
        let image = self
            .image_base64
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ApiError::ValidationError {
                field: "image_base64".to_string(),
                message: "image_base64 is required".to_string(),
            })?;

        if image.len() > MAX_BASE64_LEN {
            return Err(ApiError::ValidationError {
                field: "image_base64".to_string(),
                message: format!("image exceeds maximum size of {} bytes", MAX_IMAGE_SIZE),
            });
        }

        Ok(image)
    }
}
