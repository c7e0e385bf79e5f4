// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image transport helpers: base64 payloads in, WebP payloads out

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageFormat, RgbImage};
use thiserror::Error;

/// Maximum decoded image size (10MB)
pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

/// Errors raised while turning a request payload into pixels
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("image_base64 is required")]
    MissingImage,

    #[error("Image data is too large: {0} bytes (max: {1} bytes)")]
    TooLarge(usize, usize),

    #[error("Invalid base64 encoding: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("Unsupported image format")]
    UnsupportedFormat,

    #[error("Failed to decode image: {0}")]
    DecodeFailed(String),
}

/// Metadata about an uploaded image
#[derive(Debug, Clone)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
    pub size_bytes: usize,
}

/// Decode a base64-encoded image into pixels
///
/// Accepts an optional `data:image/...;base64,` prefix, which browsers add
/// when reading files as data URLs.
pub fn decode_base64_image(base64_str: &str) -> Result<(DynamicImage, ImageInfo), DecodeError> {
    let payload = strip_data_url(base64_str.trim());
    if payload.is_empty() {
        return Err(DecodeError::MissingImage);
    }

    // Reject before allocating: base64 expands 3 bytes into 4 chars
    let estimated = payload.len() / 4 * 3;
    if estimated > MAX_IMAGE_SIZE {
        return Err(DecodeError::TooLarge(estimated, MAX_IMAGE_SIZE));
    }

    let bytes = STANDARD.decode(payload)?;
    decode_image_bytes(&bytes)
}

/// Decode raw image bytes, detecting the format from magic bytes
pub fn decode_image_bytes(bytes: &[u8]) -> Result<(DynamicImage, ImageInfo), DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::MissingImage);
    }
    if bytes.len() > MAX_IMAGE_SIZE {
        return Err(DecodeError::TooLarge(bytes.len(), MAX_IMAGE_SIZE));
    }

    let format = detect_format(bytes)?;
    let img = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| DecodeError::DecodeFailed(e.to_string()))?;

    let info = ImageInfo {
        width: img.width(),
        height: img.height(),
        format,
        size_bytes: bytes.len(),
    };

    Ok((img, info))
}

/// Detect image format from magic bytes
pub fn detect_format(bytes: &[u8]) -> Result<ImageFormat, DecodeError> {
    match bytes {
        [0x89, 0x50, 0x4E, 0x47, ..] => Ok(ImageFormat::Png),
        [0xFF, 0xD8, 0xFF, ..] => Ok(ImageFormat::Jpeg),
        // RIFF .... WEBP
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Ok(ImageFormat::WebP),
        [0x47, 0x49, 0x46, 0x38, x, ..] if *x == 0x37 || *x == 0x39 => Ok(ImageFormat::Gif),
        [0x42, 0x4D, _, _, ..] => Ok(ImageFormat::Bmp),
        [0x49, 0x49, 0x2A, 0x00, ..] | [0x4D, 0x4D, 0x00, 0x2A, ..] => Ok(ImageFormat::Tiff),
        _ => Err(DecodeError::UnsupportedFormat),
    }
}

/// Encode an RGB image as lossless WebP
pub fn encode_webp(image: &RgbImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::WebP)?;
    Ok(buffer.into_inner())
}

/// Base64-encode bytes for a JSON response
pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

fn strip_data_url(input: &str) -> &str {
    match input.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => input,
    }
}
