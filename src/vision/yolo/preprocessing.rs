// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image preprocessing for YOLO models

use image::{imageops, DynamicImage, GenericImageView, Rgb, RgbImage};
use ndarray::Array4;

/// Grey used by the YOLO exporters for letterbox padding
pub const PAD_VALUE: u8 = 114;

/// Mapping between original-image pixels and the square model input
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub scale: f32,
    pub pad_x: f32,
    pub pad_y: f32,
    pub input_size: u32,
    pub orig_width: u32,
    pub orig_height: u32,
}

impl Letterbox {
    pub fn new(orig_width: u32, orig_height: u32, input_size: u32) -> Self {
        let w = orig_width.max(1);
        let h = orig_height.max(1);
        let scale = (input_size as f32 / w as f32).min(input_size as f32 / h as f32);
        let (new_w, new_h) = Self::scaled_dims(w, h, scale, input_size);

        Self {
            scale,
            pad_x: ((input_size - new_w) / 2) as f32,
            pad_y: ((input_size - new_h) / 2) as f32,
            input_size,
            orig_width: w,
            orig_height: h,
        }
    }

    fn scaled_dims(w: u32, h: u32, scale: f32, input_size: u32) -> (u32, u32) {
        let new_w = ((w as f32 * scale).round() as u32).clamp(1, input_size);
        let new_h = ((h as f32 * scale).round() as u32).clamp(1, input_size);
        (new_w, new_h)
    }

    /// Resized (unpadded) dimensions of the image inside the input
    pub fn content_dims(&self) -> (u32, u32) {
        Self::scaled_dims(self.orig_width, self.orig_height, self.scale, self.input_size)
    }

    /// Map a point in model-input space back to the original image, clamped to its bounds
    pub fn to_original(&self, x: f32, y: f32) -> (f32, f32) {
        let ox = (x - self.pad_x) / self.scale;
        let oy = (y - self.pad_y) / self.scale;
        (
            ox.clamp(0.0, self.orig_width as f32),
            oy.clamp(0.0, self.orig_height as f32),
        )
    }

    /// Map a point in the original image into model-input space
    pub fn to_input(&self, x: f32, y: f32) -> (f32, f32) {
        (x * self.scale + self.pad_x, y * self.scale + self.pad_y)
    }

    /// Map an input-space xyxy box to the original image
    pub fn box_to_original(&self, bbox: [f32; 4]) -> [f32; 4] {
        let (x1, y1) = self.to_original(bbox[0], bbox[1]);
        let (x2, y2) = self.to_original(bbox[2], bbox[3]);
        [x1, y1, x2, y2]
    }
}

/// Letterbox an image into a normalized NCHW tensor [1, 3, S, S]
///
/// Steps:
/// 1. Resize preserving aspect ratio so the longer side equals `input_size`
/// 2. Centre on a grey (114) square canvas
/// 3. Scale RGB values to 0..1
pub fn letterbox(image: &DynamicImage, input_size: u32) -> (Array4<f32>, Letterbox) {
    let (w, h) = image.dimensions();
    let lb = Letterbox::new(w, h, input_size);
    let (new_w, new_h) = lb.content_dims();

    let resized = image
        .resize_exact(new_w, new_h, imageops::FilterType::Triangle)
        .to_rgb8();

    let mut canvas = RgbImage::from_pixel(input_size, input_size, Rgb([PAD_VALUE; 3]));
    imageops::overlay(&mut canvas, &resized, lb.pad_x as i64, lb.pad_y as i64);

    let size = input_size as usize;
    let mut tensor = Array4::zeros((1, 3, size, size));
    for (x, y, pixel) in canvas.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
        }
    }

    (tensor, lb)
}
