// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Annotated output images for segmentation results

use image::{DynamicImage, Rgb, RgbImage};

use crate::vision::yolo::SegmentedObject;

/// Mask fill opacity
const MASK_ALPHA: f32 = 0.5;

/// Per-class colours, cycled by class id
const PALETTE: [[u8; 3]; 20] = [
    [0xFF, 0x38, 0x38],
    [0xFF, 0x9D, 0x97],
    [0xFF, 0x70, 0x1F],
    [0xFF, 0xB2, 0x1D],
    [0xCF, 0xD2, 0x31],
    [0x48, 0xF9, 0x0A],
    [0x92, 0xCC, 0x17],
    [0x3D, 0xDB, 0x86],
    [0x1A, 0x93, 0x34],
    [0x00, 0xD4, 0xBB],
    [0x2C, 0x99, 0xA8],
    [0x00, 0xC2, 0xFF],
    [0x34, 0x45, 0x93],
    [0x64, 0x73, 0xFF],
    [0x00, 0x18, 0xEC],
    [0x84, 0x38, 0xFF],
    [0x52, 0x00, 0x85],
    [0xCB, 0x38, 0xFF],
    [0xFF, 0x95, 0xC8],
    [0xFF, 0x37, 0xC7],
];

pub fn class_color(class_id: usize) -> Rgb<u8> {
    Rgb(PALETTE[class_id % PALETTE.len()])
}

/// Draw masks and box outlines over a copy of `image`
///
/// The result always has the dimensions of `image`.
pub fn plot_segmentation(image: &DynamicImage, objects: &[SegmentedObject]) -> RgbImage {
    let mut canvas = image.to_rgb8();
    let (width, height) = canvas.dimensions();
    let thickness = line_thickness(width, height);

    for object in objects {
        let color = class_color(object.detection.class_id);

        if object.mask.dimensions() == (width, height) {
            for (x, y, m) in object.mask.enumerate_pixels() {
                if m.0[0] > 0 {
                    let pixel = canvas.get_pixel_mut(x, y);
                    *pixel = blend(*pixel, color, MASK_ALPHA);
                }
            }
        }

        draw_box(&mut canvas, object.detection.bbox, color, thickness);
    }

    canvas
}

fn line_thickness(width: u32, height: u32) -> u32 {
    (((width + height) as f32 / 2.0 * 0.003).round() as u32).max(1)
}

fn blend(base: Rgb<u8>, color: Rgb<u8>, alpha: f32) -> Rgb<u8> {
    let mix = |b: u8, c: u8| (b as f32 * (1.0 - alpha) + c as f32 * alpha).round() as u8;
    Rgb([
        mix(base[0], color[0]),
        mix(base[1], color[1]),
        mix(base[2], color[2]),
    ])
}

/// Outline an xyxy box, clipped to the canvas
fn draw_box(canvas: &mut RgbImage, bbox: [f32; 4], color: Rgb<u8>, thickness: u32) {
    let (width, height) = canvas.dimensions();
    if width == 0 || height == 0 {
        return;
    }

    let clamp_x = |v: f32| (v.max(0.0) as u32).min(width - 1);
    let clamp_y = |v: f32| (v.max(0.0) as u32).min(height - 1);
    let (x1, y1) = (clamp_x(bbox[0]), clamp_y(bbox[1]));
    let (x2, y2) = (clamp_x(bbox[2]), clamp_y(bbox[3]));
    if x2 < x1 || y2 < y1 {
        return;
    }

    for t in 0..thickness {
        let top = (y1 + t).min(y2);
        let bottom = y2.saturating_sub(t).max(y1);
        for x in x1..=x2 {
            canvas.put_pixel(x, top, color);
            canvas.put_pixel(x, bottom, color);
        }

        let left = (x1 + t).min(x2);
        let right = x2.saturating_sub(t).max(x1);
        for y in y1..=y2 {
            canvas.put_pixel(left, y, color);
            canvas.put_pixel(right, y, color);
        }
    }
}
