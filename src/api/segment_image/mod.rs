// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Instance segmentation endpoint module
//!
//! Provides `segment_image`, mounted at POST /v1/segment-image by the default endpoint file.

pub mod handler;
pub mod response;

pub use handler::segment_image_handler;
pub use response::SegmentImageResponse;
