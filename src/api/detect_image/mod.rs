// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Object detection endpoint module
//!
//! Provides `detect_image`, mounted at POST /v1/detect-image by the default endpoint file.

pub mod handler;
pub mod response;

pub use handler::detect_image_handler;
pub use response::{DetectImageResponse, Prediction};
