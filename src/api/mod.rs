// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod detect_image;
pub mod errors;
pub mod http_server;
pub mod models;
pub mod request;
pub mod segment_image;

pub use detect_image::{detect_image_handler, DetectImageResponse, Prediction};
pub use errors::{ApiError, ErrorResponse};
pub use http_server::{create_app, start_server, AppState, HealthResponse, MAX_BODY_SIZE};
pub use models::{get_models_handler, ModelsResponse};
pub use request::{ImageRequest, MAX_BASE64_LEN};
pub use segment_image::{segment_image_handler, SegmentImageResponse};
