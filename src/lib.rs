// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod cli;
pub mod config;
pub mod registry;
pub mod version;
pub mod vision;

pub use api::{create_app, start_server, ApiError, AppState};
pub use config::{ConfigError, ServiceConfig};
pub use registry::{EndpointRegistry, EndpointSpec, HandlerKind, HttpMethod, RegistryError};
pub use vision::{
    Detection, ImageSegmenter, InferenceError, ModelMetadata, ObjectDetector, SegmentedObject,
    Task, VisionModelConfig, VisionModelManager,
};
