// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the vision endpoints service

/// Full version string with feature description
pub const VERSION: &str = "v0.1.0-yolo-endpoints-2025-11-20";

/// Semantic version number
pub const VERSION_NUMBER: &str = env!("CARGO_PKG_VERSION");

/// Build date
pub const BUILD_DATE: &str = "2025-11-20";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "declarative-endpoints",
    "yolo-detection",
    "yolo-segmentation",
    "end-to-end-exports",
    "anchor-exports-nms",
    "webp-output",
];

/// Get version information as a formatted string
pub fn get_version_info() -> String {
    format!(
        "Vision Endpoints {}\nBuild Date: {}\nFeatures: {}",
        VERSION,
        BUILD_DATE,
        FEATURES.join(", ")
    )
}
