// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Endpoint files on disk and their use through the service configuration

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use vision_endpoints::{
    config::ServiceConfig,
    registry::{EndpointRegistry, HandlerKind, RegistryError},
};

fn shipped_endpoint_file() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("endpoints.yaml")
}

fn write_yaml(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_shipped_file_matches_defaults() {
    let registry = EndpointRegistry::load(shipped_endpoint_file()).unwrap();
    assert_eq!(registry, EndpointRegistry::default());
}

#[test]
fn test_every_entry_resolves_to_one_handler() {
    let registry = EndpointRegistry::load(shipped_endpoint_file()).unwrap();

    for spec in registry.endpoints() {
        let handler = registry
            .lookup(&spec.path, spec.http_method.as_str())
            .unwrap();
        assert_eq!(handler, spec.handler);
    }
    assert_eq!(
        registry.lookup("/v1/segment-image", "post").unwrap(),
        HandlerKind::SegmentImage
    );
}

#[test]
fn test_invalid_file_reports_entry() {
    let file = write_yaml(
        r#"
endpoints:
  - endpoint: /models
    http_method: GET
    function_name: get_models
  - endpoint: /v1/classify
    http_method: POST
    function_name: classify_image
"#,
    );

    let err = EndpointRegistry::load(file.path()).unwrap_err();
    assert!(err.is_config_error());
    match err {
        RegistryError::UnknownHandler { index, name, .. } => {
            assert_eq!(index, 1);
            assert_eq!(name, "classify_image");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_service_config_points_at_endpoint_file() {
    let endpoints = write_yaml(
        r#"
endpoints:
  - endpoint: /detect
    http_method: POST
    function_name: detect_image
"#,
    );
    let config_file = write_yaml(&format!(
        "endpoints_file: {}\n",
        endpoints.path().display()
    ));

    let config = ServiceConfig::load(Some(config_file.path())).unwrap();
    let path = config.endpoints_file.expect("endpoints_file set");
    let registry = EndpointRegistry::load(path).unwrap();

    assert_eq!(registry.len(), 1);
    assert_eq!(
        registry.lookup("/detect", "POST").unwrap(),
        HandlerKind::DetectImage
    );
}
