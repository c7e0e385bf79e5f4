// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Endpoint registry: the declarative path/method → handler mapping
//!
//! The file is validated completely at load time. A bad entry (missing field,
//! unsupported method, unknown handler, duplicate route) stops startup instead
//! of surfacing on the first request.
//!
//! ```yaml
//! endpoints:
//!   - endpoint: /v1/detect-image
//!     http_method: POST
//!     function_name: detect_image
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use figment::providers::{Format, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Endpoint file and lookup errors
#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    #[error("Failed to read endpoint configuration: {0}")]
    Parse(String),

    #[error("Endpoint configuration declares no endpoints")]
    Empty,

    #[error("Endpoint #{index}: missing field '{field}'")]
    MissingField { index: usize, field: &'static str },

    #[error("Endpoint #{index}: invalid path '{path}' ({reason})")]
    InvalidPath {
        index: usize,
        path: String,
        reason: &'static str,
    },

    #[error("Endpoint #{index}: unsupported HTTP method '{method}' (supported: GET, POST)")]
    UnsupportedMethod { index: usize, method: String },

    #[error("Endpoint #{index}: unknown function '{name}' (available: {available})")]
    UnknownHandler {
        index: usize,
        name: String,
        available: String,
    },

    #[error("Endpoint #{index}: duplicate route {method} {path}")]
    DuplicateEndpoint {
        index: usize,
        method: HttpMethod,
        path: String,
    },

    #[error("No endpoint registered for {method} {path}")]
    NotFound { method: String, path: String },
}

impl RegistryError {
    /// Whether this error comes from loading the configuration
    pub fn is_config_error(&self) -> bool {
        !matches!(self, RegistryError::NotFound { .. })
    }
}

/// HTTP methods an endpoint may be bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            _ => Err(()),
        }
    }
}

/// The compiled-in handler set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerKind {
    GetModels,
    DetectImage,
    SegmentImage,
}

impl HandlerKind {
    pub const ALL: [HandlerKind; 3] = [
        HandlerKind::GetModels,
        HandlerKind::DetectImage,
        HandlerKind::SegmentImage,
    ];

    /// Name used in `function_name`
    pub fn name(&self) -> &'static str {
        match self {
            HandlerKind::GetModels => "get_models",
            HandlerKind::DetectImage => "detect_image",
            HandlerKind::SegmentImage => "segment_image",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name.trim())
    }

    fn available_names() -> String {
        Self::ALL
            .iter()
            .map(|kind| kind.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One validated entry of the endpoint file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointSpec {
    pub path: String,
    pub http_method: HttpMethod,
    pub handler: HandlerKind,
}

/// Entry as written in the file, before validation
#[derive(Debug, Default, Deserialize)]
struct RawEndpoint {
    endpoint: Option<String>,
    http_method: Option<String>,
    function_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawEndpointFile {
    #[serde(default)]
    endpoints: Vec<RawEndpoint>,
}

/// Validated, immutable endpoint table
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointRegistry {
    endpoints: Vec<EndpointSpec>,
    index: HashMap<(String, HttpMethod), HandlerKind>,
}

impl EndpointRegistry {
    /// Load and validate an endpoint file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(RegistryError::Parse(format!(
                "endpoint file {} not found",
                path.display()
            )));
        }

        info!("Loading endpoint configuration from {}", path.display());
        Self::from_figment(Figment::from(Yaml::file(path)))
    }

    /// Parse and validate endpoint YAML held in memory
    pub fn from_yaml_str(yaml: &str) -> Result<Self, RegistryError> {
        Self::from_figment(Figment::from(Yaml::string(yaml)))
    }

    fn from_figment(figment: Figment) -> Result<Self, RegistryError> {
        let raw: RawEndpointFile = figment
            .extract()
            .map_err(|e| RegistryError::Parse(e.to_string()))?;
        let registry = Self::from_raw(raw.endpoints)?;

        for spec in &registry.endpoints {
            debug!("Registered {} {} -> {}", spec.http_method, spec.path, spec.handler);
        }
        info!("✅ {} endpoints registered", registry.endpoints.len());

        Ok(registry)
    }

    fn from_raw(raw: Vec<RawEndpoint>) -> Result<Self, RegistryError> {
        if raw.is_empty() {
            return Err(RegistryError::Empty);
        }

        let mut endpoints = Vec::with_capacity(raw.len());
        let mut index = HashMap::with_capacity(raw.len());

        for (i, entry) in raw.into_iter().enumerate() {
            let spec = validate_entry(i, entry)?;
            let key = (spec.path.clone(), spec.http_method);
            if index.contains_key(&key) {
                return Err(RegistryError::DuplicateEndpoint {
                    index: i,
                    method: spec.http_method,
                    path: spec.path,
                });
            }
            index.insert(key, spec.handler);
            endpoints.push(spec);
        }

        Ok(Self { endpoints, index })
    }

    /// Resolve the handler for a request
    pub fn lookup(&self, path: &str, method: &str) -> Result<HandlerKind, RegistryError> {
        let not_found = || RegistryError::NotFound {
            method: method.to_string(),
            path: path.to_string(),
        };

        let method: HttpMethod = method.parse().map_err(|_| not_found())?;
        self.index
            .get(&(path.to_string(), method))
            .copied()
            .ok_or_else(not_found)
    }

    /// Entries in file order
    pub fn endpoints(&self) -> &[EndpointSpec] {
        &self.endpoints
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

impl Default for EndpointRegistry {
    /// The three standard endpoints
    fn default() -> Self {
        Self::from_yaml_str(DEFAULT_ENDPOINTS_YAML).expect("default endpoint table is valid")
    }
}

/// Endpoint table used when no file is configured
pub const DEFAULT_ENDPOINTS_YAML: &str = r#"
endpoints:
  - endpoint: /models
    http_method: GET
    function_name: get_models
  - endpoint: /v1/detect-image
    http_method: POST
    function_name: detect_image
  - endpoint: /v1/segment-image
    http_method: POST
    function_name: segment_image
"#;

fn validate_entry(index: usize, entry: RawEndpoint) -> Result<EndpointSpec, RegistryError> {
    let path = entry
        .endpoint
        .map(|p| p.trim().to_string())
        .ok_or(RegistryError::MissingField {
            index,
            field: "endpoint",
        })?;
    let method = entry.http_method.ok_or(RegistryError::MissingField {
        index,
        field: "http_method",
    })?;
    let name = entry.function_name.ok_or(RegistryError::MissingField {
        index,
        field: "function_name",
    })?;

    validate_path(index, &path)?;

    let http_method = method
        .parse::<HttpMethod>()
        .map_err(|_| RegistryError::UnsupportedMethod {
            index,
            method: method.clone(),
        })?;

    let handler = HandlerKind::from_name(&name).ok_or_else(|| RegistryError::UnknownHandler {
        index,
        name: name.clone(),
        available: HandlerKind::available_names(),
    })?;

    Ok(EndpointSpec {
        path,
        http_method,
        handler,
    })
}

fn validate_path(index: usize, path: &str) -> Result<(), RegistryError> {
    let invalid = |reason| RegistryError::InvalidPath {
        index,
        path: path.to_string(),
        reason,
    };

    if path.is_empty() {
        return Err(invalid("empty"));
    }
    if !path.starts_with('/') {
        return Err(invalid("must start with '/'"));
    }
    if path.contains([':', '*', '{', '}']) {
        return Err(invalid("parameters and wildcards are not supported"));
    }
    if path.chars().any(|c| c.is_whitespace() || c == '?' || c == '#') {
        return Err(invalid("contains whitespace, query or fragment"));
    }
    Ok(())
}
