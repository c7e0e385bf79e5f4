// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Service configuration
//!
//! Layered, later sources winning:
//! 1. built-in defaults
//! 2. `vision-endpoints.yaml` in the working directory, or the file given with `--config`
//! 3. `VISION_`-prefixed environment variables, nested keys separated by `__`
//!    (e.g. `VISION_MODELS__DATA_DIR=/data`)
//! 4. command-line flags

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cli::Cli;
use crate::vision::VisionModelConfig;

const DEFAULT_CONFIG_PATHS: [&str; 2] = ["vision-endpoints.yaml", "vision-endpoints.yml"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to parse configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Address the HTTP server binds to
    pub listen_addr: String,
    /// Endpoint file; the standard three endpoints are served when unset
    pub endpoints_file: Option<PathBuf>,
    pub models: VisionModelConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            endpoints_file: None,
            models: VisionModelConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from defaults, file and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(ServiceConfig::default()));

        if let Some(path) = DEFAULT_CONFIG_PATHS.iter().map(Path::new).find(|p| p.exists()) {
            figment = figment.merge(Yaml::file(path));
        }

        if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            figment = figment.merge(Yaml::file(path));
        }

        figment = figment.merge(Env::prefixed("VISION_").split("__"));

        figment
            .extract()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Apply command-line overrides
    pub fn with_overrides(mut self, cli: &Cli) -> Self {
        if let Some(ref listen) = cli.listen {
            self.listen_addr = listen.clone();
        }
        if let Some(ref endpoints) = cli.endpoints {
            self.endpoints_file = Some(endpoints.clone());
        }
        if let Some(ref data_dir) = cli.data_dir {
            self.models.data_dir = data_dir.clone();
        }
        if let Some(ref model_dir) = cli.model_binary_dir {
            self.models.model_binary_dir = model_dir.clone();
        }
        self
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.listen_addr.parse().map_err(|e| {
            ConfigError::Invalid(format!("listen_addr '{}': {}", self.listen_addr, e))
        })
    }
}
