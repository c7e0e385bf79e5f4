// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use clap::Parser;
use std::path::PathBuf;

/// YOLO detection and segmentation endpoints over HTTP
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "vision-endpoints")]
#[command(version = crate::version::VERSION_NUMBER)]
#[command(about = "Serve YOLO detection and segmentation endpoints", long_about = None)]
pub struct Cli {
    /// Service configuration file (YAML)
    #[arg(long, short = 'c', env = "VISION_CONFIG")]
    pub config: Option<PathBuf>,

    /// Endpoint mapping file (YAML)
    #[arg(long, short = 'e', env = "VISION_ENDPOINTS")]
    pub endpoints: Option<PathBuf>,

    /// Listen address, e.g. 0.0.0.0:8080
    #[arg(long, short = 'l')]
    pub listen: Option<String>,

    /// Base data directory holding the model directory
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Model directory relative to the data directory
    #[arg(long)]
    pub model_binary_dir: Option<PathBuf>,

    /// Validate the endpoint file and exit
    #[arg(long)]
    pub check: bool,
}
