// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use clap::Parser;
use std::env;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vision_endpoints::{
    api::{start_server, AppState},
    cli::Cli,
    config::ServiceConfig,
    registry::EndpointRegistry,
    version,
    vision::VisionModelManager,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    println!("🚀 Starting Vision Endpoints...\n");
    println!("📦 {}", version::get_version_info());
    println!();

    let config = ServiceConfig::load(cli.config.as_deref())
        .context("Failed to load service configuration")?
        .with_overrides(&cli);
    let addr = config.socket_addr()?;

    let registry = match config.endpoints_file {
        Some(ref path) => EndpointRegistry::load(path)
            .with_context(|| format!("Invalid endpoint file {}", path.display()))?,
        None => {
            info!("No endpoint file configured, serving the default endpoints");
            EndpointRegistry::default()
        }
    };

    println!("🗺️  Endpoints:");
    for spec in registry.endpoints() {
        println!("   {:<6} {:<28} -> {}", spec.http_method, spec.path, spec.handler);
    }
    println!();

    if cli.check {
        println!("✅ Endpoint file is valid ({} endpoints)", registry.len());
        return Ok(());
    }

    println!("🧠 Loading YOLO models from {}...", config.models.model_dir().display());
    let models = VisionModelManager::load(&config.models).await?;
    for model in models.list_models() {
        println!("   ✅ {} ({}) from {}", model.name, model.task, model.checkpoint);
    }
    println!();

    start_server(AppState::new(models, registry), addr).await
}
