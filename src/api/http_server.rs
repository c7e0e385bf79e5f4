// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::{DefaultBodyLimit, State},
    http::{Method, Uri},
    routing::{get, on, MethodFilter, MethodRouter},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, net::SocketAddr, sync::Arc};
use tokio::signal;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info, warn};

use super::detect_image::detect_image_handler;
use super::errors::ApiError;
use super::models::get_models_handler;
use super::request::MAX_BASE64_LEN;
use super::segment_image::segment_image_handler;
use crate::registry::{EndpointRegistry, HandlerKind, HttpMethod};
use crate::version;
use crate::vision::VisionModelManager;

const HEALTH_PATH: &str = "/health";

/// Largest accepted request body: a maximum-size image plus the JSON wrapper
pub const MAX_BODY_SIZE: usize = MAX_BASE64_LEN + 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub models: VisionModelManager,
    pub registry: Arc<EndpointRegistry>,
}

impl AppState {
    pub fn new(models: VisionModelManager, registry: EndpointRegistry) -> Self {
        Self {
            models,
            registry: Arc::new(registry),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub models_loaded: usize,
    pub endpoints: usize,
}

fn method_filter(method: HttpMethod) -> MethodFilter {
    match method {
        HttpMethod::Get => MethodFilter::GET,
        HttpMethod::Post => MethodFilter::POST,
    }
}

fn handler_route(handler: HandlerKind, method: HttpMethod) -> MethodRouter<AppState> {
    let filter = method_filter(method);
    match handler {
        HandlerKind::GetModels => on(filter, get_models_handler),
        HandlerKind::DetectImage => on(filter, detect_image_handler),
        HandlerKind::SegmentImage => on(filter, segment_image_handler),
    }
}

/// Build the router from the endpoint registry
///
/// Each path gets one method router covering every method declared for it,
/// so other methods on a known path answer 405.
pub fn create_app(state: AppState) -> Router {
    let mut routes: BTreeMap<String, MethodRouter<AppState>> = BTreeMap::new();
    for spec in state.registry.endpoints() {
        debug!(
            "Mounting {} {} -> {}",
            spec.http_method,
            spec.path,
            spec.handler.name()
        );
        let route = handler_route(spec.handler, spec.http_method);
        let merged = match routes.remove(&spec.path) {
            Some(existing) => existing.merge(route),
            None => route,
        };
        routes.insert(spec.path.clone(), merged);
    }

    if routes.contains_key(HEALTH_PATH) {
        warn!("Endpoint file declares {}, built-in health check disabled", HEALTH_PATH);
    } else {
        routes.insert(HEALTH_PATH.to_string(), get(health_handler));
    }

    let mut router = Router::new();
    for (path, route) in routes {
        router = router.route(&path, route);
    }

    router
        .fallback(fallback_handler)
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: version::VERSION.to_string(),
        models_loaded: state.models.model_count(),
        endpoints: state.registry.len(),
    })
}

async fn fallback_handler(State(state): State<AppState>, method: Method, uri: Uri) -> ApiError {
    match state.registry.lookup(uri.path(), method.as_str()) {
        Ok(handler) => ApiError::InternalError(format!(
            "{} {} maps to {} but is not routed",
            method,
            uri.path(),
            handler.name()
        )),
        Err(e) => e.into(),
    }
}

/// Serve until Ctrl-C
pub async fn start_server(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let endpoint_count = state.registry.len();
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        "HTTP server listening on {} ({} endpoints)",
        addr, endpoint_count
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("🛑 Shutting down...");
}
