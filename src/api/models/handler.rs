// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{extract::State, Json};
use tracing::debug;

use super::response::ModelsResponse;
use crate::api::http_server::AppState;

/// List metadata of the loaded models
///
/// Read-only; an empty list when nothing is loaded.
pub async fn get_models_handler(State(state): State<AppState>) -> Json<ModelsResponse> {
    let models = state.models.list_models();
    debug!("Listing {} loaded models", models.len());
    Json(ModelsResponse { models })
}
