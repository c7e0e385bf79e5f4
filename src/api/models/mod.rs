// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Model listing endpoint module
//!
//! Provides `get_models`, mounted at GET /models by the default endpoint file.

pub mod handler;
pub mod response;

pub use handler::get_models_handler;
pub use response::ModelsResponse;
