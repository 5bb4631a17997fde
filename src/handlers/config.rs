//! Configuration handlers
//!
//! Returns public configuration settings to the frontend

use axum::{extract::State, response::Json};
use serde::Serialize;

use crate::state::AppState;

/// Public configuration response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicConfig {
    /// Backend request timeout in milliseconds
    pub timeout_ms: u64,
    /// Path of the notice stream
    pub ws_path: &'static str,
}

/// GET /api/config
pub async fn get_config(State(state): State<AppState>) -> Json<PublicConfig> {
    Json(PublicConfig {
        timeout_ms: state.config.upstream.timeout_ms,
        ws_path: "/api/ws",
    })
}
