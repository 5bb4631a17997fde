use axum::{extract::State, response::Json};
use serde::Serialize;

use super::ApiResponse;
use crate::state::AppState;
use crate::ws::HUB;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    /// Open notice sockets
    pub clients: usize,
    pub upstream: String,
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<HealthStatus>> {
    Json(ApiResponse::success(HealthStatus {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        clients: HUB.len(),
        upstream: state.api.base_url().to_string(),
    }))
}
