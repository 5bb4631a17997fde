//! Factory selection handlers

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::entity::Factory;
use crate::error::{AppResult, OptionExt};
use crate::routes::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FactoryView {
    pub current_factory: Option<Factory>,
    pub factories: Vec<Factory>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectFactoryRequest {
    pub factory_id: String,
}

/// GET /api/console/factories
pub async fn list_factories(State(state): State<AppState>) -> AppResult<Json<ApiResponse<FactoryView>>> {
    let factories = match state.api.list_factories().await {
        Ok(f) => f,
        Err(e) => {
            let err = e.into();
            state.report(&err, "获取厂区列表失败");
            return Err(err);
        }
    };

    let view = state.factories.write().await.update(|store| {
        store.set_factories(factories);
        FactoryView {
            current_factory: store.current_factory.clone(),
            factories: store.factories.clone(),
        }
    })?;
    Ok(Json(ApiResponse::success(view)))
}

/// POST /api/console/factories/current
pub async fn select_factory(
    State(state): State<AppState>,
    Json(req): Json<SelectFactoryRequest>,
) -> AppResult<Json<ApiResponse<Factory>>> {
    let selected = state
        .factories
        .write()
        .await
        .update(|store| store.select(&req.factory_id).cloned())?
        .ok_or_not_found("厂区不存在")?;

    state
        .session
        .write()
        .await
        .update(|s| s.update_factory_id(&selected.id))?;
    state.departments.write().await.invalidate();

    tracing::info!("Switched to factory {} ({})", selected.name, selected.id);
    Ok(Json(ApiResponse::success(selected)))
}
