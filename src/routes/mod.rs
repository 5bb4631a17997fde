use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::handlers;
use crate::middleware::auth_layer;
use crate::state::AppState;
use crate::ws;

pub mod health;

/// API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub code: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: true,
            message: "success".to_string(),
            data: Some(data),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            code: false,
            message: message.into(),
            data: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn success_msg(message: impl Into<String>) -> Self {
        Self {
            code: true,
            message: message.into(),
            data: None,
        }
    }
}

/// Create the main router
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API routes
    let api_routes = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Config routes
        .route("/config", get(handlers::config::get_config))
        // Session routes
        .route("/console/login", post(handlers::auth::login))
        .route("/console/register", post(handlers::auth::register))
        .route("/console/logout", post(handlers::auth::logout))
        .route("/console/session", get(handlers::auth::current_session))
        // Factory routes
        .route("/console/factories", get(handlers::factory::list_factories))
        .route("/console/factories/current", post(handlers::factory::select_factory))
        // Department routes
        .route(
            "/console/departments",
            get(handlers::department::get_tree).post(handlers::department::add_department),
        )
        .route(
            "/console/departments/:id",
            put(handlers::department::update_department).delete(handlers::department::delete_department),
        )
        .route("/console/departments/:id/restore", post(handlers::department::restore_department))
        .route("/console/departments/:id/purge", delete(handlers::department::purge_department))
        .route(
            "/console/departments/:id/employees",
            get(handlers::department::department_employees).post(handlers::department::assign_employees),
        )
        // Employee pool
        .route("/console/employees", get(handlers::personnel::employee_pool))
        // WebSocket
        .route("/ws", get(ws::serve_ws))
        // Everything else belongs to the backend
        .fallback(handlers::proxy::forward);

    // Static file service for frontend
    // Serves the built SPA, falls back to index.html for client-side routing
    let static_dir = state.config.static_dir.clone();
    let serve_dir = ServeDir::new(&static_dir).not_found_service(ServeFile::new(static_dir.join("index.html")));

    Router::new()
        .nest("/api", api_routes)
        .fallback_service(serve_dir)
        .layer(middleware::from_fn_with_state(state.clone(), auth_layer))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::tests::state_for;
    use axum::{body::Body, http::{Request, StatusCode}};
    use tower::ServiceExt;

    #[test]
    fn test_response_shape() {
        let value = serde_json::to_value(ApiResponse::success(3)).unwrap();
        assert_eq!(value["code"], true);
        assert_eq!(value["data"], 3);

        let value = serde_json::to_value(ApiResponse::<()>::error("未登录")).unwrap();
        assert_eq!(value["code"], false);
        assert!(value.get("data").is_none());
    }

    #[tokio::test]
    async fn test_console_requires_login() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_for("http://127.0.0.1:9/api".to_string(), dir.path());
        let app = create_router(state);

        let response = app
            .clone()
            .oneshot(Request::get("/api/console/departments").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
