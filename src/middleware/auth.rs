//! Authentication middleware
//!
//! The console only checks that an operator is logged in, i.e. that a backend
//! token is stored. The backend remains the authority on what that token may
//! do; its 401/403 answers are relayed as they come.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::routes::ApiResponse;
use crate::state::AppState;

/// Extension to store the current operator in request
#[derive(Clone, Debug)]
pub struct CurrentOperator {
    pub username: String,
    pub is_super_admin: bool,
}

/// Paths that don't require authentication
fn is_public_path(path: &str) -> bool {
    // All non-API routes are static files and should be public
    if !path.starts_with("/api") {
        return true;
    }

    // Console session endpoints
    if path == "/api/console/login" || path == "/api/console/logout" || path == "/api/console/register" {
        return true;
    }
    // Backend auth endpoints reached through the proxy
    if path.starts_with("/api/auth/login")
        || path.starts_with("/api/auth/register")
        || path.starts_with("/api/auth/captcha")
    {
        return true;
    }
    // Health check and public settings
    if path == "/api/health" || path == "/api/config" {
        return true;
    }
    false
}

/// Authentication middleware
pub async fn auth_layer(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    // Skip auth for public paths
    if is_public_path(&path) {
        return next.run(request).await;
    }

    let session = state.session_snapshot().await;
    if !session.is_authenticated() {
        tracing::debug!("Rejected unauthenticated request to {}", path);
        return (
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::<()>::error("未登录或登录已过期")),
        )
            .into_response();
    }

    let current = CurrentOperator {
        username: session
            .user
            .as_ref()
            .map(|u| u.username.clone())
            .unwrap_or_default(),
        is_super_admin: session.is_super_admin(),
    };
    request.extensions_mut().insert(current);

    next.run(request).await
}
