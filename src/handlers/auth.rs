//! Authentication handlers
//!
//! Login goes through the backend; the token and user it returns are kept in
//! the persisted session so later calls (typed or proxied) carry them.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::auth::{LoginParams, RegisterParams};
use crate::entity::User;
use crate::error::AppResult;
use crate::routes::ApiResponse;
use crate::state::{AppState, NoticeLevel};
use crate::store::{DepartmentState, SessionState};

/// Current session response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub authenticated: bool,
    pub user: Option<User>,
    pub role: Option<String>,
    pub permissions: Vec<String>,
    pub logged_in_at: Option<DateTime<Utc>>,
}

impl From<SessionState> for SessionView {
    fn from(s: SessionState) -> Self {
        Self {
            authenticated: s.is_authenticated(),
            user: s.user,
            role: s.role,
            permissions: s.permissions,
            logged_in_at: s.logged_in_at,
        }
    }
}

/// POST /api/console/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginParams>,
) -> AppResult<Json<ApiResponse<SessionView>>> {
    let response = match state.api.login(&req).await {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!("Login failed for {}: {}", req.username, e);
            let err = e.into();
            state.report(&err, "登录失败");
            return Err(err);
        }
    };

    let snapshot = state.session.write().await.update(|s| {
        s.set_token(&response.token);
        s.set_user(response.user.clone());
        s.clone()
    })?;
    // A different operator may work on a different factory
    *state.departments.write().await = DepartmentState::default();

    tracing::info!("Operator {} logged in", response.user.username);
    state.notify(NoticeLevel::Success, "登录成功");
    Ok(Json(ApiResponse::success(snapshot.into())))
}

/// POST /api/console/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterParams>,
) -> AppResult<Json<ApiResponse<SessionView>>> {
    if req.password != req.confirm_password {
        return Err(crate::error::AppError::BadRequest("两次输入的密码不一致".to_string()));
    }
    let response = match state.api.register(&req).await {
        Ok(r) => r,
        Err(e) => {
            let err = e.into();
            state.report(&err, "注册失败");
            return Err(err);
        }
    };

    let snapshot = state.session.write().await.update(|s| {
        s.set_token(&response.token);
        s.set_user(response.user.clone());
        s.clone()
    })?;
    state.notify(NoticeLevel::Success, "注册成功");
    Ok(Json(ApiResponse::success(snapshot.into())))
}

/// POST /api/console/logout
pub async fn logout(State(state): State<AppState>) -> AppResult<Json<ApiResponse<()>>> {
    state.session.write().await.update(SessionState::clear)?;
    state.factories.write().await.update(|f| f.clear())?;
    *state.departments.write().await = DepartmentState::default();
    tracing::info!("Operator logged out");
    Ok(Json(ApiResponse::success_msg("success")))
}

/// GET /api/console/session
///
/// Fills in the user record from `/auth/me` when only a token is stored.
pub async fn current_session(State(state): State<AppState>) -> AppResult<Json<ApiResponse<SessionView>>> {
    let snapshot = state.session_snapshot().await;
    if snapshot.user.is_some() || !snapshot.is_authenticated() {
        return Ok(Json(ApiResponse::success(snapshot.into())));
    }

    let user = state.api.current_user().await?;
    let snapshot = state.session.write().await.update(|s| {
        s.set_user(user);
        s.clone()
    })?;
    Ok(Json(ApiResponse::success(snapshot.into())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::spawn_backend;
    use crate::state::tests::state_for;
    use axum::{routing::post, Router};
    use serde_json::json;

    #[tokio::test]
    async fn test_login_persists_session() {
        let backend = Router::new().route(
            "/api/auth/login",
            post(|| async {
                Json(json!({
                    "message": "ok",
                    "token": "Bearer jwt-1",
                    "user": {"id": 3, "username": "chen", "role": "super_admin", "factoryId": "f1"}
                }))
            }),
        );
        let dir = tempfile::tempdir().unwrap();
        let state = state_for(spawn_backend(backend).await, dir.path());

        let params = LoginParams {
            username: "chen".to_string(),
            password: "secret".to_string(),
            captcha: None,
        };
        let Json(body) = login(State(state.clone()), Json(params)).await.unwrap();
        let view = body.data.unwrap();
        assert!(view.authenticated);
        assert_eq!(view.role.as_deref(), Some("super_admin"));

        let session = state.session_snapshot().await;
        assert_eq!(session.token.as_deref(), Some("jwt-1"));
        assert_eq!(state.current_factory_id().await.as_deref(), Some("f1"));

        logout(State(state.clone())).await.unwrap();
        assert!(!state.session_snapshot().await.is_authenticated());
    }
}
