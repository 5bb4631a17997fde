//! Department handlers
//!
//! Department CRUD is delegated to the backend; after every change the tree is
//! refetched and rebuilt. Drops of employees onto the tree go through
//! [`crate::assign::reassign`].

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::{CreateDepartment, UpdateDepartment};
use crate::assign::{self, AssignOutcome, AssignRequest};
use crate::entity::{Department, Employee};
use crate::error::{AppError, AppResult, OptionExt};
use crate::middleware::auth::CurrentOperator;
use crate::routes::ApiResponse;
use crate::state::{AppState, NoticeLevel};
use crate::store::DepartmentState;
use crate::tree::view::{render, TreeItem};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeQuery {
    pub show_deleted: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeView {
    pub factory_id: Option<String>,
    pub show_deleted: bool,
    /// Another request is refetching the tree
    pub loading: bool,
    pub items: Vec<TreeItem>,
}

/// Add department request; no parent means a new top-level department
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddDepartmentRequest {
    pub name: String,
    pub parent_id: Option<String>,
    pub leader_id: Option<String>,
}

/// Update department request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDepartmentRequest {
    pub name: String,
    pub leader_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeesQuery {
    #[serde(default)]
    pub include_sub_departments: bool,
}

fn validate_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("请输入部门名称".to_string()));
    }
    Ok(name.to_string())
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Refetch after a successful change. The change itself already happened, so
/// a failed refetch only logs and applies `patch` to the cached tree instead.
async fn refresh_after_change<F>(state: &AppState, patch: F)
where
    F: FnOnce(&mut DepartmentState),
{
    if let Err(e) = state.refresh_departments().await {
        tracing::warn!("Department tree refresh failed, patching cached tree: {}", e);
        patch(&mut *state.departments.write().await);
    }
}

/// Report `err` as a notice and hand it back for the response
fn surface(state: &AppState, err: impl Into<AppError>, fallback: &str) -> AppError {
    let err = err.into();
    state.report(&err, fallback);
    err
}

/// GET /api/console/departments
pub async fn get_tree(
    State(state): State<AppState>,
    Extension(operator): Extension<CurrentOperator>,
    Query(query): Query<TreeQuery>,
) -> AppResult<Json<ApiResponse<TreeView>>> {
    if let Some(show) = query.show_deleted {
        let mut departments = state.departments.write().await;
        if departments.show_deleted != show {
            departments.show_deleted = show;
            departments.invalidate();
        }
    }

    if let Err(e) = state.ensure_departments().await {
        tracing::error!("Failed to load departments: {}", e);
        return Err(surface(&state, e, "加载部门列表失败"));
    }

    let departments = state.departments.read().await;
    let view = TreeView {
        factory_id: departments.factory_id.clone(),
        show_deleted: departments.show_deleted,
        loading: departments.loading,
        items: render(&departments.departments, departments.show_deleted, operator.is_super_admin),
    };
    Ok(Json(ApiResponse::success(view)))
}

/// POST /api/console/departments
pub async fn add_department(
    State(state): State<AppState>,
    Json(req): Json<AddDepartmentRequest>,
) -> AppResult<Json<ApiResponse<Department>>> {
    let name = validate_name(&req.name)?;
    let factory_id = state
        .current_factory_id()
        .await
        .ok_or_else(|| AppError::BadRequest("请先选择厂区".to_string()))?;

    let params = CreateDepartment {
        name,
        factory_id,
        parent_id: blank_to_none(req.parent_id),
        leader_id: blank_to_none(req.leader_id),
    };
    let created = state
        .api
        .create_department(&params)
        .await
        .map_err(|e| surface(&state, e, "保存部门失败"))?;

    tracing::info!("Created department {} ({})", created.name, created.id);
    state.notify(NoticeLevel::Success, "创建成功");
    let parent = created.parent().map(str::to_string);
    let record = created.clone();
    refresh_after_change(&state, move |d| {
        d.add(record, parent.as_deref());
    })
    .await;
    Ok(Json(ApiResponse::success(created)))
}

/// PUT /api/console/departments/{id}
pub async fn update_department(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateDepartmentRequest>,
) -> AppResult<Json<ApiResponse<Department>>> {
    let params = UpdateDepartment {
        name: validate_name(&req.name)?,
        leader_id: blank_to_none(req.leader_id),
    };
    let updated = state
        .api
        .update_department(&id, &params)
        .await
        .map_err(|e| surface(&state, e, "保存部门失败"))?;

    state.notify(NoticeLevel::Success, "更新成功");
    let (name, leader_id) = (updated.name.clone(), updated.leader_id.clone());
    refresh_after_change(&state, |d| {
        d.update(&id, |dept| {
            dept.name = name;
            dept.leader_id = leader_id;
        });
    })
    .await;
    Ok(Json(ApiResponse::success(updated)))
}

/// DELETE /api/console/departments/{id}
///
/// Soft delete; the backend cascades to sub-departments, employees,
/// attendance and schedules.
pub async fn delete_department(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<u32>>> {
    let outcome = state
        .api
        .delete_department(&id)
        .await
        .map_err(|e| surface(&state, e, "删除部门失败"))?;

    let headcount = state.departments.read().await.department_count(&id);
    tracing::info!(
        "Soft-deleted department {} ({} employee(s)), {} record(s) affected",
        id,
        headcount,
        outcome.cascade_count
    );
    state.notify(
        NoticeLevel::Success,
        format!("删除成功，影响 {} 条记录", outcome.cascade_count),
    );
    refresh_after_change(&state, |d| {
        d.update(&id, |dept| dept.deleted_at = Some(Utc::now().to_rfc3339()));
    })
    .await;
    Ok(Json(ApiResponse::success(outcome.cascade_count)))
}

/// POST /api/console/departments/{id}/restore
pub async fn restore_department(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    state
        .api
        .restore_department(&id)
        .await
        .map_err(|e| surface(&state, e, "恢复部门失败"))?;

    tracing::info!("Restored department {}", id);
    state.notify(NoticeLevel::Success, "恢复成功");
    refresh_after_change(&state, |d| {
        d.update(&id, |dept| dept.deleted_at = None);
    })
    .await;
    Ok(Json(ApiResponse::success_msg("success")))
}

/// DELETE /api/console/departments/{id}/purge
pub async fn purge_department(
    State(state): State<AppState>,
    Extension(operator): Extension<CurrentOperator>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    // Permission check: only super admins can purge
    if !operator.is_super_admin {
        return Err(surface(
            &state,
            AppError::Forbidden("权限不足，仅超级管理员可永久清除".to_string()),
            "永久清除失败",
        ));
    }

    state
        .api
        .force_delete_department(&id)
        .await
        .map_err(|e| surface(&state, e, "永久清除失败"))?;

    let headcount = state.departments.read().await.department_count(&id);
    tracing::warn!("Department {} ({} employee(s)) purged by {}", id, headcount, operator.username);
    state.notify(NoticeLevel::Success, "永久清除成功");
    refresh_after_change(&state, |d| {
        d.remove(&id);
    })
    .await;
    Ok(Json(ApiResponse::success_msg("success")))
}

/// POST /api/console/departments/{id}/employees
pub async fn assign_employees(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AssignRequest>,
) -> AppResult<Json<ApiResponse<AssignOutcome>>> {
    if let Err(e) = state.ensure_departments().await {
        return Err(surface(&state, e, "分配员工失败"));
    }

    let (target, show_deleted) = {
        let departments = state.departments.read().await;
        let target = departments.get(&id).cloned().ok_or_not_found("部门不存在");
        (target, departments.show_deleted)
    };
    let target = target.map_err(|e| surface(&state, e, "分配员工失败"))?;
    let factory_id = state.current_factory_id().await;

    match assign::reassign(&state.api, &target, show_deleted, factory_id.as_deref(), &req).await {
        Ok(AssignOutcome::Assigned { updated }) => {
            state.notify(NoticeLevel::Success, format!("已调配 {} 名员工", updated));
            refresh_after_change(&state, DepartmentState::invalidate).await;
            Ok(Json(ApiResponse::success(AssignOutcome::Assigned { updated })))
        }
        Ok(outcome) => Ok(Json(ApiResponse::success(outcome))),
        Err(e) => {
            tracing::error!("Failed to assign employees to {}: {}", id, e);
            Err(surface(&state, e, "分配员工失败"))
        }
    }
}

/// GET /api/console/departments/{id}/employees
pub async fn department_employees(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<EmployeesQuery>,
) -> AppResult<Json<ApiResponse<Vec<Employee>>>> {
    let employees = state
        .api
        .department_employees(&id, query.include_sub_departments)
        .await
        .map_err(|e| surface(&state, e, "获取员工列表失败"))?;
    Ok(Json(ApiResponse::success(employees)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::spawn_backend;
    use crate::routes::create_router;
    use crate::state::tests::state_for;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        routing::{get, post},
        Router,
    };
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tower::ServiceExt;

    /// Backend counting tree fetches and assignment calls
    #[derive(Clone, Default)]
    struct Counters {
        fetches: Arc<AtomicUsize>,
        assigns: Arc<AtomicUsize>,
    }

    fn backend(counters: Counters, reject: bool) -> Router {
        let Counters { fetches, assigns } = counters;
        Router::new()
            .route(
                "/api/departments",
                get(move || {
                    let fetches = fetches.clone();
                    async move {
                        fetches.fetch_add(1, Ordering::SeqCst);
                        Json(json!({"departments": [
                            {"id": "d", "name": "裁剪部", "parentId": null},
                            {"id": "g", "name": "一组", "parentId": "d"},
                            {"id": "p", "name": "裁床岗", "parentId": "g"},
                            {"id": "p2", "name": "拉布岗", "parentId": "g"},
                        ]}))
                    }
                }),
            )
            .route(
                "/api/employees",
                get(|| async {
                    Json(json!({"employees": [
                        {"id": "e1", "name": "王芳", "departmentId": "p2"},
                        {"id": "e2", "name": "李强", "departmentId": null},
                    ]}))
                }),
            )
            .route(
                "/api/departments/:id/employees",
                post(move |Json(body): Json<Value>| {
                    let assigns = assigns.clone();
                    async move {
                        assigns.fetch_add(1, Ordering::SeqCst);
                        if reject {
                            return (StatusCode::BAD_REQUEST, Json(json!({"message": "满员"})));
                        }
                        let n = body["employeeIds"].as_array().map(Vec::len).unwrap_or(0);
                        (StatusCode::OK, Json(json!({"success": true, "updated": n})))
                    }
                }),
            )
    }

    async fn logged_in_state(base_url: String, dir: &std::path::Path) -> AppState {
        let state = state_for(base_url, dir);
        state.session.write().await.update(|s| s.set_token("tok")).unwrap();
        let factory = serde_json::from_value(json!({"id": "f1", "name": "一厂"})).unwrap();
        state
            .factories
            .write()
            .await
            .update(|f| f.set_factories(vec![factory]))
            .unwrap();
        state
    }

    async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn assign(target: &str, ids: &[&str], confirmed: bool) -> Request<Body> {
        Request::post(format!("/api/console/departments/{}/employees", target))
            .header("content-type", "application/json")
            .body(Body::from(json!({"employeeIds": ids, "confirmed": confirmed}).to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_transfer_confirmed_then_assigned() {
        let counters = Counters::default();
        let dir = tempfile::tempdir().unwrap();
        let base_url = spawn_backend(backend(counters.clone(), false)).await;
        let state = logged_in_state(base_url, dir.path()).await;
        let app = create_router(state.clone());

        let (status, body) = call(&app, Request::get("/api/console/departments").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["loading"], false);
        assert_eq!(body["data"]["items"][0]["key"], "d");
        assert_eq!(body["data"]["items"][0]["children"][0]["children"][0]["canDrop"], true);

        let (status, body) = call(&app, assign("p", &["e1", "e2"], false)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "confirm");
        assert_eq!(body["data"]["message"], "员工已在其他部门，确认调至「裁床岗」吗？");
        assert_eq!(body["data"]["transfers"].as_array().unwrap().len(), 1);
        assert_eq!(counters.assigns.load(Ordering::SeqCst), 0);

        let mut notices = state.subscribe();
        let (status, body) = call(&app, assign("p", &["e1", "e2"], true)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "assigned");
        assert_eq!(body["data"]["updated"], 2);
        assert_eq!(counters.assigns.load(Ordering::SeqCst), 1);
        assert_eq!(notices.recv().await.unwrap().message, "已调配 2 名员工");
        // one fetch for the view, one after the assignment
        assert_eq!(counters.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_refused_targets() {
        let counters = Counters::default();
        let dir = tempfile::tempdir().unwrap();
        let base_url = spawn_backend(backend(counters.clone(), false)).await;
        let app = create_router(logged_in_state(base_url, dir.path()).await);

        let (status, _) = call(&app, assign("g", &["e2"], true)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = call(&app, assign("99", &["e2"], true)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], false);

        let (status, _) = call(&app, assign("p", &[], true)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        assert_eq!(counters.assigns.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_assignment_keeps_cached_tree() {
        let counters = Counters::default();
        let dir = tempfile::tempdir().unwrap();
        let base_url = spawn_backend(backend(counters.clone(), true)).await;
        let state = logged_in_state(base_url, dir.path()).await;
        let app = create_router(state.clone());

        let (status, body) = call(&app, assign("p", &["e2"], true)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "满员");
        assert_eq!(counters.assigns.load(Ordering::SeqCst), 1);
        assert_eq!(counters.fetches.load(Ordering::SeqCst), 1);

        let departments = state.departments.read().await;
        assert!(departments.is_fresh_for(Some("f1")));
        assert!(departments.get("p").is_some());
    }

    #[tokio::test]
    async fn test_failed_refetch_patches_cached_tree() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let counter = fetches.clone();
        let backend = Router::new()
            .route(
                "/api/departments",
                get(move || {
                    let counter = counter.clone();
                    async move {
                        if counter.fetch_add(1, Ordering::SeqCst) > 0 {
                            return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({})));
                        }
                        (
                            StatusCode::OK,
                            Json(json!({"departments": [
                                {"id": "d", "name": "后整部", "parentId": null},
                                {"id": "g", "name": "包装组", "parentId": "d"},
                            ]})),
                        )
                    }
                }),
            )
            .route(
                "/api/departments/:id",
                axum::routing::delete(|| async { Json(json!({"message": "ok", "cascadeCount": 3})) }),
            );
        let dir = tempfile::tempdir().unwrap();
        let state = logged_in_state(spawn_backend(backend).await, dir.path()).await;
        let app = create_router(state.clone());

        let (status, _) = call(&app, Request::get("/api/console/departments").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = call(&app, Request::delete("/api/console/departments/g").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], 3);
        assert_eq!(fetches.load(Ordering::SeqCst), 2);

        let departments = state.departments.read().await;
        assert!(departments.get("g").unwrap().is_deleted());
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("  裁剪部 ").unwrap(), "裁剪部");
        assert!(matches!(validate_name("   "), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_blank_to_none() {
        assert_eq!(blank_to_none(Some(" ".to_string())), None);
        assert_eq!(blank_to_none(Some("e1".to_string())), Some("e1".to_string()));
        assert_eq!(blank_to_none(None), None);
    }
}
