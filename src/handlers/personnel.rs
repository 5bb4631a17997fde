//! Employee pool handler
//!
//! Lists the employees that can be dragged onto the department tree.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::EmployeeQuery;
use crate::entity::Employee;
use crate::error::AppResult;
use crate::routes::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolTab {
    #[default]
    All,
    Unassigned,
}

#[derive(Debug, Default, Deserialize)]
pub struct PoolQuery {
    #[serde(default)]
    pub tab: PoolTab,
    #[serde(default)]
    pub keyword: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeePool {
    pub employees: Vec<Employee>,
    pub total: usize,
    pub unassigned_count: usize,
}

/// Filter the fetched list by keyword and count the unassigned
pub fn build_pool(employees: Vec<Employee>, keyword: Option<&str>) -> EmployeePool {
    let total = employees.len();
    let unassigned_count = employees.iter().filter(|e| e.is_unassigned()).count();
    let employees = match keyword {
        Some(kw) => employees.into_iter().filter(|e| e.matches_keyword(kw)).collect(),
        None => employees,
    };
    EmployeePool {
        employees,
        total,
        unassigned_count,
    }
}

/// GET /api/console/employees
pub async fn employee_pool(
    State(state): State<AppState>,
    Query(query): Query<PoolQuery>,
) -> AppResult<Json<ApiResponse<EmployeePool>>> {
    let factory_id = state.current_factory_id().await;
    let mut api_query = EmployeeQuery::for_factory(factory_id.as_deref());
    if query.tab == PoolTab::Unassigned {
        api_query = api_query.only_unassigned();
    }

    let employees = match state.api.list_employees(&api_query).await {
        Ok(e) => e,
        Err(e) => {
            tracing::error!("Failed to fetch employee pool: {}", e);
            let err = e.into();
            state.report(&err, "获取员工列表失败");
            return Err(err);
        }
    };

    let pool = build_pool(employees, query.keyword.as_deref());
    if pool.unassigned_count > 0 {
        tracing::debug!("{} employee(s) without department", pool.unassigned_count);
    }
    Ok(Json(ApiResponse::success(pool)))
}
