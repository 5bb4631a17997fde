//! `/departments` endpoints

use serde::{Deserialize, Serialize};

use super::{ApiClient, NO_QUERY};
use crate::entity::{Department, Employee};
use crate::error::ApiError;

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub factory_id: Option<String>,
    pub include_deleted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDepartment {
    pub name: String,
    pub factory_id: String,
    pub parent_id: Option<String>,
    pub leader_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDepartment {
    pub name: String,
    pub leader_id: Option<String>,
}

/// The list endpoint has shipped several envelopes over time
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DepartmentList {
    Paged { departments: Paged },
    Plain { departments: Vec<Department> },
    Singular { department: Vec<Department> },
}

#[derive(Debug, Deserialize)]
struct Paged {
    items: Vec<Department>,
}

impl From<DepartmentList> for Vec<Department> {
    fn from(list: DepartmentList) -> Self {
        match list {
            DepartmentList::Paged { departments } => departments.items,
            DepartmentList::Plain { departments } => departments,
            DepartmentList::Singular { department } => department,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DepartmentEnvelope {
    department: Department,
}

#[derive(Debug, Deserialize)]
struct EmployeesEnvelope {
    #[serde(default)]
    employees: Vec<Employee>,
}

/// Result of a cascading soft delete
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutcome {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub cascade_count: u32,
}

#[derive(Debug, Deserialize)]
struct AssignResponse {
    #[serde(default)]
    updated: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AssignRequest<'a> {
    employee_ids: &'a [String],
}

impl ApiClient {
    /// GET /departments
    pub async fn list_departments(&self, query: &DepartmentQuery) -> Result<Vec<Department>, ApiError> {
        let list: DepartmentList = self.get("/departments", query).await?;
        Ok(list.into())
    }

    /// GET /departments/{id}
    pub async fn get_department(&self, id: &str) -> Result<Department, ApiError> {
        let envelope: DepartmentEnvelope = self.get(&format!("/departments/{}", id), NO_QUERY).await?;
        Ok(envelope.department)
    }

    /// POST /departments
    pub async fn create_department(&self, params: &CreateDepartment) -> Result<Department, ApiError> {
        let envelope: DepartmentEnvelope = self.post("/departments", params).await?;
        Ok(envelope.department)
    }

    /// PUT /departments/{id}
    pub async fn update_department(&self, id: &str, params: &UpdateDepartment) -> Result<Department, ApiError> {
        let envelope: DepartmentEnvelope = self.put(&format!("/departments/{}", id), params).await?;
        Ok(envelope.department)
    }

    /// DELETE /departments/{id}, soft delete cascading to everything below
    pub async fn delete_department(&self, id: &str) -> Result<DeleteOutcome, ApiError> {
        self.delete(&format!("/departments/{}", id), NO_QUERY).await
    }

    /// POST /departments/{id}/restore
    pub async fn restore_department(&self, id: &str) -> Result<(), ApiError> {
        let _: serde_json::Value = self.post_empty(&format!("/departments/{}/restore", id)).await?;
        Ok(())
    }

    /// DELETE /departments/{id}?force=true, permanent purge
    pub async fn force_delete_department(&self, id: &str) -> Result<(), ApiError> {
        let _: serde_json::Value = self
            .delete(&format!("/departments/{}", id), &[("force", "true")])
            .await?;
        Ok(())
    }

    /// POST /departments/{id}/employees
    pub async fn assign_employees(&self, department_id: &str, employee_ids: &[String]) -> Result<u32, ApiError> {
        let response: AssignResponse = self
            .post(
                &format!("/departments/{}/employees", department_id),
                &AssignRequest { employee_ids },
            )
            .await?;
        Ok(response.updated)
    }

    /// GET /departments/{id}/employees
    pub async fn department_employees(&self, department_id: &str, include_sub_departments: bool) -> Result<Vec<Employee>, ApiError> {
        let query = [("includeSubDepartments", include_sub_departments)];
        let envelope: EmployeesEnvelope = self
            .get(&format!("/departments/{}/employees", department_id), &query)
            .await?;
        Ok(envelope.employees)
    }
}
