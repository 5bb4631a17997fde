//! `/employees` endpoints

use serde::{Deserialize, Serialize};

use super::{ApiClient, NO_QUERY};
use crate::entity::{Employee, SalaryType};
use crate::error::ApiError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factory_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    /// Sent as `unassigned=1` when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unassigned: Option<String>,
}

impl EmployeeQuery {
    pub fn for_factory(factory_id: Option<&str>) -> Self {
        Self {
            factory_id: factory_id.map(str::to_string),
            ..Default::default()
        }
    }

    pub fn only_unassigned(mut self) -> Self {
        self.unassigned = Some("1".to_string());
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub factory_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hire_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_type: Option<SalaryType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_salary: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub piece_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EmployeesEnvelope {
    #[serde(default)]
    employees: Vec<Employee>,
}

#[derive(Debug, Deserialize)]
struct EmployeeEnvelope {
    employee: Employee,
}

impl ApiClient {
    /// GET /employees
    pub async fn list_employees(&self, query: &EmployeeQuery) -> Result<Vec<Employee>, ApiError> {
        let envelope: EmployeesEnvelope = self.get("/employees", query).await?;
        Ok(envelope.employees)
    }

    /// GET /employees/{id}
    pub async fn get_employee(&self, id: &str) -> Result<Employee, ApiError> {
        let envelope: EmployeeEnvelope = self.get(&format!("/employees/{}", id), NO_QUERY).await?;
        Ok(envelope.employee)
    }

    /// POST /employees
    pub async fn create_employee(&self, params: &EmployeeParams) -> Result<Employee, ApiError> {
        let envelope: EmployeeEnvelope = self.post("/employees", params).await?;
        Ok(envelope.employee)
    }

    /// PUT /employees/{id}, partial update
    pub async fn update_employee(&self, id: &str, params: &EmployeeParams) -> Result<Employee, ApiError> {
        let envelope: EmployeeEnvelope = self.put(&format!("/employees/{}", id), params).await?;
        Ok(envelope.employee)
    }

    /// DELETE /employees/{id}
    pub async fn delete_employee(&self, id: &str) -> Result<(), ApiError> {
        let _: serde_json::Value = self.delete(&format!("/employees/{}", id), NO_QUERY).await?;
        Ok(())
    }
}
