//! Employee reassignment
//!
//! Dropping employees on a post runs three gates before anything reaches the
//! backend: the target must accept drops, and if any dragged employee already
//! sits in another department the operator has to confirm the transfer. The
//! assignment itself is one best-effort backend call; on failure the cached
//! tree is left as it was.

use serde::{Deserialize, Serialize};

use crate::api::{Directory, EmployeeQuery};
use crate::error::{AppError, AppResult};
use crate::tree::drop::{check_drop, confirmation_prompt, plan_reassignment, ReassignPlan, Transfer};
use crate::tree::DepartmentNode;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    pub employee_ids: Vec<String>,
    /// Operator already confirmed a cross-department transfer
    #[serde(default)]
    pub confirmed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum AssignOutcome {
    /// Nothing was sent; ask the operator and resubmit with `confirmed`
    Confirm { message: String, transfers: Vec<Transfer> },
    Assigned { updated: u32 },
}

/// Run the reassignment of `request.employee_ids` into `target`.
pub async fn reassign(
    directory: &dyn Directory,
    target: &DepartmentNode,
    show_deleted: bool,
    factory_id: Option<&str>,
    request: &AssignRequest,
) -> AppResult<AssignOutcome> {
    if request.employee_ids.is_empty() {
        return Err(AppError::BadRequest("请选择要调配的员工".to_string()));
    }
    check_drop(target, show_deleted).map_err(|refusal| AppError::Forbidden(refusal.message().to_string()))?;

    if !request.confirmed {
        let employees = directory.employees(&EmployeeQuery::for_factory(factory_id)).await?;
        if let ReassignPlan::Confirm { target_name, transfers } =
            plan_reassignment(target, &request.employee_ids, &employees)
        {
            tracing::info!(
                "Reassignment into {} moves {} employee(s) across departments, awaiting confirmation",
                target.id(),
                transfers.len()
            );
            return Ok(AssignOutcome::Confirm {
                message: confirmation_prompt(&target_name),
                transfers,
            });
        }
    }

    let updated = directory.assign_employees(target.id(), &request.employee_ids).await?;
    tracing::info!("Assigned {} employee(s) to department {}", updated, target.id());
    Ok(AssignOutcome::Assigned { updated })
}
