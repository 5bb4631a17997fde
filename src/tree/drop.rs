//! Drag-and-drop employee reassignment rules

use serde::Serialize;
use std::collections::HashMap;

use super::{DepartmentNode, POST_DEPTH};
use crate::entity::Employee;

/// Why a node refuses a drop
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DropRefusal {
    Deleted,
    ShowingDeleted,
    NotPost,
}

impl DropRefusal {
    pub fn message(&self) -> &'static str {
        match self {
            DropRefusal::Deleted => "该部门已删除，不能调入员工",
            DropRefusal::ShowingDeleted => "显示已删除时不能调配员工",
            DropRefusal::NotPost => "仅岗位层允许接收调配",
        }
    }
}

/// Check whether `node` may receive dragged employees.
pub fn check_drop(node: &DepartmentNode, show_deleted: bool) -> Result<(), DropRefusal> {
    if node.is_deleted() {
        return Err(DropRefusal::Deleted);
    }
    if show_deleted {
        return Err(DropRefusal::ShowingDeleted);
    }
    if node.depth != POST_DEPTH {
        return Err(DropRefusal::NotPost);
    }
    Ok(())
}

pub fn can_accept_drop(node: &DepartmentNode, show_deleted: bool) -> bool {
    check_drop(node, show_deleted).is_ok()
}

/// An employee leaving another department
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    pub employee_id: String,
    pub employee_name: String,
    pub from_department_id: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ReassignPlan {
    /// Nobody changes department; assign right away
    Commit,
    /// At least one employee is moving across departments
    Confirm {
        target_name: String,
        transfers: Vec<Transfer>,
    },
}

/// Decide whether dropping `employee_ids` onto `target` needs the operator to
/// confirm a cross-department transfer.
///
/// Ids missing from `employees` are not counted as transfers; the backend gets
/// the final say on them.
pub fn plan_reassignment(target: &DepartmentNode, employee_ids: &[String], employees: &[Employee]) -> ReassignPlan {
    let by_id: HashMap<&str, &Employee> = employees.iter().map(|e| (e.id.as_str(), e)).collect();

    let transfers: Vec<Transfer> = employee_ids
        .iter()
        .filter_map(|id| by_id.get(id.as_str()))
        .filter_map(|emp| {
            let from = emp.department()?;
            (from != target.id()).then(|| Transfer {
                employee_id: emp.id.clone(),
                employee_name: emp.name.clone(),
                from_department_id: from.to_string(),
            })
        })
        .collect();

    if transfers.is_empty() {
        ReassignPlan::Commit
    } else {
        ReassignPlan::Confirm {
            target_name: target.name().to_string(),
            transfers,
        }
    }
}

/// Prompt shown before a cross-department transfer
pub fn confirmation_prompt(target_name: &str) -> String {
    let name = if target_name.is_empty() { "该部门" } else { target_name };
    format!("员工已在其他部门，确认调至「{}」吗？", name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::build_forest;
    use crate::tree::tests::dept;

    fn forest() -> Vec<DepartmentNode> {
        let mut deleted_post = dept("p-old", Some("g"));
        deleted_post.deleted_at = Some("2024-03-01T00:00:00Z".to_string());
        build_forest(vec![
            dept("d", None),
            dept("g", Some("d")),
            dept("p", Some("g")),
            deleted_post,
            dept("deep", Some("p")),
        ])
    }

    fn employee(id: &str, department: Option<&str>) -> Employee {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": format!("emp-{id}"),
            "departmentId": department,
        }))
        .unwrap()
    }

    #[test]
    fn test_only_live_posts_accept() {
        let forest = forest();
        let find = |id| crate::tree::find(&forest, id).unwrap();

        assert!(can_accept_drop(find("p"), false));
        assert_eq!(check_drop(find("d"), false), Err(DropRefusal::NotPost));
        assert_eq!(check_drop(find("g"), false), Err(DropRefusal::NotPost));
        assert_eq!(check_drop(find("deep"), false), Err(DropRefusal::NotPost));
        assert_eq!(check_drop(find("p-old"), false), Err(DropRefusal::Deleted));
        assert_eq!(check_drop(find("p"), true), Err(DropRefusal::ShowingDeleted));
    }

    #[test]
    fn test_refused_whatever_else_holds() {
        let forest = forest();
        for node in ["d", "g", "p", "p-old", "deep"] {
            let node = crate::tree::find(&forest, node).unwrap();
            assert!(!can_accept_drop(node, true));
            if node.depth != POST_DEPTH || node.is_deleted() {
                assert!(!can_accept_drop(node, false));
            }
        }
    }

    #[test]
    fn test_transfer_needs_confirmation() {
        let forest = forest();
        let target = crate::tree::find(&forest, "p").unwrap();
        let staff = vec![employee("e1", Some("other-post")), employee("e2", None)];

        let plan = plan_reassignment(target, &["e1".to_string(), "e2".to_string()], &staff);
        match plan {
            ReassignPlan::Confirm { target_name, transfers } => {
                assert_eq!(target_name, "dept-p");
                assert_eq!(transfers.len(), 1);
                assert_eq!(transfers[0].employee_id, "e1");
                assert_eq!(transfers[0].from_department_id, "other-post");
            }
            ReassignPlan::Commit => panic!("expected a confirmation step"),
        }
    }

    #[test]
    fn test_commit_without_transfers() {
        let forest = forest();
        let target = crate::tree::find(&forest, "p").unwrap();
        let staff = vec![
            employee("e1", Some("p")),
            employee("e2", Some("0")),
            employee("e3", Some("null")),
        ];
        let ids: Vec<String> = ["e1", "e2", "e3", "unknown"].iter().map(|s| s.to_string()).collect();
        assert_eq!(plan_reassignment(target, &ids, &staff), ReassignPlan::Commit);
    }

    #[test]
    fn test_prompt_text() {
        assert_eq!(confirmation_prompt("缝纫一岗"), "员工已在其他部门，确认调至「缝纫一岗」吗？");
        assert_eq!(confirmation_prompt(""), "员工已在其他部门，确认调至「该部门」吗？");
    }
}
