//! Department record as returned by `/departments`

use serde::{Deserialize, Serialize};

use super::{id, normalize_ref, Employee};

/// Leader embedded in a department payload
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Leader {
    #[serde(deserialize_with = "id::required")]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Relation counters some endpoints attach as `_count`
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationCount {
    #[serde(default)]
    pub employees: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    #[serde(deserialize_with = "id::required")]
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default, deserialize_with = "id::optional")]
    pub factory_id: Option<String>,

    /// Raw parent reference, see [`Department::parent`]
    #[serde(default, deserialize_with = "id::optional")]
    pub parent_id: Option<String>,

    #[serde(default, deserialize_with = "id::optional")]
    pub leader_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leader: Option<Leader>,

    /// 1 active, 0 disabled
    #[serde(default = "default_status")]
    pub status: i32,

    /// Soft-delete marker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purged_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_count: Option<u32>,

    #[serde(rename = "_count", default, skip_serializing_if = "Option::is_none")]
    pub count: Option<RelationCount>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub employees: Vec<Employee>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

fn default_status() -> i32 {
    1
}

impl Department {
    /// Parent id with every root-equivalent spelling folded to `None`
    pub fn parent(&self) -> Option<&str> {
        normalize_ref(self.parent_id.as_deref())
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.as_deref().is_some_and(|s| !s.trim().is_empty())
    }

    /// Headcount attached to this record alone, excluding children.
    ///
    /// Prefers the relation counter, then embedded employees, then the flat
    /// `employeeCount` field.
    pub fn direct_headcount(&self) -> u32 {
        if let Some(n) = self.count.as_ref().and_then(|c| c.employees) {
            return n;
        }
        if !self.employees.is_empty() {
            return self.employees.len() as u32;
        }
        self.employee_count.unwrap_or(0)
    }

    pub fn leader_name(&self) -> Option<&str> {
        self.leader.as_ref().map(|l| l.name.as_str()).filter(|n| !n.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loose_ids() {
        let dept: Department = serde_json::from_str(
            r#"{"id": 7, "name": "裁剪车间", "factoryId": "f1", "parentId": 0}"#,
        )
        .unwrap();
        assert_eq!(dept.id, "7");
        assert_eq!(dept.parent_id.as_deref(), Some("0"));
        assert_eq!(dept.parent(), None);
        assert_eq!(dept.status, 1);
        assert!(!dept.is_deleted());
    }

    #[test]
    fn test_string_null_parent() {
        let dept: Department =
            serde_json::from_str(r#"{"id": "a", "name": "A", "parentId": "null"}"#).unwrap();
        assert_eq!(dept.parent(), None);
    }

    #[test]
    fn test_direct_headcount_priority() {
        let dept: Department = serde_json::from_str(
            r#"{"id": "a", "name": "A", "employeeCount": 9,
                "employees": [{"id": "e1", "name": "张三"}],
                "_count": {"employees": 4}}"#,
        )
        .unwrap();
        assert_eq!(dept.direct_headcount(), 4);

        let dept: Department = serde_json::from_str(
            r#"{"id": "a", "name": "A", "employeeCount": 9,
                "employees": [{"id": "e1", "name": "张三"}]}"#,
        )
        .unwrap();
        assert_eq!(dept.direct_headcount(), 1);
    }

    #[test]
    fn test_deleted_marker() {
        let dept: Department = serde_json::from_str(
            r#"{"id": "a", "name": "A", "deletedAt": "2024-05-01T08:00:00.000Z"}"#,
        )
        .unwrap();
        assert!(dept.is_deleted());
    }
}
