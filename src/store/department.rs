//! Cached department tree of the current factory

use chrono::{DateTime, Utc};

use crate::entity::Department;
use crate::tree::{self, DepartmentNode};

#[derive(Debug, Default)]
pub struct DepartmentState {
    pub departments: Vec<DepartmentNode>,
    pub show_deleted: bool,
    pub loading: bool,
    /// Factory the cached tree was fetched for
    pub factory_id: Option<String>,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl DepartmentState {
    /// Rebuild the tree from a fresh fetch
    pub fn replace(&mut self, factory_id: Option<String>, list: Vec<Department>) {
        self.departments = tree::build_forest(list);
        self.factory_id = factory_id;
        self.fetched_at = Some(Utc::now());
    }

    /// Whether the cache holds a tree for `factory_id` in the current view mode
    pub fn is_fresh_for(&self, factory_id: Option<&str>) -> bool {
        self.fetched_at.is_some() && self.factory_id.as_deref() == factory_id
    }

    pub fn invalidate(&mut self) {
        self.fetched_at = None;
    }

    pub fn get(&self, id: &str) -> Option<&DepartmentNode> {
        tree::find(&self.departments, id)
    }

    pub fn update<F>(&mut self, id: &str, patch: F) -> bool
    where
        F: FnOnce(&mut Department),
    {
        tree::update(&mut self.departments, id, patch)
    }

    pub fn remove(&mut self, id: &str) -> Option<DepartmentNode> {
        tree::remove(&mut self.departments, id)
    }

    pub fn add(&mut self, department: Department, parent_id: Option<&str>) -> bool {
        tree::insert_under(&mut self.departments, department, parent_id)
    }

    /// Headcount of a department including its sub-departments, 0 if unknown
    pub fn department_count(&self, id: &str) -> u32 {
        self.get(id).map(DepartmentNode::total_headcount).unwrap_or(0)
    }
}
