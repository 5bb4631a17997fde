//! Department hierarchy
//!
//! Departments come from the backend as a flat list where each record points
//! at its parent. [`build_forest`] turns that list into nested
//! [`DepartmentNode`]s. Three depth levels are conventional: department (0),
//! group (1) and post (2). Employees are only ever assigned at post level.
//!
//! The builder is tolerant: a parent reference that points nowhere turns the
//! node into a root, and a parent chain that loops is cut at its first member
//! in input order. Every input record appears exactly once in the output.

pub mod drop;
pub mod view;

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::entity::Department;

pub use crate::entity::normalize_ref as normalize_parent_id;

/// Depth of the post level, the only level accepting employees
pub const POST_DEPTH: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Department,
    Group,
    Post,
}

impl Level {
    pub fn from_depth(depth: usize) -> Self {
        match depth {
            0 => Level::Department,
            1 => Level::Group,
            _ => Level::Post,
        }
    }
}

/// A department with its derived children
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentNode {
    #[serde(flatten)]
    pub department: Department,
    pub depth: usize,
    pub level: Level,
    pub children: Vec<DepartmentNode>,
}

/// Employee listed in a group summary together with the post holding them
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostedMember {
    pub id: String,
    pub name: String,
    pub post_name: String,
}

impl DepartmentNode {
    fn new(department: Department, depth: usize) -> Self {
        Self {
            department,
            depth,
            level: Level::from_depth(depth),
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.department.id
    }

    pub fn name(&self) -> &str {
        &self.department.name
    }

    pub fn is_deleted(&self) -> bool {
        self.department.is_deleted()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Headcount of this node and everything below it
    pub fn total_headcount(&self) -> u32 {
        self.department.direct_headcount()
            + self.children.iter().map(DepartmentNode::total_headcount).sum::<u32>()
    }

    /// Every embedded employee of the subtree, tagged with the node holding them
    pub fn members_with_post(&self) -> Vec<PostedMember> {
        let mut members: Vec<PostedMember> = self
            .department
            .employees
            .iter()
            .map(|e| PostedMember {
                id: e.id.clone(),
                name: e.name.clone(),
                post_name: self.department.name.clone(),
            })
            .collect();
        for child in &self.children {
            members.extend(child.members_with_post());
        }
        members
    }
}

/// Build the department forest from a flat list.
///
/// Roots and siblings keep their input order. When an id occurs more than
/// once the first record wins.
pub fn build_forest(list: Vec<Department>) -> Vec<DepartmentNode> {
    let mut slots: Vec<Option<Department>> = Vec::with_capacity(list.len());
    let mut index: HashMap<String, usize> = HashMap::with_capacity(list.len());

    for dept in list {
        if index.contains_key(&dept.id) {
            tracing::warn!("Duplicate department id {} ignored", dept.id);
            continue;
        }
        index.insert(dept.id.clone(), slots.len());
        slots.push(Some(dept));
    }

    let mut parent_of: Vec<Option<usize>> = slots
        .iter()
        .enumerate()
        .map(|(idx, slot)| {
            let dept = slot.as_ref()?;
            let pid = dept.parent()?;
            match index.get(pid) {
                Some(&p) if p != idx => Some(p),
                Some(_) => {
                    tracing::warn!("Department {} is its own parent, treating as root", dept.id);
                    None
                }
                None => {
                    tracing::debug!("Department {} has unknown parent {}, treating as root", dept.id, pid);
                    None
                }
            }
        })
        .collect();

    break_cycles(&mut parent_of, &slots);

    let mut children_of: Vec<Vec<usize>> = vec![Vec::new(); slots.len()];
    let mut roots = Vec::new();
    for (idx, parent) in parent_of.iter().enumerate() {
        match parent {
            Some(p) => children_of[*p].push(idx),
            None => roots.push(idx),
        }
    }

    roots
        .into_iter()
        .filter_map(|idx| assemble(idx, 0, &mut slots, &children_of))
        .collect()
}

/// Cut every loop in the parent graph by promoting the loop member that comes
/// first in input order.
fn break_cycles(parent_of: &mut [Option<usize>], slots: &[Option<Department>]) {
    for start in 0..parent_of.len() {
        let mut seen = HashSet::new();
        let mut cursor = parent_of[start];
        while let Some(node) = cursor {
            if node == start {
                if let Some(dept) = &slots[start] {
                    tracing::warn!("Department {} closes a parent cycle, treating as root", dept.id);
                }
                parent_of[start] = None;
                break;
            }
            // A loop not containing `start`; it is cut when its own first member comes up.
            if !seen.insert(node) {
                break;
            }
            cursor = parent_of[node];
        }
    }
}

fn assemble(
    idx: usize,
    depth: usize,
    slots: &mut [Option<Department>],
    children_of: &[Vec<usize>],
) -> Option<DepartmentNode> {
    let dept = slots[idx].take()?;
    let mut node = DepartmentNode::new(dept, depth);
    node.children = children_of[idx]
        .iter()
        .filter_map(|&child| assemble(child, depth + 1, slots, children_of))
        .collect();
    Some(node)
}

/// Copy of the forest without soft-deleted nodes (and their subtrees),
/// unless `show_deleted` is set.
pub fn visible(forest: &[DepartmentNode], show_deleted: bool) -> Vec<DepartmentNode> {
    forest
        .iter()
        .filter(|node| show_deleted || !node.is_deleted())
        .map(|node| DepartmentNode {
            children: visible(&node.children, show_deleted),
            ..node.clone()
        })
        .collect()
}

pub fn find<'a>(forest: &'a [DepartmentNode], id: &str) -> Option<&'a DepartmentNode> {
    for node in forest {
        if node.id() == id {
            return Some(node);
        }
        if let Some(found) = find(&node.children, id) {
            return Some(found);
        }
    }
    None
}

pub fn find_mut<'a>(forest: &'a mut [DepartmentNode], id: &str) -> Option<&'a mut DepartmentNode> {
    for node in forest {
        if node.id() == id {
            return Some(node);
        }
        if let Some(found) = find_mut(&mut node.children, id) {
            return Some(found);
        }
    }
    None
}

/// Apply `patch` to the department with `id`. Returns whether it was found.
pub fn update<F>(forest: &mut [DepartmentNode], id: &str, patch: F) -> bool
where
    F: FnOnce(&mut Department),
{
    match find_mut(forest, id) {
        Some(node) => {
            patch(&mut node.department);
            true
        }
        None => false,
    }
}

/// Detach the node with `id` together with its subtree
pub fn remove(forest: &mut Vec<DepartmentNode>, id: &str) -> Option<DepartmentNode> {
    if let Some(pos) = forest.iter().position(|n| n.id() == id) {
        return Some(forest.remove(pos));
    }
    forest.iter_mut().find_map(|node| remove(&mut node.children, id))
}

/// Insert a department as the last child of `parent_id`, or as a new root
/// when the parent reference is root-equivalent. Returns false (and drops the
/// record) when the parent is not in the forest.
pub fn insert_under(forest: &mut Vec<DepartmentNode>, department: Department, parent_id: Option<&str>) -> bool {
    let Some(pid) = normalize_parent_id(parent_id) else {
        forest.push(DepartmentNode::new(department, 0));
        return true;
    };
    match find_mut(forest, pid) {
        Some(parent) => {
            let depth = parent.depth + 1;
            parent.children.push(DepartmentNode::new(department, depth));
            true
        }
        None => false,
    }
}
