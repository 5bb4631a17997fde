//! Display form of the department tree
//!
//! Each item carries what the tree widget needs to render a node: headcount
//! badge, deleted flag, whether it is a drop target, the context-menu actions
//! and the hover summary for its level.

use serde::Serialize;

use super::drop::can_accept_drop;
use super::{visible, DepartmentNode, Level, PostedMember};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeAction {
    AddGroup,
    AddPost,
    Edit,
    Delete,
    Restore,
    ForceDelete,
}

/// Context-menu actions for a node.
///
/// Deleted nodes can be restored, and purged by super admins. Live nodes can
/// be edited and deleted, and get a child of the next level unless they are
/// already posts.
pub fn actions(node: &DepartmentNode, is_super_admin: bool) -> Vec<NodeAction> {
    if node.is_deleted() {
        let mut items = vec![NodeAction::Restore];
        if is_super_admin {
            items.push(NodeAction::ForceDelete);
        }
        return items;
    }

    let mut items = Vec::with_capacity(3);
    match node.level {
        Level::Department => items.push(NodeAction::AddGroup),
        Level::Group => items.push(NodeAction::AddPost),
        Level::Post => {}
    }
    items.push(NodeAction::Edit);
    items.push(NodeAction::Delete);
    items
}

/// Hover card content, depending on the node level
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum NodeSummary {
    /// Department: leader and the names of its groups
    Department { leader: Option<String>, groups: Vec<String> },
    /// Group: leader and every member with the post they hold
    Group { leader: Option<String>, members: Vec<PostedMember> },
    /// Post: leader and direct members
    Post { leader: Option<String>, members: Vec<String> },
}

pub fn summary(node: &DepartmentNode) -> NodeSummary {
    let leader = node.department.leader_name().map(str::to_string);
    match node.level {
        Level::Department => NodeSummary::Department {
            leader,
            groups: node.children.iter().map(|c| c.name().to_string()).collect(),
        },
        Level::Group => NodeSummary::Group {
            leader,
            members: node.members_with_post(),
        },
        Level::Post => NodeSummary::Post {
            leader,
            members: node.department.employees.iter().map(|e| e.name.clone()).collect(),
        },
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeItem {
    pub key: String,
    pub title: String,
    pub depth: usize,
    pub level: Level,
    pub headcount: u32,
    pub deleted: bool,
    pub disabled: bool,
    pub is_leaf: bool,
    pub can_drop: bool,
    pub actions: Vec<NodeAction>,
    pub summary: NodeSummary,
    pub children: Vec<TreeItem>,
}

/// Render the visible part of the forest.
pub fn render(forest: &[DepartmentNode], show_deleted: bool, is_super_admin: bool) -> Vec<TreeItem> {
    items(&visible(forest, show_deleted), show_deleted, is_super_admin)
}

fn items(nodes: &[DepartmentNode], show_deleted: bool, is_super_admin: bool) -> Vec<TreeItem> {
    nodes
        .iter()
        .map(|node| {
            let deleted = node.is_deleted();
            TreeItem {
                key: node.id().to_string(),
                title: node.name().to_string(),
                depth: node.depth,
                level: node.level,
                headcount: node.total_headcount(),
                deleted,
                disabled: deleted && !show_deleted,
                is_leaf: node.is_leaf(),
                can_drop: can_accept_drop(node, show_deleted),
                actions: actions(node, is_super_admin),
                summary: summary(node),
                children: items(&node.children, show_deleted, is_super_admin),
            }
        })
        .collect()
}
