use serde::{Deserialize, Serialize};

use super::Person;

/// A named template defining a role hierarchy reusable across home groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Strategy {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// One role in a strategy's hierarchy, with its sub-roles and assigned people.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct RoleStrategyNode {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub parent_role_id: Option<i64>,
    #[serde(default)]
    pub children: Vec<RoleStrategyNode>,
    #[serde(default)]
    pub people: Vec<Person>,
}

impl RoleStrategyNode {
    pub fn new(id: i64, name: impl Into<String>, parent_role_id: Option<i64>) -> Self {
        Self {
            id,
            name: name.into(),
            parent_role_id,
            children: Vec::new(),
            people: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_role_id.is_none()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// People assigned to this role and every role below it.
    pub fn count_people_in_tree(&self) -> usize {
        self.people.len()
            + self
                .children
                .iter()
                .map(RoleStrategyNode::count_people_in_tree)
                .sum::<usize>()
    }

    /// Number of roles below this one, at any depth.
    pub fn count_sub_roles(&self) -> usize {
        self.children.len()
            + self
                .children
                .iter()
                .map(RoleStrategyNode::count_sub_roles)
                .sum::<usize>()
    }

    pub fn has_person(&self, person_id: i64) -> bool {
        self.people.iter().any(|p| p.id == person_id)
    }

    pub fn find(&self, role_id: i64) -> Option<&RoleStrategyNode> {
        if self.id == role_id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(role_id))
    }

    pub fn find_mut(&mut self, role_id: i64) -> Option<&mut RoleStrategyNode> {
        if self.id == role_id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(role_id))
    }

    /// Detach the descendant with `role_id` from this subtree.
    /// Does not match `self`; the caller owns the root.
    pub fn remove_descendant(&mut self, role_id: i64) -> Option<RoleStrategyNode> {
        if let Some(pos) = self.children.iter().position(|c| c.id == role_id) {
            return Some(self.children.remove(pos));
        }
        self.children
            .iter_mut()
            .find_map(|c| c.remove_descendant(role_id))
    }

    /// Depth-first pre-order visit with depth (0 for `self`).
    pub fn walk<'a>(&'a self, depth: usize, visit: &mut impl FnMut(&'a RoleStrategyNode, usize)) {
        visit(self, depth);
        for child in &self.children {
            child.walk(depth + 1, visit);
        }
    }
}
