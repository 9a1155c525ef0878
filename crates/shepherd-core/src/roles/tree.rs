use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::models::{Person, RoleStrategyNode};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RoleTreeError {
    #[error("Role {0} not found")]
    RoleNotFound(i64),

    #[error("Role {0} already exists in this strategy")]
    DuplicateRole(i64),

    #[error("Role name cannot be empty")]
    EmptyName,

    #[error("Roles {0:?} form a parent cycle")]
    Cycle(Vec<i64>),
}

/// What a cascading delete would take with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionImpact {
    pub role_id: i64,
    pub role_name: String,
    /// Descendant roles removed along with the role
    pub sub_roles: usize,
    /// People assigned anywhere in the removed subtree
    pub people: usize,
}

impl DeletionImpact {
    fn of(node: &RoleStrategyNode) -> Self {
        Self {
            role_id: node.id,
            role_name: node.name.clone(),
            sub_roles: node.count_sub_roles(),
            people: node.count_people_in_tree(),
        }
    }

    pub fn is_cascading(&self) -> bool {
        self.sub_roles > 0 || self.people > 0
    }

    pub fn warning(&self) -> String {
        if !self.is_cascading() {
            return format!("Delete \"{}\"?", self.role_name);
        }
        format!(
            "Deleting \"{}\" also removes {} and unassigns {}.",
            self.role_name,
            plural(self.sub_roles, "sub-role", "sub-roles"),
            plural(self.people, "person", "people"),
        )
    }
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("1 {}", one)
    } else {
        format!("{} {}", n, many)
    }
}

/// The role forest of one strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleTree {
    pub strategy_id: i64,
    pub roots: Vec<RoleStrategyNode>,
}

impl RoleTree {
    pub fn empty(strategy_id: i64) -> Self {
        Self {
            strategy_id,
            roots: Vec::new(),
        }
    }

    /// Build a tree from server nodes, nested or flat.
    ///
    /// Nesting wins over `parent_role_id` when both are present. A node whose
    /// parent is unknown becomes a root. Nodes caught in a parent cycle are
    /// rejected since they can never hang from a root.
    pub fn from_nodes(strategy_id: i64, nodes: Vec<RoleStrategyNode>) -> Result<Self, RoleTreeError> {
        let mut flat: Vec<RoleStrategyNode> = Vec::new();
        for node in nodes {
            flatten_into(node, None, &mut flat);
        }

        let mut by_id: HashMap<i64, RoleStrategyNode> = HashMap::with_capacity(flat.len());
        let mut order: Vec<i64> = Vec::with_capacity(flat.len());
        for node in flat {
            if by_id.contains_key(&node.id) {
                return Err(RoleTreeError::DuplicateRole(node.id));
            }
            order.push(node.id);
            by_id.insert(node.id, node);
        }

        let mut children_of: HashMap<i64, Vec<i64>> = HashMap::new();
        let mut root_ids = Vec::new();
        for id in &order {
            let node = &by_id[id];
            match node.parent_role_id {
                Some(parent) if by_id.contains_key(&parent) => {
                    children_of.entry(parent).or_default().push(*id)
                }
                Some(parent) => {
                    warn!(role_id = id, parent_id = parent, "Role parent missing, treating as root");
                    root_ids.push(*id);
                }
                None => root_ids.push(*id),
            }
        }

        let mut roots = Vec::with_capacity(root_ids.len());
        for id in root_ids {
            if let Some(mut root) = assemble(id, &mut by_id, &children_of) {
                root.parent_role_id = None;
                roots.push(root);
            }
        }

        if !by_id.is_empty() {
            let mut stuck: Vec<i64> = by_id.into_keys().collect();
            stuck.sort_unstable();
            return Err(RoleTreeError::Cycle(stuck));
        }

        Ok(Self { strategy_id, roots })
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn find(&self, role_id: i64) -> Option<&RoleStrategyNode> {
        self.roots.iter().find_map(|r| r.find(role_id))
    }

    pub fn find_mut(&mut self, role_id: i64) -> Option<&mut RoleStrategyNode> {
        self.roots.iter_mut().find_map(|r| r.find_mut(role_id))
    }

    pub fn contains(&self, role_id: i64) -> bool {
        self.find(role_id).is_some()
    }

    pub fn total_roles(&self) -> usize {
        self.roots.len() + self.roots.iter().map(|r| r.count_sub_roles()).sum::<usize>()
    }

    /// Assignments across the whole strategy. A person holding two roles counts twice.
    pub fn total_people(&self) -> usize {
        self.roots.iter().map(|r| r.count_people_in_tree()).sum()
    }

    pub fn insert_root(&mut self, mut node: RoleStrategyNode) -> Result<(), RoleTreeError> {
        self.check_new_ids(&node)?;
        node.parent_role_id = None;
        self.roots.push(node);
        Ok(())
    }

    pub fn insert_child(&mut self, parent_id: i64, mut node: RoleStrategyNode) -> Result<(), RoleTreeError> {
        self.check_new_ids(&node)?;
        let parent = self
            .find_mut(parent_id)
            .ok_or(RoleTreeError::RoleNotFound(parent_id))?;
        node.parent_role_id = Some(parent_id);
        parent.children.push(node);
        Ok(())
    }

    pub fn rename(&mut self, role_id: i64, name: &str) -> Result<(), RoleTreeError> {
        let name = validate_name(name)?;
        let node = self
            .find_mut(role_id)
            .ok_or(RoleTreeError::RoleNotFound(role_id))?;
        node.name = name.to_string();
        Ok(())
    }

    /// Counts used to warn before a cascading delete.
    pub fn deletion_impact(&self, role_id: i64) -> Result<DeletionImpact, RoleTreeError> {
        self.find(role_id)
            .map(DeletionImpact::of)
            .ok_or(RoleTreeError::RoleNotFound(role_id))
    }

    /// Remove a role and everything below it, returning the detached subtree.
    pub fn remove(&mut self, role_id: i64) -> Result<RoleStrategyNode, RoleTreeError> {
        if let Some(pos) = self.roots.iter().position(|r| r.id == role_id) {
            return Ok(self.roots.remove(pos));
        }
        self.roots
            .iter_mut()
            .find_map(|r| r.remove_descendant(role_id))
            .ok_or(RoleTreeError::RoleNotFound(role_id))
    }

    /// Assign a person to a role. Returns false if they already hold it.
    pub fn assign_person(&mut self, role_id: i64, person: Person) -> Result<bool, RoleTreeError> {
        let node = self
            .find_mut(role_id)
            .ok_or(RoleTreeError::RoleNotFound(role_id))?;
        if node.has_person(person.id) {
            return Ok(false);
        }
        node.people.push(person);
        Ok(true)
    }

    /// Remove a person from a role. Returns false if they did not hold it.
    pub fn unassign_person(&mut self, role_id: i64, person_id: i64) -> Result<bool, RoleTreeError> {
        let node = self
            .find_mut(role_id)
            .ok_or(RoleTreeError::RoleNotFound(role_id))?;
        let before = node.people.len();
        node.people.retain(|p| p.id != person_id);
        Ok(node.people.len() != before)
    }

    /// Roles a person is assigned to, in pre-order.
    pub fn roles_of_person(&self, person_id: i64) -> Vec<&RoleStrategyNode> {
        let mut found = Vec::new();
        self.walk(|node, _| {
            if node.has_person(person_id) {
                found.push(node);
            }
        });
        found
    }

    /// Depth-first pre-order visit of every role with its depth.
    pub fn walk<'a>(&'a self, mut visit: impl FnMut(&'a RoleStrategyNode, usize)) {
        for root in &self.roots {
            root.walk(0, &mut visit);
        }
    }

    fn check_new_ids(&self, node: &RoleStrategyNode) -> Result<(), RoleTreeError> {
        let mut seen = HashSet::new();
        let mut result = Ok(());
        node.walk(0, &mut |n, _| {
            if result.is_ok() && (!seen.insert(n.id) || self.contains(n.id)) {
                result = Err(RoleTreeError::DuplicateRole(n.id));
            }
        });
        result
    }
}

pub(crate) fn validate_name(name: &str) -> Result<&str, RoleTreeError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        Err(RoleTreeError::EmptyName)
    } else {
        Ok(trimmed)
    }
}

/// Detach children recursively; nested placement overrides `parent_role_id`.
fn flatten_into(mut node: RoleStrategyNode, nested_parent: Option<i64>, out: &mut Vec<RoleStrategyNode>) {
    if nested_parent.is_some() {
        node.parent_role_id = nested_parent;
    }
    let children = std::mem::take(&mut node.children);
    let id = node.id;
    out.push(node);
    for child in children {
        flatten_into(child, Some(id), out);
    }
}

fn assemble(
    id: i64,
    by_id: &mut HashMap<i64, RoleStrategyNode>,
    children_of: &HashMap<i64, Vec<i64>>,
) -> Option<RoleStrategyNode> {
    let mut node = by_id.remove(&id)?;
    if let Some(child_ids) = children_of.get(&id) {
        for child_id in child_ids {
            if let Some(child) = assemble(*child_id, by_id, children_of) {
                node.children.push(child);
            }
        }
    }
    Some(node)
}
