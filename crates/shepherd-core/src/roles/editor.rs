//! Role tree editing bound to the API.
//!
//! Every mutation goes to the server first; the local tree only changes once
//! the server accepted it, so a failed request leaves the tree untouched.

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::api::ApiClient;
use crate::models::{Person, RoleStrategyNode};

use super::tree::{validate_name, DeletionImpact, RoleTree, RoleTreeError};

pub struct RoleEditor {
    client: ApiClient,
    tree: RoleTree,
}

impl RoleEditor {
    pub fn new(client: ApiClient, tree: RoleTree) -> Self {
        Self { client, tree }
    }

    /// Fetch a strategy's roles and build the tree
    pub async fn load(client: ApiClient, strategy_id: i64) -> Result<Self> {
        let nodes = client
            .fetch_roles(strategy_id)
            .await
            .with_context(|| format!("Failed to fetch roles for strategy {}", strategy_id))?;
        let tree = RoleTree::from_nodes(strategy_id, nodes)?;
        debug!(
            strategy_id,
            roles = tree.total_roles(),
            people = tree.total_people(),
            "Loaded role tree"
        );
        Ok(Self { client, tree })
    }

    pub fn tree(&self) -> &RoleTree {
        &self.tree
    }

    pub fn into_tree(self) -> RoleTree {
        self.tree
    }

    pub fn strategy_id(&self) -> i64 {
        self.tree.strategy_id
    }

    pub async fn create_root(&mut self, name: &str) -> Result<i64> {
        let name = validate_name(name)?;
        let node = self
            .client
            .create_role(self.strategy_id(), name, None)
            .await
            .context("Failed to create role")?;
        let id = node.id;
        self.tree.insert_root(Self::fresh(node))?;
        info!(strategy_id = self.strategy_id(), role_id = id, "Created root role");
        Ok(id)
    }

    pub async fn create_child(&mut self, parent_id: i64, name: &str) -> Result<i64> {
        let name = validate_name(name)?;
        if !self.tree.contains(parent_id) {
            return Err(RoleTreeError::RoleNotFound(parent_id).into());
        }
        let node = self
            .client
            .create_role(self.strategy_id(), name, Some(parent_id))
            .await
            .context("Failed to create role")?;
        let id = node.id;
        self.tree.insert_child(parent_id, Self::fresh(node))?;
        info!(strategy_id = self.strategy_id(), role_id = id, parent_id, "Created sub-role");
        Ok(id)
    }

    pub async fn rename(&mut self, role_id: i64, name: &str) -> Result<()> {
        let name = validate_name(name)?;
        if !self.tree.contains(role_id) {
            return Err(RoleTreeError::RoleNotFound(role_id).into());
        }
        let updated = self
            .client
            .update_role(self.strategy_id(), role_id, name)
            .await
            .context("Failed to update role")?;
        self.tree.rename(role_id, &updated.name)?;
        Ok(())
    }

    /// What deleting `role_id` would remove; show this before calling `delete`.
    pub fn plan_delete(&self, role_id: i64) -> Result<DeletionImpact> {
        Ok(self.tree.deletion_impact(role_id)?)
    }

    pub async fn delete(&mut self, role_id: i64) -> Result<DeletionImpact> {
        let impact = self.plan_delete(role_id)?;
        self.client
            .delete_role(self.strategy_id(), role_id)
            .await
            .context("Failed to delete role")?;
        self.tree.remove(role_id)?;
        info!(
            strategy_id = self.strategy_id(),
            role_id,
            sub_roles = impact.sub_roles,
            people = impact.people,
            "Deleted role"
        );
        Ok(impact)
    }

    /// Returns false when the person already held the role (no request sent).
    pub async fn assign(&mut self, role_id: i64, person: Person) -> Result<bool> {
        let node = self
            .tree
            .find(role_id)
            .ok_or(RoleTreeError::RoleNotFound(role_id))?;
        if node.has_person(person.id) {
            return Ok(false);
        }
        self.client
            .assign_person(self.strategy_id(), role_id, person.id)
            .await
            .context("Failed to assign person")?;
        Ok(self.tree.assign_person(role_id, person)?)
    }

    /// Returns false when the person did not hold the role (no request sent).
    pub async fn unassign(&mut self, role_id: i64, person_id: i64) -> Result<bool> {
        let node = self
            .tree
            .find(role_id)
            .ok_or(RoleTreeError::RoleNotFound(role_id))?;
        if !node.has_person(person_id) {
            return Ok(false);
        }
        self.client
            .remove_person(self.strategy_id(), role_id, person_id)
            .await
            .context("Failed to remove person from role")?;
        Ok(self.tree.unassign_person(role_id, person_id)?)
    }

    /// A created role starts empty regardless of what the server echoed
    fn fresh(mut node: RoleStrategyNode) -> RoleStrategyNode {
        node.children.clear();
        node.people.clear();
        node
    }
}
