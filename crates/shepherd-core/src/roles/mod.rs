//! Role hierarchies for home-group strategies.
//!
//! A strategy's roles form a forest of `RoleStrategyNode`s. `RoleTree` owns
//! that forest and enforces the tree invariant when it is built; `RoleEditor`
//! applies create, edit, delete and assignment operations through the API and
//! mirrors the server's answer locally.

pub mod editor;
pub mod tree;

pub use editor::RoleEditor;
pub use tree::{DeletionImpact, RoleTree, RoleTreeError};
