//! Core library for Shepherd.
//!
//! Talks to the church-management REST API and keeps the client-side state
//! that the front ends share:
//!
//! - [`api`]: authenticated REST client and error mapping
//! - [`models`]: wire and domain types (people, groups, roles, attendance)
//! - [`roles`]: role-hierarchy trees per strategy and the editor bound to the API
//! - [`attendance`]: optimistic attendance toggling over a paginated query cache
//! - [`groups`]: map-bounds helpers and the bounds debouncer
//! - [`cache`]: on-disk JSON cache for offline use
//! - [`auth`]: persisted sessions and keychain credentials
//! - [`config`]: user configuration and directory layout

pub mod api;
pub mod attendance;
pub mod auth;
pub mod cache;
pub mod config;
pub mod groups;
pub mod models;
pub mod roles;
pub mod utils;

pub use api::{ApiClient, ApiError};
pub use config::Config;
