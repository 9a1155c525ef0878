//! REST API client module for the church-management backend.
//!
//! This module provides the `ApiClient` for fetching and mutating home
//! groups, role trees, attendance, people, churches, worships and events.
//!
//! The API uses bearer token authentication obtained from `/auth/sign-in`.

pub mod client;
pub mod error;

#[cfg(test)]
pub(crate) mod test_server;

pub use client::ApiClient;
pub use error::{is_unauthorized, ApiError};
