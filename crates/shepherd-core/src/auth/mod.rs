//! Authentication module for managing user sessions and credentials.
//!
//! This module provides:
//! - `Session`: Token-based session management with expiry, persisted to disk
//! - `CredentialStore`: Secure OS-level credential storage via keyring
//!
//! A 401 from the API clears the session so the user signs in again.

pub mod credentials;
pub mod session;

pub use credentials::CredentialStore;
pub use session::{Session, SessionData};
