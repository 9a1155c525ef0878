//! Home-group location helpers.
//!
//! - `GeoBounds`: the visible map area used to query nearby groups
//! - `Debouncer`: coalesces rapid viewport changes into one query

pub mod bounds;
pub mod debounce;

pub use bounds::GeoBounds;
pub use debounce::{Debouncer, MAP_BOUNDS_DEBOUNCE};
