//! Utility functions for string formatting and manipulation.

pub mod format;

pub use format::{cmp_ignore_case, format_date, format_phone, truncate};
