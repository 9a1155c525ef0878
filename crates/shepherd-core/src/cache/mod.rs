//! Local caching module for offline data access.
//!
//! This module provides the `CacheManager` for storing and retrieving
//! fetched data locally. Data is cached in JSON format and considered
//! stale after 60 minutes.
//!
//! Cached data types include:
//! - Home groups and people
//! - Churches, worships and events
//! - Role trees per strategy

pub mod manager;

pub use manager::{CacheAges, CacheManager, CachedData};
