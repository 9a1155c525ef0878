use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::models::{Church, ChurchEvent, HomeGroup, Person, Worship};
use crate::roles::RoleTree;

/// Consider cache stale after 1 hour.
const CACHE_STALE_MINUTES: i64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }

    pub fn is_stale(&self) -> bool {
        self.age_minutes() > CACHE_STALE_MINUTES
    }
}

pub struct CacheManager {
    cache_dir: PathBuf,
}

impl CacheManager {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir)?;
        Ok(Self { cache_dir })
    }

    fn cache_path(&self, name: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", name))
    }

    fn load<T: DeserializeOwned>(&self, name: &str) -> Result<Option<CachedData<T>>> {
        let path = self.cache_path(name);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache file: {}", name))?;

        let cached: CachedData<T> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache file: {}", name))?;

        Ok(Some(cached))
    }

    fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<()> {
        let cached = CachedData::new(data);
        let path = self.cache_path(name);
        let contents = serde_json::to_string_pretty(&cached)?;
        std::fs::write(&path, contents)?;
        debug!(cache = name, "Saved cache file");
        Ok(())
    }

    // ===== Home Groups =====

    pub fn load_groups(&self) -> Result<Option<CachedData<Vec<HomeGroup>>>> {
        self.load("groups")
    }

    pub fn save_groups(&self, groups: &[HomeGroup]) -> Result<()> {
        self.save("groups", &groups)
    }

    // ===== People =====

    pub fn load_people(&self) -> Result<Option<CachedData<Vec<Person>>>> {
        self.load("people")
    }

    pub fn save_people(&self, people: &[Person]) -> Result<()> {
        self.save("people", &people)
    }

    // ===== Churches =====

    pub fn load_churches(&self) -> Result<Option<CachedData<Vec<Church>>>> {
        self.load("churches")
    }

    pub fn save_churches(&self, churches: &[Church]) -> Result<()> {
        self.save("churches", &churches)
    }

    // ===== Worships =====

    pub fn load_worships(&self) -> Result<Option<CachedData<Vec<Worship>>>> {
        self.load("worships")
    }

    pub fn save_worships(&self, worships: &[Worship]) -> Result<()> {
        self.save("worships", &worships)
    }

    // ===== Events =====

    pub fn load_events(&self) -> Result<Option<CachedData<Vec<ChurchEvent>>>> {
        self.load("events")
    }

    pub fn save_events(&self, events: &[ChurchEvent]) -> Result<()> {
        self.save("events", &events)
    }

    // ===== Role Trees =====

    pub fn load_role_tree(&self, strategy_id: i64) -> Result<Option<CachedData<RoleTree>>> {
        self.load(&format!("roles_{}", strategy_id))
    }

    pub fn save_role_tree(&self, tree: &RoleTree) -> Result<()> {
        self.save(&format!("roles_{}", tree.strategy_id), tree)
    }

    // ===== Cache Age Information =====

    /// Helper to load cache and log errors without failing
    fn load_age<T>(&self, name: &str, loader: impl FnOnce() -> Result<Option<CachedData<T>>>) -> Option<String> {
        match loader() {
            Ok(Some(cached)) => Some(cached.age_display()),
            Ok(None) => None,
            Err(e) => {
                debug!(cache = name, error = %e, "Failed to load cache for age display");
                None
            }
        }
    }

    pub fn get_cache_ages(&self) -> CacheAges {
        CacheAges {
            groups: self.load_age("groups", || self.load_groups()),
            people: self.load_age("people", || self.load_people()),
            churches: self.load_age("churches", || self.load_churches()),
            worships: self.load_age("worships", || self.load_worships()),
            events: self.load_age("events", || self.load_events()),
        }
    }

    /// Helper to check staleness and log errors without failing
    fn is_cache_stale<T>(&self, name: &str, loader: impl FnOnce() -> Result<Option<CachedData<T>>>) -> bool {
        match loader() {
            Ok(Some(cached)) => cached.is_stale(),
            Ok(None) => true,
            Err(e) => {
                debug!(cache = name, error = %e, "Failed to load cache for staleness check");
                true
            }
        }
    }

    /// Check if any of the core cached data is stale
    pub fn any_stale(&self) -> bool {
        let stale_checks = [
            self.is_cache_stale("groups", || self.load_groups()),
            self.is_cache_stale("people", || self.load_people()),
            self.is_cache_stale("events", || self.load_events()),
        ];
        stale_checks.iter().any(|&stale| stale)
    }
}

#[derive(Debug, Default)]
pub struct CacheAges {
    pub groups: Option<String>,
    pub people: Option<String>,
    pub churches: Option<String>,
    pub worships: Option<String>,
    pub events: Option<String>,
}

impl CacheAges {
    /// Labelled rows for display, "never" where nothing is cached
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        let never = || "never".to_string();
        vec![
            ("groups", self.groups.clone().unwrap_or_else(never)),
            ("people", self.people.clone().unwrap_or_else(never)),
            ("churches", self.churches.clone().unwrap_or_else(never)),
            ("worships", self.worships.clone().unwrap_or_else(never)),
            ("events", self.events.clone().unwrap_or_else(never)),
        ]
    }
}

// ============================================================================
// Tests
// ============================================================================
