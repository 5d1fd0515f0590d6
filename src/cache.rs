// File: ./src/cache.rs
// Last known section state per query, for offline display.
use crate::config::atomic_write;
use crate::section::{SectionQuery, SectionState};
use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::env;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

pub const CACHE_DIR_ENV_VAR: &str = "DAYBOOK_CACHE_DIR";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CachedSection {
    pub query: SectionQuery,
    /// Epoch seconds when the snapshot was taken.
    pub saved_at: i64,
    pub state: SectionState,
}

pub struct Cache;

impl Cache {
    fn cache_dir() -> Option<PathBuf> {
        // ISOLATION: Check env var first
        let dir = if let Ok(dir) = env::var(CACHE_DIR_ENV_VAR) {
            PathBuf::from(dir)
        } else {
            ProjectDirs::from("com", "daybook", "daybook")?
                .cache_dir()
                .to_path_buf()
        };
        if !dir.exists() {
            let _ = fs::create_dir_all(&dir);
        }
        Some(dir)
    }

    fn get_path(query: &SectionQuery) -> Option<PathBuf> {
        let mut hasher = DefaultHasher::new();
        query.search.hash(&mut hasher);
        query.overdue.hash(&mut hasher);
        query.range.from.hash(&mut hasher);
        query.range.to.hash(&mut hasher);
        query.course.hash(&mut hasher);
        let filename = format!("section_{:x}.json", hasher.finish());
        Self::cache_dir().map(|d| d.join(filename))
    }

    pub fn save(entry: &CachedSection) -> Result<()> {
        if let Some(path) = Self::get_path(&entry.query) {
            let mut entry = entry.clone();
            // A cached snapshot is never mid-fetch.
            entry.state.loading_more = false;
            let json = serde_json::to_string_pretty(&entry)?;
            atomic_write(path, json)?;
        }
        Ok(())
    }

    pub fn load(query: &SectionQuery) -> Result<Option<CachedSection>> {
        if let Some(path) = Self::get_path(query)
            && path.exists()
        {
            let json = fs::read_to_string(path)?;
            let entry: CachedSection = serde_json::from_str(&json)?;
            // Hash collisions are possible; only return an exact match.
            if entry.query == *query {
                return Ok(Some(entry));
            }
        }
        Ok(None)
    }
}
