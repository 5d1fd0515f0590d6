// File: ./src/config.rs
use crate::classify::StaticCatalog;
use crate::clock::SystemClock;
use crate::group::BucketMerge;
use crate::section::SectionOptions;
use crate::source::memory::DEFAULT_PAGE_SIZE;
use anyhow::{Context, Result, anyhow};
use chrono_tz::Tz;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const CONFIG_ENV_VAR: &str = "DAYBOOK_CONFIG";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// IANA timezone used for day boundaries.
    pub timezone: String,
    pub page_size: usize,
    pub merge_days: BucketMerge,
    pub overdue: bool,
    /// Default upper bound, in days from today, when none is given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lookahead_days: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_base_url: Option<String>,
    pub module_titles: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            merge_days: BucketMerge::PerPage,
            overdue: false,
            lookahead_days: None,
            icon_base_url: None,
            module_titles: HashMap::new(),
        }
    }
}

impl Config {
    pub fn get_path() -> Option<PathBuf> {
        // Explicit override first (tests, packaging)
        if let Ok(p) = env::var(CONFIG_ENV_VAR)
            && !p.trim().is_empty()
        {
            return Some(PathBuf::from(p));
        }
        ProjectDirs::from("com", "daybook", "daybook").map(|p| p.config_dir().join("config.toml"))
    }

    /// Load the user config, or defaults when there is none yet.
    pub fn load() -> Result<Self> {
        match Self::get_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::get_path().ok_or_else(|| anyhow!("no config directory available"))?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        atomic_write(path, toml_str)
    }

    pub fn validate(&self) -> Result<()> {
        self.tz()?;
        if self.page_size == 0 {
            return Err(anyhow!("page_size must be at least 1"));
        }
        Ok(())
    }

    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .trim()
            .parse::<Tz>()
            .map_err(|e| anyhow!("invalid timezone '{}': {}", self.timezone, e))
    }

    pub fn catalog(&self) -> StaticCatalog {
        StaticCatalog::new(self.icon_base_url.clone(), self.module_titles.clone())
    }

    pub fn section_options(&self) -> Result<SectionOptions> {
        Ok(SectionOptions {
            clock: Arc::new(SystemClock::new(self.tz()?)),
            catalog: Arc::new(self.catalog()),
            merge: self.merge_days,
        })
    }
}

/// Atomic write: Write to .tmp file then rename
pub fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, contents: C) -> Result<()> {
    let path = path.as_ref();
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, contents)?;
    fs::rename(tmp_path, path)?;
    Ok(())
}
