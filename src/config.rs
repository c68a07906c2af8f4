// src/config.rs
//! Application config from `config/patch_sieve.toml`.
//!
//! Every section and field has a default, so an absent file or an empty one
//! yields the built-in behaviour. Environment:
//! - `PATCH_SIEVE_CONFIG_PATH`: alternate config file (must exist)
//! - `PATCH_SIEVE_CACHE_TTL_SECS`: overrides `[catalog].cache_ttl_secs`

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::classify::{ClassifyOptions, KeywordTables};
use crate::extract::ExtractOptions;

pub const DEFAULT_CONFIG_PATH: &str = "config/patch_sieve.toml";
pub const ENV_CONFIG_PATH: &str = "PATCH_SIEVE_CONFIG_PATH";
pub const ENV_CACHE_TTL_SECS: &str = "PATCH_SIEVE_CACHE_TTL_SECS";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub classify: ClassifySection,
    pub catalog: CatalogSection,
    pub source: SourceSection,
    pub keywords: KeywordTables,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifySection {
    pub include_undocumented: bool,
    pub exclude_art_sustainability: bool,
    pub exclude_alpha_or_dated_labels: bool,
    /// Skip records whose label names a game mode at extraction time.
    pub exclude_game_modes: bool,
}

impl Default for ClassifySection {
    fn default() -> Self {
        let o = ClassifyOptions::default();
        Self {
            include_undocumented: o.include_undocumented,
            exclude_art_sustainability: o.exclude_art_sustainability,
            exclude_alpha_or_dated_labels: o.exclude_alpha_or_dated_labels,
            exclude_game_modes: ExtractOptions::default().exclude_game_modes,
        }
    }
}

impl ClassifySection {
    pub fn options(&self) -> ClassifyOptions {
        ClassifyOptions {
            include_undocumented: self.include_undocumented,
            exclude_art_sustainability: self.exclude_art_sustainability,
            exclude_alpha_or_dated_labels: self.exclude_alpha_or_dated_labels,
        }
    }

    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            exclude_game_modes: self.exclude_game_modes,
            exclude_art_sustainability: self.exclude_art_sustainability,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogSection {
    pub cache_ttl_secs: u64,
    pub reference_path: PathBuf,
    /// Table id of the cosmetic item list.
    pub table: String,
    pub top_owners: usize,
}

impl Default for CatalogSection {
    fn default() -> Self {
        Self {
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            reference_path: PathBuf::from("config/catalog.toml"),
            table: "List_of_champion_skins".to_string(),
            top_owners: 10,
        }
    }
}

impl CatalogSection {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SourceSection {
    /// Table id of the patch schedule used for record dates, if any.
    pub patch_schedule: Option<String>,
}

fn parse_ttl_env(raw: Option<String>) -> Option<u64> {
    raw.and_then(|s| s.trim().parse::<u64>().ok())
}

impl AppConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: AppConfig = toml::from_str(s).context("parsing app config")?;
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading app config from {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("in {}", path.display()))
    }

    /// `$PATCH_SIEVE_CONFIG_PATH`, else `config/patch_sieve.toml` if present,
    /// else defaults; then env overrides.
    pub fn load() -> Result<Self> {
        let mut cfg = match std::env::var(ENV_CONFIG_PATH) {
            Ok(p) => {
                let pb = PathBuf::from(&p);
                if !pb.exists() {
                    return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path {p}"));
                }
                Self::load_from(&pb)?
            }
            Err(_) => {
                let pb = PathBuf::from(DEFAULT_CONFIG_PATH);
                if pb.exists() {
                    Self::load_from(&pb)?
                } else {
                    info!(target: "config", "no config file; using defaults");
                    Self::default()
                }
            }
        };
        cfg.apply_env();
        Ok(cfg)
    }

    fn apply_env(&mut self) {
        let raw = std::env::var(ENV_CACHE_TTL_SECS).ok();
        match parse_ttl_env(raw.clone()) {
            Some(ttl) => self.catalog.cache_ttl_secs = ttl,
            None if raw.is_some() => {
                warn!(target: "config", value = ?raw, "ignoring unparseable {ENV_CACHE_TTL_SECS}")
            }
            None => {}
        }
    }
}
