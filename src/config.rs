use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::foreign_str::MAX_NAME_SCAN;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub version: u32,
    pub out_dir: PathBuf,
    /// How many material-instance parents are followed from one material.
    pub max_parent_depth: usize,
    pub name_scan_limit: usize,
    pub write_props: bool,
    pub write_texture_payloads: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            version: 1,
            out_dir: PathBuf::from("exported"),
            max_parent_depth: 16,
            name_scan_limit: MAX_NAME_SCAN,
            write_props: true,
            write_texture_payloads: true,
        }
    }
}

pub fn default_config_path() -> PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".config/matexport/config.json");
    }
    PathBuf::from("matexport.json")
}

pub fn load_config(path: &Path) -> Result<ExportConfig> {
    if !path.is_file() {
        log::debug!("no config at {}, using defaults", path.display());
        return Ok(ExportConfig::default());
    }
    let raw = fs::read(path).with_context(|| format!("Failed reading {}", path.display()))?;
    let cfg: ExportConfig = serde_json::from_slice(&raw)
        .with_context(|| format!("Invalid JSON in {}", path.display()))?;
    Ok(cfg)
}

pub fn save_config(path: &Path, cfg: &ExportConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed creating {}", parent.display()))?;
    }
    fs::write(path, serde_json::to_vec_pretty(cfg)?)
        .with_context(|| format!("Failed writing {}", path.display()))?;
    Ok(())
}
