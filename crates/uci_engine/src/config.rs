use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use classical_engine::EngineConfig;
use serde::{Deserialize, Serialize};
use sidecar_engine::SidecarConfig;

/// Everything the front end reads from its TOML file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub sidecar: SidecarConfig,
    /// Opening book in TOML form.
    pub book: Option<PathBuf>,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
