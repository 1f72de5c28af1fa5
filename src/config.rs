use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::engine::selection::SelectionMode;
use crate::engine::stats::DEFAULT_HARDEST_LIMIT;

const MAX_HARDEST_LIMIT: usize = 50;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_hardest_limit")]
    pub hardest_limit: usize,
    #[serde(default = "default_start_in_mistakes_mode")]
    pub start_in_mistakes_mode: bool,
    /// Fixed seed for question selection. Unset means a fresh seed every run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

fn default_data_dir() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("quizdeck")
        .to_string_lossy()
        .to_string()
}
fn default_hardest_limit() -> usize {
    DEFAULT_HARDEST_LIMIT
}
fn default_start_in_mistakes_mode() -> bool {
    false
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            hardest_limit: default_hardest_limit(),
            start_in_mistakes_mode: default_start_in_mistakes_mode(),
            seed: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            let mut config: Config = toml::from_str(&content)
                .with_context(|| format!("parsing config {}", path.display()))?;
            config.validate();
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("quizdeck")
            .join("config.toml")
    }

    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    pub fn initial_mode(&self) -> SelectionMode {
        if self.start_in_mistakes_mode {
            SelectionMode::MistakesOnly
        } else {
            SelectionMode::Normal
        }
    }

    /// Clamp out-of-range values left by hand edits or older versions.
    pub fn validate(&mut self) {
        self.hardest_limit = self.hardest_limit.clamp(1, MAX_HARDEST_LIMIT);
        if self.data_dir.trim().is_empty() {
            self.data_dir = default_data_dir();
        }
    }
}
