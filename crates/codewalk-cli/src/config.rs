//! CLI configuration.

use anyhow::{Context, Result};
use codewalk_core::ContextBudget;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    #[serde(default = "default_reserved_for_response")]
    pub reserved_for_response: usize,
    /// Shell command that reads a prompt on stdin and prints an answer.
    #[serde(default)]
    pub explainer: Option<String>,
    #[serde(default = "default_model_id")]
    pub model_id: String,
}

fn default_max_tokens() -> usize {
    ContextBudget::default().max_tokens
}

fn default_reserved_for_response() -> usize {
    ContextBudget::default().reserved_for_response
}

fn default_model_id() -> String {
    "external-command".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            reserved_for_response: default_reserved_for_response(),
            explainer: None,
            model_id: default_model_id(),
        }
    }
}

impl Config {
    /// Load config from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Config =
            toml::from_str(&content).with_context(|| format!("invalid config {}", path.display()))?;
        Ok(config)
    }

    /// Load from `./codewalk.toml`, then the user config directory, or fall
    /// back to defaults.
    pub fn load() -> Result<Self> {
        Self::load_first(&Self::search_paths())
    }

    /// Load the first candidate that exists.
    pub fn load_first(candidates: &[PathBuf]) -> Result<Self> {
        for path in candidates {
            if path.exists() {
                tracing::debug!(target: "codewalk::startup", "Using config {}", path.display());
                return Self::load_from(path);
            }
        }
        Ok(Config::default())
    }

    fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("codewalk.toml")];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("codewalk").join("config.toml"));
        }
        paths
    }

    pub fn budget(&self) -> ContextBudget {
        ContextBudget {
            max_tokens: self.max_tokens,
            reserved_for_response: self.reserved_for_response,
        }
    }
}
