//! TOML configuration file parsing

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Settings accepted from a TOML config file.
///
/// Everything is optional; CLI flags override these, and these override
/// built-in defaults.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct FileConfig {
    /// Source catalog tree
    pub source_dir: Option<PathBuf>,

    /// Output tree for selection records
    pub output_dir: Option<PathBuf>,

    /// Annotator name
    pub annotator: Option<String>,

    /// Freshness window in seconds for reclaiming stale incomplete records
    pub freshness_window_secs: Option<u64>,

    /// Closed color vocabulary; when present, saves reject tags outside it.
    /// When absent, color tags are free text.
    pub colors: Option<Vec<String>>,
}

/// Parse a TOML configuration file
pub fn parse_toml_file(path: &Path) -> Result<FileConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_toml_string(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse TOML configuration from string
pub fn parse_toml_string(contents: &str) -> Result<FileConfig> {
    let config: FileConfig =
        ::toml::from_str(contents).context("Failed to parse TOML configuration")?;

    Ok(config)
}
