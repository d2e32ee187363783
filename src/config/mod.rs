//! Configuration module
//!
//! Handles CLI argument parsing, TOML configuration files, and the merged
//! runtime configuration. Precedence: CLI flags over config file over
//! built-in defaults.

pub mod cli;
pub mod toml;

use anyhow::{bail, Context, Result};
use cli::Cli;
use std::path::PathBuf;
use std::time::Duration;
use toml::FileConfig;

/// Default source tree, matching the layout this tool is pointed at in the
/// common deployment (a shared folder next to the binary)
pub const DEFAULT_SOURCE_DIR: &str = "output";

/// Default output tree for selection records
pub const DEFAULT_OUTPUT_DIR: &str = "selected_reference_images";

/// Merged runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Source catalog tree (read-only)
    pub source_dir: PathBuf,

    /// Output tree for selection records (shared, writable)
    pub output_dir: PathBuf,

    /// Annotator identity; required by saving and session commands,
    /// optional for read-only ones
    pub annotator: Option<String>,

    /// Reclaim incomplete records older than this; off by default
    pub freshness_window: Option<Duration>,

    /// Closed color vocabulary, if configured
    pub colors: Option<Vec<String>>,
}

impl Config {
    /// Resolve the runtime configuration from CLI arguments and the
    /// optional config file.
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => toml::parse_toml_file(path)?,
            None => FileConfig::default(),
        };

        let freshness_window = match &cli.freshness_window {
            Some(s) => Some(Duration::from_secs(parse_duration_secs(s)?)),
            None => file.freshness_window_secs.map(Duration::from_secs),
        };

        Ok(Self {
            source_dir: cli
                .source
                .clone()
                .or(file.source_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SOURCE_DIR)),
            output_dir: cli
                .output
                .clone()
                .or(file.output_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            annotator: cli.annotator.clone().or(file.annotator),
            freshness_window,
            colors: file.colors,
        })
    }

    /// Annotator name, or an error telling the operator how to supply one
    pub fn require_annotator(&self) -> Result<&str> {
        self.annotator
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .context("annotator name required: pass --annotator, set REFSELECT_ANNOTATOR, or add it to the config file")
    }

    /// Validate a color tag against the closed vocabulary, when one is
    /// configured. With no vocabulary, any tag passes (free text).
    pub fn validate_color(&self, color: &str) -> Result<()> {
        if let Some(colors) = &self.colors {
            if !colors.iter().any(|c| c == color) {
                bail!(
                    "color {:?} is not in the configured vocabulary ({})",
                    color,
                    colors.join(", ")
                );
            }
        }
        Ok(())
    }
}

/// Parse a duration string (e.g., "60s", "5m", "2h") to seconds
pub fn parse_duration_secs(s: &str) -> Result<u64> {
    let s = s.trim().to_lowercase();

    let (num_str, multiplier) = if s.ends_with("s") || s.ends_with("sec") {
        (s.trim_end_matches("sec").trim_end_matches("s"), 1u64)
    } else if s.ends_with("m") || s.ends_with("min") {
        (s.trim_end_matches("min").trim_end_matches("m"), 60)
    } else if s.ends_with("h") || s.ends_with("hr") {
        (s.trim_end_matches("hr").trim_end_matches("h"), 3600)
    } else if s.ends_with("d") {
        (s.trim_end_matches("d"), 86400)
    } else {
        (s.as_str(), 1)
    };

    let num: u64 = num_str
        .parse()
        .with_context(|| format!("Invalid duration format: {}", s))?;

    Ok(num * multiplier)
}
