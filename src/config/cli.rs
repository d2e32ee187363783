//! CLI argument parsing using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// refselect - multi-annotator reference image selection over shared storage
#[derive(Parser, Debug)]
#[command(name = "refselect")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Source catalog tree (one subdirectory per product, read-only)
    #[arg(long, env = "REFSELECT_SOURCE")]
    pub source: Option<PathBuf>,

    /// Output tree for selection records (shared, writable)
    #[arg(long, env = "REFSELECT_OUTPUT")]
    pub output: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Annotator name recorded on saves (free text)
    #[arg(short = 'a', long, env = "REFSELECT_ANNOTATOR")]
    pub annotator: Option<String>,

    /// Treat incomplete records older than this as abandoned (e.g., 2h, 30m).
    /// Off by default: age alone never proves a session died.
    #[arg(long)]
    pub freshness_window: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show per-product status and completion counts
    Status,

    /// Print the next workable product (advisory; concurrent callers may
    /// be handed the same product)
    Next,

    /// List a product's candidate images and its current record, if any
    Show {
        /// Product id (directory name in the source tree)
        product: String,
    },

    /// Save an in-progress selection for a product (completed stays false)
    Save {
        /// Product id
        product: String,

        /// Image to select, as FILE or FILE:COLOR; repeatable
        #[arg(long = "select", value_name = "FILE[:COLOR]", required = true)]
        selections: Vec<String>,
    },

    /// Save a selection and mark the product completed (terminal)
    Finalize {
        /// Product id
        product: String,

        /// Image to select, as FILE or FILE:COLOR; repeatable
        #[arg(long = "select", value_name = "FILE[:COLOR]", required = true)]
        selections: Vec<String>,
    },

    /// Move or inspect this annotator's catalog cursor
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },

    /// Copy all completed selections into a bundle directory
    Export {
        /// Destination directory for the bundle
        #[arg(long)]
        dest: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum SessionAction {
    /// Advance the cursor (saturates at the last product)
    Next,
    /// Move the cursor back (saturates at the first product)
    Prev,
    /// Jump to an absolute product index
    Jump { index: usize },
    /// Print the current cursor position
    Where,
}

/// Split a `FILE` or `FILE:COLOR` selection argument
pub fn parse_selection(arg: &str) -> (String, Option<String>) {
    match arg.rsplit_once(':') {
        Some((file, color)) if !file.is_empty() && !color.is_empty() => {
            (file.to_string(), Some(color.to_string()))
        }
        _ => (arg.to_string(), None),
    }
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
