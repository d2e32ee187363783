//! Durable per-product selection records
//!
//! One `selection.json` per product lives under the shared output tree.
//! Every write goes through a temp-file-then-rename replace so a reader on
//! another machine observes either the fully-old or fully-new record, and a
//! crash mid-write never corrupts a committed one. The store is the only
//! writer of records; everything else reads.
//!
//! # Record file layout
//!
//! ```text
//! <output>/<product_id>/selection.json
//! <output>/<product_id>/.selection.json.tmp   (transient)
//! ```

use crate::error::{Result, SelectError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Canonical record file name inside a product's output directory
pub const RECORD_FILENAME: &str = "selection.json";

/// Transient file written before the atomic rename
pub const RECORD_TMP_FILENAME: &str = ".selection.json.tmp";

/// Default color tag for selections without one
pub const UNKNOWN_COLOR: &str = "unknown";

/// One selected image inside a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedImage {
    /// File name of the image in the product's catalog directory
    pub original_file: String,

    /// Rank-and-tag encoded name assigned at finalize/export time
    /// (`ref_<n>_<color>.<ext>`), kept for auditability
    #[serde(default)]
    pub saved_file: Option<String>,

    /// Color tag; free text, `"unknown"` when the annotator picked none
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_color() -> String {
    UNKNOWN_COLOR.to_string()
}

impl SelectedImage {
    pub fn new(original_file: impl Into<String>, color: Option<String>) -> Self {
        Self {
            original_file: original_file.into(),
            saved_file: None,
            color: color.unwrap_or_else(default_color),
        }
    }
}

/// Durable per-product selection decision, the unit of coordination.
///
/// A record exists iff work has been saved at least once for the product.
/// `completed` only ever transitions false to true; the store rejects a
/// save that would clear it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionRecord {
    /// Product identifier (key, unique)
    pub product_id: String,

    /// Selected images with their color tags
    #[serde(default)]
    pub selected_images: Vec<SelectedImage>,

    /// True once the annotator explicitly finalized the product
    #[serde(default)]
    pub completed: bool,

    /// Identity of the last writer; advisory, for display and audit only
    #[serde(default)]
    pub annotator: String,

    /// Timestamp of the last write
    pub updated_at: DateTime<Utc>,
}

impl SelectionRecord {
    pub fn new(product_id: impl Into<String>, annotator: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            selected_images: Vec::new(),
            completed: false,
            annotator: annotator.into(),
            updated_at: Utc::now(),
        }
    }
}

/// Store for selection records under the shared output tree
#[derive(Debug, Clone)]
pub struct RecordStore {
    output_root: PathBuf,
}

impl RecordStore {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
        }
    }

    /// Root of the output tree
    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Canonical record path for a product
    pub fn record_path(&self, product_id: &str) -> PathBuf {
        self.output_root.join(product_id).join(RECORD_FILENAME)
    }

    /// Load the record for a product.
    ///
    /// A missing record is `Ok(None)` ("untouched"), never an error. An
    /// unparseable record file is a storage error: a corrupt store must be
    /// surfaced, not mistaken for untouched work.
    pub fn load(&self, product_id: &str) -> Result<Option<SelectionRecord>> {
        let path = self.record_path(product_id);

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SelectError::persist(&path, e)),
        };

        let record: SelectionRecord =
            serde_json::from_str(&content).map_err(|e| SelectError::persist(&path, e))?;

        Ok(Some(record))
    }

    /// Persist a record, stamping `updated_at`.
    ///
    /// Atomic with respect to readers: serializes to a temp file in the
    /// product's directory and renames it over the canonical path in one
    /// step. Refuses to overwrite a committed `completed = true` record
    /// with a non-completed one (completion is monotonic; there is no
    /// re-open action in this design).
    pub fn save(&self, record: &mut SelectionRecord) -> Result<()> {
        let dir = self.output_root.join(&record.product_id);
        let path = dir.join(RECORD_FILENAME);

        if !record.completed {
            if let Some(existing) = self.load(&record.product_id)? {
                if existing.completed {
                    return Err(SelectError::Persist {
                        path,
                        message: format!(
                            "product {} is already completed (by {}); refusing to clear the flag",
                            record.product_id, existing.annotator
                        ),
                    });
                }
            }
        }

        record.updated_at = Utc::now();

        fs::create_dir_all(&dir).map_err(|e| SelectError::persist(&dir, e))?;

        let json = serde_json::to_string_pretty(record)
            .map_err(|e| SelectError::persist(&path, e))?;

        let tmp_path = dir.join(RECORD_TMP_FILENAME);
        fs::write(&tmp_path, json).map_err(|e| SelectError::persist(&tmp_path, e))?;
        fs::rename(&tmp_path, &path).map_err(|e| SelectError::persist(&path, e))?;

        tracing::debug!(
            product = %record.product_id,
            completed = record.completed,
            images = record.selected_images.len(),
            "record saved"
        );

        Ok(())
    }

    /// Product ids of all records with `completed = true`.
    ///
    /// Re-reads shared storage on every call; status must reflect what
    /// other annotators have committed since the last look.
    pub fn list_completed(&self) -> Result<BTreeSet<String>> {
        let mut completed = BTreeSet::new();
        for record in self.list_records()? {
            if record.completed {
                completed.insert(record.product_id);
            }
        }
        Ok(completed)
    }

    /// All records currently visible in the output tree
    pub fn list_records(&self) -> Result<Vec<SelectionRecord>> {
        let entries = match fs::read_dir(&self.output_root) {
            Ok(entries) => entries,
            // No output tree yet means no work saved yet
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(SelectError::persist(&self.output_root, e)),
        };

        let mut records = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| SelectError::persist(&self.output_root, e))?;
            if !entry.path().is_dir() {
                continue;
            }
            let product_id = entry.file_name().to_string_lossy().into_owned();
            if let Some(record) = self.load(&product_id)? {
                records.push(record);
            }
        }
        Ok(records)
    }
}

/// Serialize a value to JSON at `path` via temp-file-then-rename.
///
/// Same replace protocol as record saves; used for the per-annotator
/// session cursor files.
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| SelectError::persist(path, "path has no parent directory"))?;
    fs::create_dir_all(dir).map_err(|e| SelectError::persist(dir, e))?;

    let json = serde_json::to_string_pretty(value).map_err(|e| SelectError::persist(path, e))?;

    let file_name = path
        .file_name()
        .ok_or_else(|| SelectError::persist(path, "path has no file name"))?;
    let tmp_path = dir.join(format!(".{}.tmp", file_name.to_string_lossy()));

    fs::write(&tmp_path, json).map_err(|e| SelectError::persist(&tmp_path, e))?;
    fs::rename(&tmp_path, path).map_err(|e| SelectError::persist(path, e))?;
    Ok(())
}
