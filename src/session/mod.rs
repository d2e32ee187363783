//! Per-annotator session state: identity and catalog cursor
//!
//! The cursor is advisory local-session state persisted per annotator under
//! the output tree so an interrupted session resumes where it left off.
//! Losing the cursor file degrades to "start from the first workable
//! product", never to a crash or an invalid index. Navigation only moves
//! the cursor; selection records are written exclusively by explicit
//! save/finalize actions.

use crate::catalog::CatalogIndex;
use crate::coordinate::Coordinator;
use crate::error::{Result, SelectError};
use crate::store;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory under the output tree holding per-annotator cursor files
pub const SESSION_DIR: &str = ".sessions";

/// Persisted cursor state, one file per annotator
#[derive(Debug, Serialize, Deserialize)]
struct CursorFile {
    annotator: String,
    cursor: usize,
    updated_at: DateTime<Utc>,
}

/// A running annotator session
#[derive(Debug)]
pub struct Session {
    annotator: String,
    cursor: usize,
    product_count: usize,
    cursor_path: PathBuf,
}

impl Session {
    /// Start (or resume) a session for an annotator.
    ///
    /// Cursor resolution order: the persisted cursor for this annotator if
    /// it is still within the catalog bounds, else the first workable
    /// product, else index 0.
    pub fn start(
        annotator: impl Into<String>,
        catalog: &CatalogIndex,
        coordinator: &Coordinator<'_>,
        output_root: &Path,
    ) -> Result<Self> {
        let annotator = annotator.into();
        let cursor_path = output_root
            .join(SESSION_DIR)
            .join(format!("{}.json", sanitize_annotator(&annotator)));
        let product_count = catalog.len();

        let persisted = read_cursor(&cursor_path);
        let cursor = match persisted {
            Some(saved) if saved < product_count => {
                tracing::debug!(annotator = %annotator, cursor = saved, "resuming session");
                saved
            }
            Some(saved) => {
                tracing::warn!(
                    annotator = %annotator,
                    cursor = saved,
                    products = product_count,
                    "persisted cursor out of range, starting over"
                );
                first_workable_index(coordinator)?
            }
            None => first_workable_index(coordinator)?,
        };

        Ok(Self {
            annotator,
            cursor,
            product_count,
            cursor_path,
        })
    }

    pub fn annotator(&self) -> &str {
        &self.annotator
    }

    /// Current product index
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Advance the cursor; saturates at the last product
    pub fn next(&mut self) -> usize {
        if self.cursor + 1 < self.product_count {
            self.cursor += 1;
            self.persist();
        }
        self.cursor
    }

    /// Move the cursor back; saturates at the first product
    pub fn previous(&mut self) -> usize {
        if self.cursor > 0 {
            self.cursor -= 1;
            self.persist();
        }
        self.cursor
    }

    /// Set the cursor to an absolute index.
    ///
    /// Errors with `OutOfRange` for `index >= product_count`; the cursor
    /// is left unchanged.
    pub fn jump_to(&mut self, index: usize) -> Result<usize> {
        if index >= self.product_count {
            return Err(SelectError::OutOfRange {
                index,
                count: self.product_count,
            });
        }
        self.cursor = index;
        self.persist();
        Ok(self.cursor)
    }

    /// Write the cursor file. Best effort: the cursor is advisory, so a
    /// failed write is logged and the session carries on in memory.
    fn persist(&self) {
        let file = CursorFile {
            annotator: self.annotator.clone(),
            cursor: self.cursor,
            updated_at: Utc::now(),
        };
        if let Err(e) = store::write_json_atomic(&self.cursor_path, &file) {
            tracing::warn!(
                annotator = %self.annotator,
                error = %e,
                "failed to persist session cursor"
            );
        }
    }
}

/// First workable product index, or 0 for an all-claimed catalog
fn first_workable_index(coordinator: &Coordinator<'_>) -> Result<usize> {
    Ok(coordinator.next_workable()?.map(|(i, _)| i).unwrap_or(0))
}

fn read_cursor(path: &Path) -> Option<usize> {
    let content = fs::read_to_string(path).ok()?;
    match serde_json::from_str::<CursorFile>(&content) {
        Ok(file) => Some(file.cursor),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "unreadable cursor file, ignoring");
            None
        }
    }
}

/// Annotator names are free text; keep the cursor file name tame
fn sanitize_annotator(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "anonymous".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{RecordStore, SelectionRecord};
    use tempfile::TempDir;

    fn fixture(temp_dir: &TempDir) -> (CatalogIndex, RecordStore) {
        for name in ["A", "B", "C"] {
            fs::create_dir_all(temp_dir.path().join("source").join(name)).unwrap();
        }
        let catalog = CatalogIndex::scan(temp_dir.path().join("source")).unwrap();
        let store = RecordStore::new(temp_dir.path().join("selected"));
        (catalog, store)
    }

    #[test]
    fn test_fresh_session_starts_at_first_workable() {
        let temp_dir = TempDir::new().unwrap();
        let (catalog, store) = fixture(&temp_dir);

        let mut done = SelectionRecord::new("A", "x");
        done.completed = true;
        store.save(&mut done).unwrap();

        let coord = Coordinator::new(&catalog, &store);
        let session = Session::start("alice", &catalog, &coord, store.output_root()).unwrap();
        assert_eq!(session.cursor(), 1); // A is completed, B is first workable
    }

    #[test]
    fn test_navigation_saturates_at_bounds() {
        let temp_dir = TempDir::new().unwrap();
        let (catalog, store) = fixture(&temp_dir);
        let coord = Coordinator::new(&catalog, &store);

        let mut session = Session::start("alice", &catalog, &coord, store.output_root()).unwrap();
        assert_eq!(session.cursor(), 0);

        // previous at the first product is a no-op
        assert_eq!(session.previous(), 0);

        assert_eq!(session.next(), 1);
        assert_eq!(session.next(), 2);
        // next at the last product is a no-op
        assert_eq!(session.next(), 2);
    }

    #[test]
    fn test_jump_to_bounds() {
        let temp_dir = TempDir::new().unwrap();
        let (catalog, store) = fixture(&temp_dir);
        let coord = Coordinator::new(&catalog, &store);

        let mut session = Session::start("alice", &catalog, &coord, store.output_root()).unwrap();

        assert_eq!(session.jump_to(2).unwrap(), 2);

        let err = session.jump_to(3).unwrap_err();
        assert!(matches!(err, SelectError::OutOfRange { index: 3, count: 3 }));
        // cursor unchanged after the failed jump
        assert_eq!(session.cursor(), 2);
    }

    #[test]
    fn test_resume_same_annotator() {
        let temp_dir = TempDir::new().unwrap();
        let (catalog, store) = fixture(&temp_dir);
        let coord = Coordinator::new(&catalog, &store);

        {
            let mut session =
                Session::start("alice", &catalog, &coord, store.output_root()).unwrap();
            session.next();
            session.next();
            assert_eq!(session.cursor(), 2);
        }

        // Second session for the same annotator picks up the last cursor
        let session = Session::start("alice", &catalog, &coord, store.output_root()).unwrap();
        assert_eq!(session.cursor(), 2);

        // A different annotator starts from the first workable product
        let other = Session::start("bob", &catalog, &coord, store.output_root()).unwrap();
        assert_eq!(other.cursor(), 0);
    }

    #[test]
    fn test_out_of_range_persisted_cursor_falls_back() {
        let temp_dir = TempDir::new().unwrap();
        let (catalog, store) = fixture(&temp_dir);
        let coord = Coordinator::new(&catalog, &store);

        // Cursor file from a run against a larger catalog
        let path = store
            .output_root()
            .join(SESSION_DIR)
            .join("alice.json");
        let file = CursorFile {
            annotator: "alice".to_string(),
            cursor: 99,
            updated_at: Utc::now(),
        };
        store::write_json_atomic(&path, &file).unwrap();

        let session = Session::start("alice", &catalog, &coord, store.output_root()).unwrap();
        assert_eq!(session.cursor(), 0);
    }

    #[test]
    fn test_corrupt_cursor_file_falls_back() {
        let temp_dir = TempDir::new().unwrap();
        let (catalog, store) = fixture(&temp_dir);
        let coord = Coordinator::new(&catalog, &store);

        let dir = store.output_root().join(SESSION_DIR);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("alice.json"), "not json").unwrap();

        let session = Session::start("alice", &catalog, &coord, store.output_root()).unwrap();
        assert_eq!(session.cursor(), 0);
    }

    #[test]
    fn test_sanitize_annotator() {
        assert_eq!(sanitize_annotator("alice"), "alice");
        assert_eq!(sanitize_annotator("Alice Smith"), "Alice_Smith");
        assert_eq!(sanitize_annotator("../../etc"), "______etc");
        assert_eq!(sanitize_annotator("  "), "anonymous");
    }
}
