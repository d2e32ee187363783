//! Export assembler boundary
//!
//! Walks the completed selection records, resolves each selected image
//! through the catalog, and copies it into the destination tree under a
//! rank-and-tag encoded name (`ref_<n>_<color>.<ext>`), alongside a copy of
//! the record itself for audit. Bundle packaging (zip and friends) happens
//! downstream of this directory.

use crate::catalog::{CatalogIndex, ImageRef};
use crate::error::{Result, SelectError};
use crate::store::{RecordStore, SelectionRecord, RECORD_FILENAME};
use std::fs;
use std::path::Path;

/// Counts reported after an export run
#[derive(Debug, Default, Clone, Copy)]
pub struct ExportSummary {
    /// Completed products exported
    pub products: usize,
    /// Image files copied
    pub images: usize,
}

/// Rank-and-tag encoded file name for a selected image
pub fn export_file_name(rank: usize, color: &str, extension: &str) -> String {
    if extension.is_empty() {
        format!("ref_{}_{}", rank, color)
    } else {
        format!("ref_{}_{}.{}", rank, color, extension.to_lowercase())
    }
}

/// Assemble all completed selections under `dest`.
///
/// A selected image missing from the catalog means the record is stale;
/// that is surfaced as `NotFound` rather than skipped, so the export never
/// silently produces an incomplete bundle.
pub fn assemble(catalog: &CatalogIndex, store: &RecordStore, dest: &Path) -> Result<ExportSummary> {
    let mut summary = ExportSummary::default();

    for record in store.list_records()? {
        if !record.completed {
            continue;
        }
        summary.images += export_record(catalog, store, &record, dest)?;
        summary.products += 1;
    }

    tracing::info!(
        products = summary.products,
        images = summary.images,
        dest = %dest.display(),
        "export assembled"
    );

    Ok(summary)
}

fn export_record(
    catalog: &CatalogIndex,
    store: &RecordStore,
    record: &SelectionRecord,
    dest: &Path,
) -> Result<usize> {
    let product_dest = dest.join(&record.product_id);
    fs::create_dir_all(&product_dest).map_err(|e| SelectError::persist(&product_dest, e))?;

    let mut copied = 0;
    for (rank, selection) in record.selected_images.iter().enumerate() {
        let image = ImageRef {
            product_id: record.product_id.clone(),
            file_name: selection.original_file.clone(),
        };
        let source = catalog.image_path(&image)?;

        let file_name = selection
            .saved_file
            .clone()
            .unwrap_or_else(|| export_file_name(rank + 1, &selection.color, image.extension()));
        let target = product_dest.join(file_name);

        fs::copy(&source, &target).map_err(|e| SelectError::persist(&target, e))?;
        copied += 1;
    }

    // Record copy for auditability
    let record_src = store.record_path(&record.product_id);
    let record_dest = product_dest.join(RECORD_FILENAME);
    fs::copy(&record_src, &record_dest).map_err(|e| SelectError::persist(&record_dest, e))?;

    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SelectedImage;
    use tempfile::TempDir;

    fn fixture(temp_dir: &TempDir) -> (CatalogIndex, RecordStore) {
        for (name, files) in [("A", vec!["front.jpg", "side.PNG"]), ("B", vec!["b.webp"])] {
            let dir = temp_dir.path().join("source").join(name);
            fs::create_dir_all(&dir).unwrap();
            for f in files {
                fs::write(dir.join(f), format!("{}-{}", name, f)).unwrap();
            }
        }
        let catalog = CatalogIndex::scan(temp_dir.path().join("source")).unwrap();
        let store = RecordStore::new(temp_dir.path().join("selected"));
        (catalog, store)
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(export_file_name(1, "black", "jpg"), "ref_1_black.jpg");
        assert_eq!(export_file_name(2, "unknown", "PNG"), "ref_2_unknown.png");
        assert_eq!(export_file_name(3, "red", ""), "ref_3_red");
    }

    #[test]
    fn test_assemble_completed_records() {
        let temp_dir = TempDir::new().unwrap();
        let (catalog, store) = fixture(&temp_dir);

        let mut a = SelectionRecord::new("A", "alice");
        a.selected_images
            .push(SelectedImage::new("front.jpg", Some("black".to_string())));
        a.selected_images.push(SelectedImage::new("side.PNG", None));
        a.completed = true;
        store.save(&mut a).unwrap();

        // Incomplete record must not be exported
        let mut b = SelectionRecord::new("B", "bob");
        b.selected_images.push(SelectedImage::new("b.webp", None));
        store.save(&mut b).unwrap();

        let dest = temp_dir.path().join("bundle");
        let summary = assemble(&catalog, &store, &dest).unwrap();
        assert_eq!(summary.products, 1);
        assert_eq!(summary.images, 2);

        assert_eq!(
            fs::read_to_string(dest.join("A").join("ref_1_black.jpg")).unwrap(),
            "A-front.jpg"
        );
        assert!(dest.join("A").join("ref_2_unknown.png").is_file());
        assert!(dest.join("A").join(RECORD_FILENAME).is_file());
        assert!(!dest.join("B").exists());
    }

    #[test]
    fn test_assemble_stale_record_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let (catalog, store) = fixture(&temp_dir);

        let mut a = SelectionRecord::new("A", "alice");
        a.selected_images
            .push(SelectedImage::new("vanished.jpg", None));
        a.completed = true;
        store.save(&mut a).unwrap();

        let dest = temp_dir.path().join("bundle");
        let err = assemble(&catalog, &store, &dest).unwrap_err();
        assert!(matches!(err, SelectError::NotFound(_)));
    }

    #[test]
    fn test_assemble_respects_recorded_saved_file() {
        let temp_dir = TempDir::new().unwrap();
        let (catalog, store) = fixture(&temp_dir);

        let mut a = SelectionRecord::new("A", "alice");
        let mut img = SelectedImage::new("front.jpg", Some("navy".to_string()));
        img.saved_file = Some("ref_1_navy.jpg".to_string());
        a.selected_images.push(img);
        a.completed = true;
        store.save(&mut a).unwrap();

        let dest = temp_dir.path().join("bundle");
        assemble(&catalog, &store, &dest).unwrap();
        assert!(dest.join("A").join("ref_1_navy.jpg").is_file());
    }

    #[test]
    fn test_assemble_empty_store() {
        let temp_dir = TempDir::new().unwrap();
        let (catalog, store) = fixture(&temp_dir);

        let dest = temp_dir.path().join("bundle");
        let summary = assemble(&catalog, &store, &dest).unwrap();
        assert_eq!(summary.products, 0);
        assert_eq!(summary.images, 0);
    }
}
